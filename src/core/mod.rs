pub mod aggregator;
pub mod config;
pub mod discovery;
pub mod filter;
pub mod item;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod session;
pub mod transcript;
pub mod verdict;

pub use aggregator::*;
pub use config::*;
pub use discovery::*;
pub use filter::*;
pub use item::*;
pub use model::*;
pub use pipeline::*;
pub use report::*;
pub use session::*;
pub use transcript::*;
pub use verdict::*;
