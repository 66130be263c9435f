pub mod list;
pub mod viewer;

pub use list::*;
pub use viewer::*;
