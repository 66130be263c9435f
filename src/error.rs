use derive_more::{Display, From};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, From)]
pub enum Error {
    #[display("{_0}")]
    #[from(String, &String, &str)]
    Custom(String),

    #[display("configuration error: {_0}")]
    Config(String),

    #[display("discovery failed: {_0}")]
    Discovery(String),

    #[display("transcript unavailable: {_0}")]
    Transcript(String),

    #[display("model request failed: {_0}")]
    Model(String),

    // -- Externals
    #[display("io error: {_0}")]
    #[from]
    Io(std::io::Error),

    #[display("http error: {_0}")]
    #[from]
    Http(reqwest::Error),

    #[display("json error: {_0}")]
    #[from]
    Json(serde_json::Error),

    #[display("openai error: {_0}")]
    #[from]
    OpenAi(async_openai::error::OpenAIError),
}

impl Error {
    pub fn custom(val: impl std::fmt::Display) -> Self {
        Self::Custom(val.to_string())
    }

    pub fn config(val: impl std::fmt::Display) -> Self {
        Self::Config(val.to_string())
    }

    pub fn discovery(val: impl std::fmt::Display) -> Self {
        Self::Discovery(val.to_string())
    }

    pub fn transcript(val: impl std::fmt::Display) -> Self {
        Self::Transcript(val.to_string())
    }

    pub fn model(val: impl std::fmt::Display) -> Self {
        Self::Model(val.to_string())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn custom_from_str() {
        let err: Error = "boom".into();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn variants_carry_a_readable_prefix() {
        assert_eq!(
            Error::discovery("no data blob").to_string(),
            "discovery failed: no data blob"
        );
        assert_eq!(
            Error::config("topic is empty").to_string(),
            "configuration error: topic is empty"
        );
    }
}
