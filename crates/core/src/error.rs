use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildPulseError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid target url '{url}': {reason}")]
    InvalidTargetUrl { url: String, reason: String },

    #[error("report integration unavailable: {0}")]
    GeneratorUnavailable(String),

    #[error("failed to parse {generator} report: {reason}")]
    ReportParse { generator: String, reason: String },

    #[error("invalid point: {0}")]
    InvalidPoint(String),

    #[error("publish to target '{target}' failed: {reason}")]
    Publish { target: String, reason: String },

    #[error("io error: {0}")]
    Io(String),
}

impl BuildPulseError {
    pub fn report_parse(generator: &str, reason: impl Into<String>) -> Self {
        Self::ReportParse {
            generator: generator.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildPulseError>;
