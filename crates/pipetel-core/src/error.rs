use thiserror::Error;

/// Canonical result for pipetel.
pub type Result<T> = std::result::Result<T, Error>;

/// Recoverable errors.
///
/// Contract violations by the calling engine (wrong pipeline id, nested
/// pipelines, too many features) are not represented here; they panic.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Tracepoint '{0}' already has a consumer attached")]
    ProbeBusy(&'static str),

    #[error("Unknown tracepoint: {0}")]
    UnknownProbe(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}
