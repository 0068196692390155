use thiserror::Error;

#[derive(Debug, Error)]
pub enum WaylineError {
    #[error("Execution guarantee denied: {0}")]
    ExecutionGuaranteeDenied(String),

    #[error("Notification presenter error: {0}")]
    Presenter(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Navigation service is no longer running")]
    ServiceGone,

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for WaylineError {
    fn from(e: anyhow::Error) -> Self {
        WaylineError::Other(e.to_string())
    }
}

pub type WaylineResult<T> = Result<T, WaylineError>;
