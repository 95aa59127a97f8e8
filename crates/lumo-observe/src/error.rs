use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    /// The requested output format is not one of `text` or `json`.
    #[error("unknown log format {0:?}, expected text or json")]
    InvalidFormat(String),

    /// The level expression did not parse as an `EnvFilter` directive.
    #[error("bad log level expression: {0}")]
    InvalidLevel(String),

    /// A global subscriber was already installed for this process.
    #[error("logger already initialized")]
    AlreadyInitialized,
}

pub type LoggerResult<T> = Result<T, LoggerError>;
