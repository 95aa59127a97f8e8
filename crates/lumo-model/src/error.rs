use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown model key: {0}")]
    UnknownModelKey(String),

    #[error("empty upload: {0}")]
    EmptyUpload(String),

    #[error("unsupported content type for {filename}: {content_type}")]
    UnsupportedContentType {
        filename: String,
        content_type: String,
    },
}

pub type ModelResult<T> = Result<T, ModelError>;
