use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to load model {model}: {reason}")]
    Load { model: String, reason: String },

    #[error("inference failed for model {model}: {reason}")]
    Inference { model: String, reason: String },

    #[error("runtime for model {model} does not implement {operation}")]
    Unsupported {
        model: String,
        operation: &'static str,
    },
}

impl RuntimeError {
    /// Shorthand for a load failure.
    pub fn load(model: impl Into<String>, reason: impl Into<String>) -> Self {
        RuntimeError::Load {
            model: model.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for an inference failure.
    pub fn inference(model: impl Into<String>, reason: impl Into<String>) -> Self {
        RuntimeError::Inference {
            model: model.into(),
            reason: reason.into(),
        }
    }
}
