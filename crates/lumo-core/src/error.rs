use thiserror::Error;

use lumo_model::{ModelError, ModelKey};

use crate::cache::StoreError;
use crate::runtime::RuntimeError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("{operation} is not supported by model: {model}")]
    CapabilityUnsupported {
        model: ModelKey,
        operation: &'static str,
    },

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("cache store error: {0}")]
    Store(#[from] StoreError),
}
