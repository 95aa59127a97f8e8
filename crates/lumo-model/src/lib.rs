mod domain;
pub use domain::{ALLOWED_CONTENT_TYPES, CACHE_KEY_VERSION, FALLBACK_CAPTION};
pub use domain::{CaptionContext, ImageUpload, ModelKey};
pub use domain::{MAX_COLLECTIVE_TOKENS, MAX_FLAG_TOKENS, MAX_TAGS};

mod error;
pub use error::{ModelError, ModelResult};

mod api;
pub use api::{CaptionBatch, CaptionItem, CollectiveCaption};
