mod key;
pub use key::ModelKey;

mod image;
pub use image::{ALLOWED_CONTENT_TYPES, ImageUpload};

mod context;
pub use context::CaptionContext;

mod constants;
pub use constants::{CACHE_KEY_VERSION, FALLBACK_CAPTION};
pub use constants::{MAX_COLLECTIVE_TOKENS, MAX_FLAG_TOKENS, MAX_TAGS};
