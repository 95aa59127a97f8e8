//! Well-known service-level constants.
//!
//! Keeping them here avoids scattering magic strings throughout the codebase.

/// Sentinel caption substituted when a runtime yields empty text.
///
/// Results never carry a null or empty caption; a degraded generation is
/// reported as this fixed string with an empty tag list.
pub const FALLBACK_CAPTION: &str = "No caption could be generated.";

/// Version prefix for response-cache keys.
///
/// Bumping this namespaces new entries away from old ones when the cached
/// value format changes.
pub const CACHE_KEY_VERSION: &str = "v1";

/// Generation cap for structured flag extraction.
pub const MAX_FLAG_TOKENS: u32 = 80;

/// Generation cap for collective captioning and collective flagging.
pub const MAX_COLLECTIVE_TOKENS: u32 = 200;

/// Upper bound on tags attached to a single result.
pub const MAX_TAGS: usize = 50;
