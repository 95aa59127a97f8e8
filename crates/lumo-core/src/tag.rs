//! Tag extraction boundary.
//!
//! Natural-language tag extraction is an external capability; the
//! dispatcher only depends on this trait.

use std::sync::Arc;

/// Derive an ordered, capped list of tags from caption text.
///
/// Implementations must be pure: no side effects, same output for the
/// same input.
pub trait TagExtractor: Send + Sync {
    fn tags(&self, text: &str) -> Vec<String>;
}

/// Shared handle to a tag extractor.
pub type TaggerHandle = Arc<dyn TagExtractor>;

/// Extractor that yields no tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTagger;

impl TagExtractor for NoopTagger {
    #[inline(always)]
    fn tags(&self, _: &str) -> Vec<String> {
        Vec::new()
    }
}
