use async_trait::async_trait;

use lumo_model::{CaptionContext, CaptionItem, CollectiveCaption, ImageUpload};

use crate::error::ApiError;

/// Captioning API handler.
///
/// This trait abstracts the backend implementation, allowing users to:
/// - Use the provided [`crate::DispatcherAdapter`]
/// - Implement custom handlers with additional logic (auth, rate limiting, etc.)
#[async_trait]
pub trait ApiHandler: Send + Sync + 'static {
    /// Caption each uploaded image independently.
    async fn caption_images(
        &self,
        ctx: &CaptionContext,
        uploads: Vec<ImageUpload>,
    ) -> Result<Vec<CaptionItem>, ApiError>;

    /// Produce one caption for the whole upload set.
    async fn caption_collective(
        &self,
        ctx: &CaptionContext,
        uploads: Vec<ImageUpload>,
    ) -> Result<CollectiveCaption, ApiError>;

    /// Clear the entire response cache.
    async fn reset_cache(&self) -> Result<(), ApiError>;
}
