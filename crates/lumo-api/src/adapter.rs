use std::sync::Arc;

use async_trait::async_trait;

use lumo_core::Dispatcher;
use lumo_model::{CaptionContext, CaptionItem, CollectiveCaption, ImageUpload};

use crate::error::ApiError;
use crate::handler::ApiHandler;

/// Adapter that bridges the core [`Dispatcher`] to [`ApiHandler`].
///
/// This is a ready-to-use implementation that directly delegates to the
/// dispatcher and maps core errors onto API status codes.
pub struct DispatcherAdapter {
    dispatcher: Arc<Dispatcher>,
}

impl DispatcherAdapter {
    /// Create a new adapter wrapping the given dispatcher.
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl ApiHandler for DispatcherAdapter {
    async fn caption_images(
        &self,
        ctx: &CaptionContext,
        uploads: Vec<ImageUpload>,
    ) -> Result<Vec<CaptionItem>, ApiError> {
        self.dispatcher
            .caption_images(ctx, &uploads)
            .await
            .map_err(ApiError::from)
    }

    async fn caption_collective(
        &self,
        ctx: &CaptionContext,
        uploads: Vec<ImageUpload>,
    ) -> Result<CollectiveCaption, ApiError> {
        self.dispatcher
            .caption_collective(ctx, &uploads)
            .await
            .map_err(ApiError::from)
    }

    async fn reset_cache(&self) -> Result<(), ApiError> {
        self.dispatcher
            .reset_cache()
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))
    }
}
