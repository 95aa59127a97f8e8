use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, Query, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use lumo_model::{CaptionBatch, CaptionContext, ImageUpload, ModelKey};

use crate::{error::ApiError, handler::ApiHandler};

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
    admin_key: Option<String>,
    debug: bool,
}

/// Shared router state: the handler plus the admin guard settings.
struct ApiState<H> {
    handler: Arc<H>,
    admin_key: Option<String>,
    debug: bool,
}

impl<H> HttpApi<H>
where
    H: ApiHandler,
{
    /// Create new HTTP API with the given handler.
    ///
    /// Admin routes are locked until an API key is configured via
    /// [`HttpApi::with_admin_key`] or the debug override is enabled.
    pub fn new(handler: Arc<H>) -> Self {
        Self {
            handler,
            admin_key: None,
            debug: false,
        }
    }

    /// Expected `X-API-Key` value for admin routes.
    pub fn with_admin_key(mut self, key: impl Into<String>) -> Self {
        self.admin_key = Some(key.into());
        self
    }

    /// Disable the admin API-key guard (development mode only).
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes:
    /// - POST /api/caption-images - Caption each uploaded image
    /// - POST /api/caption-collective-images - One caption for the set
    /// - POST /api/admin/reset-cache - Clear the response cache (X-API-Key)
    /// - GET /healthz - Liveness probe
    pub fn router(self) -> Router {
        let state = Arc::new(ApiState {
            handler: self.handler,
            admin_key: self.admin_key,
            debug: self.debug,
        });
        Router::new()
            .route("/api/caption-images", post(caption_images::<H>))
            .route(
                "/api/caption-collective-images",
                post(caption_collective_images::<H>),
            )
            .route("/api/admin/reset-cache", post(reset_cache::<H>))
            .route("/healthz", get(healthz))
            .with_state(state)
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct CaptionQuery {
    /// Model selection per request; defaults to the lightest backend.
    #[serde(default = "default_model")]
    model: String,
    /// Optional per-request caption instruction.
    caption_prompt: Option<String>,
    /// Optional per-request flag instruction.
    flag_caption_prompt: Option<String>,
}

fn default_model() -> String {
    "blip".to_string()
}

impl CaptionQuery {
    fn into_context(self) -> Result<CaptionContext, ApiError> {
        let model: ModelKey = self.model.parse()?;
        let mut ctx = CaptionContext::new(model);
        if let Some(p) = self.caption_prompt {
            ctx = ctx.with_caption_prompt(p);
        }
        if let Some(p) = self.flag_caption_prompt {
            ctx = ctx.with_flag_prompt(p);
        }
        Ok(ctx)
    }
}

#[derive(Debug, Serialize)]
struct ResetCacheResponse {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/caption-images
async fn caption_images<H>(
    State(state): State<Arc<ApiState<H>>>,
    Query(query): Query<CaptionQuery>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let ctx = query.into_context()?;
    let uploads = read_uploads(multipart).await?;

    let results = state.handler.caption_images(&ctx, uploads).await?;
    Ok(Json(CaptionBatch { results }))
}

/// POST /api/caption-collective-images
async fn caption_collective_images<H>(
    State(state): State<Arc<ApiState<H>>>,
    Query(query): Query<CaptionQuery>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let ctx = query.into_context()?;
    let uploads = read_uploads(multipart).await?;

    let response = state.handler.caption_collective(&ctx, uploads).await?;
    Ok(Json(response))
}

/// POST /api/admin/reset-cache
///
/// Destructive: flushes every cached response. Guarded by `X-API-Key`
/// unless the debug override is active.
async fn reset_cache<H>(
    State(state): State<Arc<ApiState<H>>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    require_api_key(&state, &headers)?;
    state.handler.reset_cache().await?;
    Ok(Json(ResetCacheResponse {
        message: "cache cleared",
    }))
}

/// GET /healthz
async fn healthz() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

// ============================================================================
// Helpers
// ============================================================================

/// Drain the multipart body into raw uploads.
///
/// Each file part becomes one [`ImageUpload`]; parts without a filename
/// are skipped. Content validation happens in the core, before any
/// runtime or cache work.
async fn read_uploads(mut multipart: Multipart) -> Result<Vec<ImageUpload>, ApiError> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("malformed multipart body: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("unreadable upload {filename}: {e}")))?;
        uploads.push(ImageUpload::new(filename, content_type, bytes));
    }
    if uploads.is_empty() {
        return Err(ApiError::InvalidRequest("no images provided".into()));
    }
    Ok(uploads)
}

/// Admin guard: compare `X-API-Key` against the configured key.
fn require_api_key<H>(state: &ApiState<H>, headers: &HeaderMap) -> Result<(), ApiError> {
    if state.debug {
        warn!("admin API-key guard is disabled in debug mode");
        return Ok(());
    }
    let Some(expected) = state.admin_key.as_deref() else {
        return Err(ApiError::Unauthorized);
    };
    let provided = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    if provided != Some(expected) {
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}
