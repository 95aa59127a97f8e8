//! Request orchestration: cache lookup, runtime invocation, post-processing.
//!
//! The dispatcher owns no lock of its own. It consults the cache, runs
//! inference unsynchronized with other requests, and writes the cache once;
//! a duplicate concurrent miss costs a redundant recomputation and an
//! idempotent overwrite, which is acceptable.
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use lumo_model::{
    CaptionContext, CaptionItem, CollectiveCaption, FALLBACK_CAPTION, ImageUpload,
    MAX_COLLECTIVE_TOKENS, MAX_FLAG_TOKENS,
};

use crate::cache::{ResponseCache, StoreError};
use crate::error::CoreError;
use crate::flag::extract_flag;
use crate::metrics::{MetricsHandle, noop_metrics};
use crate::registry::ModelRegistry;
use crate::runtime::RuntimeHandle;
use crate::tag::TaggerHandle;

/// Cached payload for one image; filename and cache provenance are
/// request-specific and never stored.
#[derive(Debug, Serialize, Deserialize)]
struct CachedItem {
    caption: String,
    tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    flagged: Option<bool>,
}

/// Cached payload for a collective result.
#[derive(Debug, Serialize, Deserialize)]
struct CachedCollective {
    collective_caption: String,
    count: usize,
    tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    flagged: Option<bool>,
}

/// Orchestrates caption requests across registry, cache, runtime and
/// tagger.
pub struct Dispatcher {
    registry: Arc<ModelRegistry>,
    cache: ResponseCache,
    tagger: TaggerHandle,
    metrics: MetricsHandle,
}

impl Dispatcher {
    pub fn new(registry: Arc<ModelRegistry>, cache: ResponseCache, tagger: TaggerHandle) -> Self {
        Self {
            registry,
            cache,
            tagger,
            metrics: noop_metrics(),
        }
    }

    /// Attach a metrics backend for inference timing.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Caption each uploaded image independently.
    ///
    /// Per image: content hash, cache lookup, and on a miss a single-image
    /// caption call plus (capability permitting) a flag call. Results are
    /// written back to the cache best-effort.
    #[instrument(level = "debug", skip(self, uploads), fields(model = %ctx.model, count = uploads.len()))]
    pub async fn caption_images(
        &self,
        ctx: &CaptionContext,
        uploads: &[ImageUpload],
    ) -> Result<Vec<CaptionItem>, CoreError> {
        for upload in uploads {
            upload.validate()?;
        }

        let handle = self.registry.acquire(ctx.model).await?;

        let mut results = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let sha = ResponseCache::hash_bytes(&upload.bytes);
            let key = self.cache.image_key(&sha);

            if let Some(cached) = self.cache.get_json::<CachedItem>(&key).await {
                debug!(filename = %upload.filename, "serving caption from cache");
                results.push(CaptionItem {
                    filename: upload.filename.clone(),
                    caption: cached.caption,
                    tags: cached.tags,
                    flagged: cached.flagged,
                    cache: true,
                });
                continue;
            }

            let item = self.caption_one(ctx, &handle, upload).await?;
            self.cache.set_json(&key, &item).await;
            results.push(CaptionItem {
                filename: upload.filename.clone(),
                caption: item.caption,
                tags: item.tags,
                flagged: item.flagged,
                cache: false,
            });
        }
        Ok(results)
    }

    /// Produce one caption for the whole upload set.
    ///
    /// Rejected before any upload is examined when the selected backend
    /// lacks collective support. The cache key derives from the ordered
    /// per-item hashes, so item order is part of the identity.
    #[instrument(level = "debug", skip(self, uploads), fields(model = %ctx.model, count = uploads.len()))]
    pub async fn caption_collective(
        &self,
        ctx: &CaptionContext,
        uploads: &[ImageUpload],
    ) -> Result<CollectiveCaption, CoreError> {
        if !ctx.model.supports_collective() {
            return Err(CoreError::CapabilityUnsupported {
                model: ctx.model,
                operation: "collective captioning",
            });
        }

        for upload in uploads {
            upload.validate()?;
        }

        let hashes: Vec<String> = uploads
            .iter()
            .map(|u| ResponseCache::hash_bytes(&u.bytes))
            .collect();
        let key = self.cache.collection_key(&ResponseCache::combined_hash(&hashes));

        if let Some(cached) = self.cache.get_json::<CachedCollective>(&key).await {
            debug!("serving collective caption from cache");
            return Ok(CollectiveCaption {
                collective_caption: cached.collective_caption,
                count: cached.count,
                tags: cached.tags,
                flagged: cached.flagged,
                cache: true,
            });
        }

        let handle = self.registry.acquire(ctx.model).await?;

        let started = Instant::now();
        let caption = handle
            .runtime()
            .caption_collective(uploads, Some(ctx.caption_prompt()), MAX_COLLECTIVE_TOKENS)
            .await?;
        self.metrics.record_inference(
            ctx.model.as_str(),
            "collective",
            started.elapsed().as_millis() as u64,
        );

        let flagged = self
            .flag_images(ctx, &handle, uploads, MAX_COLLECTIVE_TOKENS)
            .await?;

        let (caption, tags) = self.finish_caption(caption);
        let stored = CachedCollective {
            collective_caption: caption,
            count: uploads.len(),
            tags,
            flagged,
        };
        self.cache.set_json(&key, &stored).await;

        Ok(CollectiveCaption {
            collective_caption: stored.collective_caption,
            count: stored.count,
            tags: stored.tags,
            flagged: stored.flagged,
            cache: false,
        })
    }

    /// Drop every cached response. Failures propagate; an operator reset
    /// must report when it did not happen.
    pub async fn reset_cache(&self) -> Result<(), StoreError> {
        self.cache.clear().await
    }

    /// Uncached single-image path: caption, optional flag, tagging.
    async fn caption_one(
        &self,
        ctx: &CaptionContext,
        handle: &Arc<RuntimeHandle>,
        upload: &ImageUpload,
    ) -> Result<CachedItem, CoreError> {
        let started = Instant::now();
        let caption = handle
            .runtime()
            .caption(upload, Some(ctx.caption_prompt()))
            .await?;
        self.metrics.record_inference(
            ctx.model.as_str(),
            "caption",
            started.elapsed().as_millis() as u64,
        );

        let flagged = self
            .flag_images(ctx, handle, std::slice::from_ref(upload), MAX_FLAG_TOKENS)
            .await?;

        let (caption, tags) = self.finish_caption(caption);
        Ok(CachedItem {
            caption,
            tags,
            flagged,
        })
    }

    /// Run the flag operation when the backend supports it.
    async fn flag_images(
        &self,
        ctx: &CaptionContext,
        handle: &Arc<RuntimeHandle>,
        images: &[ImageUpload],
        max_new_tokens: u32,
    ) -> Result<Option<bool>, CoreError> {
        if !handle.capabilities().flagging {
            return Ok(None);
        }
        let started = Instant::now();
        let text = handle
            .runtime()
            .flag_text(images, ctx.flag_prompt(), max_new_tokens)
            .await?;
        self.metrics.record_inference(
            ctx.model.as_str(),
            "flag",
            started.elapsed().as_millis() as u64,
        );
        Ok(Some(extract_flag(&text)))
    }

    /// Apply the empty-caption fallback and tag extraction rules.
    ///
    /// An empty generation yields the fallback sentinel with no tags; any
    /// other caption is tagged by the extractor.
    fn finish_caption(&self, caption: String) -> (String, Vec<String>) {
        let caption = caption.trim().to_string();
        if caption.is_empty() {
            (FALLBACK_CAPTION.to_string(), Vec::new())
        } else {
            let tags = self.tagger.tags(&caption);
            (caption, tags)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;

    use crate::cache::{CacheStore, MemoryStore};
    use crate::runtime::{ModelRuntime, RuntimeError, RuntimeFactory};
    use crate::tag::TagExtractor;
    use lumo_model::ModelKey;

    /// Scripted runtime: fixed caption and flag text, call counting.
    struct ScriptedRuntime {
        caption: String,
        flag_text: String,
        caption_calls: Arc<AtomicUsize>,
        flag_calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ModelRuntime for ScriptedRuntime {
        async fn caption(
            &self,
            _: &ImageUpload,
            _: Option<&str>,
        ) -> Result<String, RuntimeError> {
            self.caption_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.caption.clone())
        }

        async fn caption_collective(
            &self,
            _: &[ImageUpload],
            _: Option<&str>,
            _: u32,
        ) -> Result<String, RuntimeError> {
            self.caption_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.caption.clone())
        }

        async fn flag_text(
            &self,
            _: &[ImageUpload],
            _: Option<&str>,
            _: u32,
        ) -> Result<String, RuntimeError> {
            self.flag_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.flag_text.clone())
        }

        fn release(&self) {}
    }

    struct ScriptedFactory {
        caption: String,
        flag_text: String,
        loads: Arc<AtomicUsize>,
        caption_calls: Arc<AtomicUsize>,
        flag_calls: Arc<AtomicUsize>,
    }

    impl ScriptedFactory {
        fn new(caption: &str, flag_text: &str) -> Self {
            Self {
                caption: caption.into(),
                flag_text: flag_text.into(),
                loads: Arc::new(AtomicUsize::new(0)),
                caption_calls: Arc::new(AtomicUsize::new(0)),
                flag_calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl RuntimeFactory for ScriptedFactory {
        async fn load(&self, key: ModelKey) -> Result<RuntimeHandle, RuntimeError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(RuntimeHandle::new(
                key,
                "cpu",
                Arc::new(ScriptedRuntime {
                    caption: self.caption.clone(),
                    flag_text: self.flag_text.clone(),
                    caption_calls: Arc::clone(&self.caption_calls),
                    flag_calls: Arc::clone(&self.flag_calls),
                }),
            ))
        }
    }

    /// Runtime that records the token cap handed to every flag call.
    struct CapRecordingRuntime {
        flag_caps: Arc<std::sync::Mutex<Vec<u32>>>,
    }

    #[async_trait]
    impl ModelRuntime for CapRecordingRuntime {
        async fn caption(
            &self,
            _: &ImageUpload,
            _: Option<&str>,
        ) -> Result<String, RuntimeError> {
            Ok("a caption".into())
        }

        async fn caption_collective(
            &self,
            _: &[ImageUpload],
            _: Option<&str>,
            _: u32,
        ) -> Result<String, RuntimeError> {
            Ok("a collective caption".into())
        }

        async fn flag_text(
            &self,
            _: &[ImageUpload],
            _: Option<&str>,
            max_new_tokens: u32,
        ) -> Result<String, RuntimeError> {
            self.flag_caps.lock().unwrap().push(max_new_tokens);
            Ok("{\"flag\": false}".into())
        }

        fn release(&self) {}
    }

    struct CapRecordingFactory {
        flag_caps: Arc<std::sync::Mutex<Vec<u32>>>,
    }

    #[async_trait]
    impl RuntimeFactory for CapRecordingFactory {
        async fn load(&self, key: ModelKey) -> Result<RuntimeHandle, RuntimeError> {
            Ok(RuntimeHandle::new(
                key,
                "cpu",
                Arc::new(CapRecordingRuntime {
                    flag_caps: Arc::clone(&self.flag_caps),
                }),
            ))
        }
    }

    /// Tagger that splits on whitespace.
    struct SplitTagger;

    impl TagExtractor for SplitTagger {
        fn tags(&self, text: &str) -> Vec<String> {
            text.split_whitespace().map(str::to_string).collect()
        }
    }

    /// Store that fails every call.
    struct DownStore;

    #[async_trait]
    impl CacheStore for DownStore {
        async fn get(&self, _: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }

        async fn set(&self, _: &str, _: String, _: Duration) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }

        async fn clear(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
    }

    fn upload(name: &str, body: &'static [u8]) -> ImageUpload {
        ImageUpload::new(name, "image/png", Bytes::from_static(body))
    }

    fn dispatcher(factory: Arc<ScriptedFactory>, store: Arc<dyn CacheStore>) -> Dispatcher {
        let registry = Arc::new(ModelRegistry::new(factory, 1));
        let cache = ResponseCache::new(store, Duration::from_secs(60));
        Dispatcher::new(registry, cache, Arc::new(SplitTagger))
    }

    #[tokio::test]
    async fn fresh_caption_is_tagged_and_not_cache_sourced() {
        let factory = Arc::new(ScriptedFactory::new("a dog on grass", ""));
        let d = dispatcher(Arc::clone(&factory), Arc::new(MemoryStore::new()));
        let ctx = CaptionContext::new(ModelKey::Blip);

        let items = d
            .caption_images(&ctx, &[upload("a.png", b"img-a")])
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].caption, "a dog on grass");
        assert_eq!(items[0].tags, vec!["a", "dog", "on", "grass"]);
        assert_eq!(items[0].flagged, None);
        assert!(!items[0].cache);
    }

    #[tokio::test]
    async fn second_request_is_served_from_cache() {
        let factory = Arc::new(ScriptedFactory::new("a dog", ""));
        let d = dispatcher(Arc::clone(&factory), Arc::new(MemoryStore::new()));
        let ctx = CaptionContext::new(ModelKey::Blip);

        d.caption_images(&ctx, &[upload("a.png", b"img-a")])
            .await
            .unwrap();
        let items = d
            .caption_images(&ctx, &[upload("a.png", b"img-a")])
            .await
            .unwrap();

        assert!(items[0].cache);
        assert_eq!(items[0].caption, "a dog");
        assert_eq!(factory.caption_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_caption_falls_back_with_empty_tags_but_keeps_flag() {
        let factory = Arc::new(ScriptedFactory::new("", "{\"flag\": true}"));
        let d = dispatcher(Arc::clone(&factory), Arc::new(MemoryStore::new()));
        let ctx = CaptionContext::new(ModelKey::Gemma);

        let items = d
            .caption_images(&ctx, &[upload("a.png", b"img-a")])
            .await
            .unwrap();

        assert_eq!(items[0].caption, FALLBACK_CAPTION);
        assert!(items[0].tags.is_empty());
        assert_eq!(items[0].flagged, Some(true));
    }

    #[tokio::test]
    async fn flag_is_skipped_without_capability() {
        let factory = Arc::new(ScriptedFactory::new("a cat", "{\"flag\": true}"));
        let d = dispatcher(Arc::clone(&factory), Arc::new(MemoryStore::new()));
        let ctx = CaptionContext::new(ModelKey::Blip2);

        let items = d
            .caption_images(&ctx, &[upload("a.png", b"img-a")])
            .await
            .unwrap();

        assert_eq!(items[0].flagged, None);
        assert_eq!(factory.flag_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn collective_rejects_unsupported_model_before_any_work() {
        let factory = Arc::new(ScriptedFactory::new("a herd", "{\"flag\": false}"));
        let d = dispatcher(Arc::clone(&factory), Arc::new(MemoryStore::new()));
        let ctx = CaptionContext::new(ModelKey::Blip);

        let err = d
            .caption_collective(&ctx, &[upload("a.png", b"img-a")])
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::CapabilityUnsupported { .. }));
        // Neither the factory nor the runtime was touched.
        assert_eq!(factory.loads.load(Ordering::SeqCst), 0);
        assert_eq!(factory.caption_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn collective_carries_count_tags_and_flag() {
        let factory = Arc::new(ScriptedFactory::new("dogs at a park", "{\"flag\": true}"));
        let d = dispatcher(Arc::clone(&factory), Arc::new(MemoryStore::new()));
        let ctx = CaptionContext::new(ModelKey::InternVlm);

        let resp = d
            .caption_collective(&ctx, &[upload("a.png", b"img-a"), upload("b.png", b"img-b")])
            .await
            .unwrap();

        assert_eq!(resp.collective_caption, "dogs at a park");
        assert_eq!(resp.count, 2);
        assert_eq!(resp.flagged, Some(true));
        assert!(!resp.cache);

        // Same set, same order: cache hit, no extra inference.
        let again = d
            .caption_collective(&ctx, &[upload("a.png", b"img-a"), upload("b.png", b"img-b")])
            .await
            .unwrap();
        assert!(again.cache);
        assert_eq!(factory.caption_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn collective_key_is_order_sensitive() {
        let factory = Arc::new(ScriptedFactory::new("dogs", "{\"flag\": false}"));
        let d = dispatcher(Arc::clone(&factory), Arc::new(MemoryStore::new()));
        let ctx = CaptionContext::new(ModelKey::Gemma);

        d.caption_collective(&ctx, &[upload("a.png", b"img-a"), upload("b.png", b"img-b")])
            .await
            .unwrap();
        let swapped = d
            .caption_collective(&ctx, &[upload("b.png", b"img-b"), upload("a.png", b"img-a")])
            .await
            .unwrap();

        // Different order, different key: recomputed rather than served
        // from cache.
        assert!(!swapped.cache);
        assert_eq!(factory.caption_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalid_upload_is_rejected_before_inference() {
        let factory = Arc::new(ScriptedFactory::new("a dog", ""));
        let d = dispatcher(Arc::clone(&factory), Arc::new(MemoryStore::new()));
        let ctx = CaptionContext::new(ModelKey::Blip);

        let bad = ImageUpload::new("x.gif", "image/gif", Bytes::from_static(b"GIF89a"));
        let err = d.caption_images(&ctx, &[bad]).await.unwrap_err();

        assert!(matches!(err, CoreError::Model(_)));
        assert_eq!(factory.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cache_outage_still_yields_fresh_results() {
        let factory = Arc::new(ScriptedFactory::new("a dog", ""));
        let d = dispatcher(Arc::clone(&factory), Arc::new(DownStore));
        let ctx = CaptionContext::new(ModelKey::Blip);

        let items = d
            .caption_images(&ctx, &[upload("a.png", b"img-a")])
            .await
            .unwrap();
        assert_eq!(items[0].caption, "a dog");
        assert!(!items[0].cache);

        // Every request recomputes while the store is down.
        d.caption_images(&ctx, &[upload("a.png", b"img-a")])
            .await
            .unwrap();
        assert_eq!(factory.caption_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn flag_generation_cap_follows_the_flow() {
        let flag_caps = Arc::new(std::sync::Mutex::new(Vec::new()));
        let factory = Arc::new(CapRecordingFactory {
            flag_caps: Arc::clone(&flag_caps),
        });
        let registry = Arc::new(ModelRegistry::new(factory, 1));
        let cache = ResponseCache::new(Arc::new(MemoryStore::new()), Duration::from_secs(60));
        let d = Dispatcher::new(registry, cache, Arc::new(SplitTagger));
        let ctx = CaptionContext::new(ModelKey::Gemma);

        // Per-image flagging stays within the tight structured-output cap.
        d.caption_images(&ctx, &[upload("a.png", b"img-a")])
            .await
            .unwrap();
        assert_eq!(*flag_caps.lock().unwrap(), vec![MAX_FLAG_TOKENS]);

        // Collective flagging shares the wider collective budget.
        d.caption_collective(&ctx, &[upload("a.png", b"img-a"), upload("b.png", b"img-b")])
            .await
            .unwrap();
        assert_eq!(
            *flag_caps.lock().unwrap(),
            vec![MAX_FLAG_TOKENS, MAX_COLLECTIVE_TOKENS]
        );
    }

    #[tokio::test]
    async fn reset_cache_propagates_store_failure() {
        let factory = Arc::new(ScriptedFactory::new("a dog", ""));
        let d = dispatcher(factory, Arc::new(DownStore));
        assert!(d.reset_cache().await.is_err());
    }
}
