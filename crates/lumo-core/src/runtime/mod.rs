//! Runtime abstraction consumed by the registry and the dispatcher.
//!
//! The actual tensor computation lives behind [`ModelRuntime`]; this crate
//! only manages which runtimes are resident and how their output is used.
mod error;
pub use error::RuntimeError;

use std::sync::Arc;

use async_trait::async_trait;

use lumo_model::{ImageUpload, ModelKey};

/// What a loaded backend is able to do, fixed at load time.
///
/// The dispatcher queries these flags instead of branching on concrete
/// runtime types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Can caption a whole image set in one call.
    pub collective: bool,
    /// Can answer structured boolean flag queries.
    pub flagging: bool,
}

impl Capabilities {
    /// Derive capabilities from the backend variant.
    pub const fn for_key(key: ModelKey) -> Self {
        Self {
            collective: key.supports_collective(),
            flagging: key.supports_flagging(),
        }
    }
}

/// A loaded vision-language backend.
///
/// Implementations own their pre/post-processor and model weights.
/// Calls are potentially long-running (hundreds of milliseconds to seconds)
/// and must never be made while holding registry locks.
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    /// Caption a single image, optionally conditioned on an instruction.
    async fn caption(
        &self,
        image: &ImageUpload,
        instruction: Option<&str>,
    ) -> Result<String, RuntimeError>;

    /// Caption a whole image set in one pass. Capability-gated.
    async fn caption_collective(
        &self,
        images: &[ImageUpload],
        instruction: Option<&str>,
        max_new_tokens: u32,
    ) -> Result<String, RuntimeError>;

    /// Ask for a structured flag judgment over an image set; the returned
    /// free text is expected to contain a JSON object with a boolean
    /// `flag` field. Capability-gated.
    async fn flag_text(
        &self,
        images: &[ImageUpload],
        instruction: Option<&str>,
        max_new_tokens: u32,
    ) -> Result<String, RuntimeError>;

    /// Release device-resident resources (e.g. move weights off the
    /// accelerator). Best-effort: implementations log failures and never
    /// raise. Memory held by the runtime object itself is reclaimed when
    /// the last strong reference drops.
    fn release(&self);
}

/// The resident form of a backend: runtime object, execution device and
/// capability flags, bound together at load time.
///
/// Handles are shared as `Arc<RuntimeHandle>`; the registry holds one
/// strong reference while the handle is resident and in-flight requests
/// hold their own, so eviction never invalidates a borrowed handle.
pub struct RuntimeHandle {
    key: ModelKey,
    device: String,
    capabilities: Capabilities,
    runtime: Arc<dyn ModelRuntime>,
}

impl RuntimeHandle {
    pub fn new(key: ModelKey, device: impl Into<String>, runtime: Arc<dyn ModelRuntime>) -> Self {
        Self {
            key,
            device: device.into(),
            capabilities: Capabilities::for_key(key),
            runtime,
        }
    }

    pub fn key(&self) -> ModelKey {
        self.key
    }

    /// Execution device label (e.g. "cuda", "mps", "cpu").
    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn runtime(&self) -> &Arc<dyn ModelRuntime> {
        &self.runtime
    }

    /// Best-effort device teardown, delegated to the runtime.
    pub fn release(&self) {
        self.runtime.release();
    }
}

impl std::fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("key", &self.key)
            .field("device", &self.device)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Factory that loads a backend for a given key.
///
/// Loads are slow (seconds) and may fail; the registry never caches a
/// failed attempt, so a later request retries from scratch.
#[async_trait]
pub trait RuntimeFactory: Send + Sync {
    async fn load(&self, key: ModelKey) -> Result<RuntimeHandle, RuntimeError>;
}
