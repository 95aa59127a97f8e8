use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Closed set of inference backends the service knows how to load.
///
/// Unrecognized keys are rejected at parse time, before any registry or
/// cache state is touched. Capability predicates are derived from the
/// variant itself: the lightweight captioning backends (`Blip`, `Blip2`)
/// only support single-image generation, while the instruction-following
/// backends (`Gemma`, `InternVlm`) additionally support collective
/// captioning and structured flag extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKey {
    Blip,
    Blip2,
    Gemma,
    InternVlm,
}

impl ModelKey {
    /// All recognized keys, in registry load-priority order.
    pub const ALL: [ModelKey; 4] = [
        ModelKey::Blip,
        ModelKey::Blip2,
        ModelKey::Gemma,
        ModelKey::InternVlm,
    ];

    /// Stable wire name for this key.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ModelKey::Blip => "blip",
            ModelKey::Blip2 => "blip2",
            ModelKey::Gemma => "gemma",
            ModelKey::InternVlm => "intern_vlm",
        }
    }

    /// Whether this backend can caption a whole image set at once.
    pub const fn supports_collective(&self) -> bool {
        matches!(self, ModelKey::Gemma | ModelKey::InternVlm)
    }

    /// Whether this backend can answer structured flag queries.
    pub const fn supports_flagging(&self) -> bool {
        matches!(self, ModelKey::Gemma | ModelKey::InternVlm)
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKey {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blip" => Ok(ModelKey::Blip),
            "blip2" => Ok(ModelKey::Blip2),
            "gemma" => Ok(ModelKey::Gemma),
            "intern_vlm" => Ok(ModelKey::InternVlm),
            other => Err(ModelError::UnknownModelKey(other.to_string())),
        }
    }
}
