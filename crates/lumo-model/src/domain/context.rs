use crate::domain::key::ModelKey;

const BLIP_CAPTION_PROMPT: &str = "a photo of";
const BLIP2_CAPTION_PROMPT: &str =
    "Describe the image as if posting on social media, concise and vivid.";
const VLM_CAPTION_PROMPT: &str = "You are a helpful assistant who generates captions for images. \
     You keep the caption concise within 25 words and return a single caption without any additional text.";
const VLM_FLAG_PROMPT: &str = "You are a helpful assistant who generates json objects from images. \
     You respond with a single JSON object with a single key 'flag' and value 'true' or 'false' \
     based on any of the images have any animals on them. DO NOT include any formatting, \
     additional text, or explanation. Only respond with the JSON object.";

/// Per-request inference context: the selected backend plus optional
/// instruction overrides.
///
/// This replaces module-level "current model / current prompt" globals with
/// an explicit value passed to the dispatcher, so concurrent requests never
/// observe each other's selections.
#[derive(Debug, Clone)]
pub struct CaptionContext {
    /// Backend chosen for this request.
    pub model: ModelKey,
    /// Caption instruction override; defaults per backend when `None`.
    pub caption_prompt: Option<String>,
    /// Flag instruction override; defaults per backend when `None`.
    pub flag_prompt: Option<String>,
}

impl CaptionContext {
    pub fn new(model: ModelKey) -> Self {
        Self {
            model,
            caption_prompt: None,
            flag_prompt: None,
        }
    }

    /// Builder-style caption instruction override.
    pub fn with_caption_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.caption_prompt = Some(prompt.into());
        self
    }

    /// Builder-style flag instruction override.
    pub fn with_flag_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.flag_prompt = Some(prompt.into());
        self
    }

    /// Effective caption instruction: the override, or the backend default.
    pub fn caption_prompt(&self) -> &str {
        if let Some(p) = self.caption_prompt.as_deref() {
            return p;
        }
        match self.model {
            ModelKey::Blip => BLIP_CAPTION_PROMPT,
            ModelKey::Blip2 => BLIP2_CAPTION_PROMPT,
            ModelKey::Gemma | ModelKey::InternVlm => VLM_CAPTION_PROMPT,
        }
    }

    /// Effective flag instruction for backends that support flagging.
    ///
    /// Returns `None` for backends without flag support; the dispatcher
    /// never issues a flag call for those.
    pub fn flag_prompt(&self) -> Option<&str> {
        if !self.model.supports_flagging() {
            return None;
        }
        Some(self.flag_prompt.as_deref().unwrap_or(VLM_FLAG_PROMPT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_prompt_defaults_per_backend() {
        assert_eq!(
            CaptionContext::new(ModelKey::Blip).caption_prompt(),
            BLIP_CAPTION_PROMPT
        );
        assert_eq!(
            CaptionContext::new(ModelKey::Blip2).caption_prompt(),
            BLIP2_CAPTION_PROMPT
        );
        assert_eq!(
            CaptionContext::new(ModelKey::Gemma).caption_prompt(),
            VLM_CAPTION_PROMPT
        );
    }

    #[test]
    fn overrides_win_over_defaults() {
        let ctx = CaptionContext::new(ModelKey::Gemma)
            .with_caption_prompt("describe tersely")
            .with_flag_prompt("is there a cat?");
        assert_eq!(ctx.caption_prompt(), "describe tersely");
        assert_eq!(ctx.flag_prompt(), Some("is there a cat?"));
    }

    #[test]
    fn flag_prompt_is_absent_without_capability() {
        let ctx = CaptionContext::new(ModelKey::Blip).with_flag_prompt("ignored");
        assert_eq!(ctx.flag_prompt(), None);
    }
}
