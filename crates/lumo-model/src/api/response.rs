use serde::{Deserialize, Serialize};

/// Result for one uploaded image.
///
/// The caption is never empty; a degraded generation carries the fallback
/// sentinel instead. `flagged` is present only when the selected backend
/// supports flag extraction. `cache` reports whether the item was served
/// from the response cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionItem {
    pub filename: String,
    pub caption: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flagged: Option<bool>,
    #[serde(default)]
    pub cache: bool,
}

/// Per-file results for a caption request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionBatch {
    pub results: Vec<CaptionItem>,
}

/// One caption summarizing a whole image set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectiveCaption {
    pub collective_caption: String,
    pub count: usize,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flagged: Option<bool>,
    #[serde(default)]
    pub cache: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flagged_is_omitted_when_absent() {
        let item = CaptionItem {
            filename: "a.png".into(),
            caption: "a dog on a beach".into(),
            tags: vec!["dog".into(), "beach".into()],
            flagged: None,
            cache: false,
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(!json.contains("flagged"));

        let back: CaptionItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn collective_roundtrip_keeps_count_and_flag() {
        let resp = CollectiveCaption {
            collective_caption: "three dogs playing".into(),
            count: 3,
            tags: vec!["dogs".into()],
            flagged: Some(true),
            cache: true,
        };
        let json = serde_json::to_string(&resp).unwrap();
        let back: CollectiveCaption = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resp);
    }
}
