//! Structured-output parsing for flag judgments.
//!
//! Runtimes are instructed to answer with a single JSON object holding a
//! boolean `flag` field, but free-text generation routinely adds code
//! fences, prose or malformed JSON. Absence of well-formed output is a
//! normal failure mode here, resolved to "not flagged" rather than an
//! error.

use serde_json::Value;

/// Extract a boolean `flag` judgment from free-form model output.
///
/// Total and deterministic: never panics, never errors. Returns `false`
/// for anything that is not a JSON object carrying `flag` as a boolean or
/// a `"true"`/`"false"` string (case-insensitive).
pub fn extract_flag(text: &str) -> bool {
    let cleaned = strip_code_fences(text.trim());

    // First `{` and the first `}` after it; a non-greedy window keeps
    // trailing prose out of the parse.
    let Some(open) = cleaned.find('{') else {
        return false;
    };
    let Some(close) = cleaned[open..].find('}') else {
        return false;
    };
    let candidate = &cleaned[open..=open + close];

    let Ok(value) = serde_json::from_str::<Value>(candidate) else {
        return false;
    };
    match value.get("flag") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => match s.to_ascii_lowercase().as_str() {
            "true" => true,
            // "false" and anything unrecognized both read as not flagged.
            _ => false,
        },
        _ => false,
    }
}

/// Drop markdown fence markers the runtime may wrap its answer in,
/// optionally preceded by a language tag (```json).
fn strip_code_fences(text: &str) -> String {
    text.lines()
        .map(|line| {
            let line = line.trim();
            let line = line
                .strip_prefix("```json")
                .or_else(|| line.strip_prefix("```"))
                .unwrap_or(line);
            line.strip_suffix("```").unwrap_or(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
