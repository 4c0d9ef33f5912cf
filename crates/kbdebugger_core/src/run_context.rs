use serde::{Deserialize, Serialize};

/// Provenance carried from the pipeline run into later stages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunContext {
    pub source: String,
    #[serde(default)]
    pub source_name: String,
    #[serde(default)]
    pub keyword: String,
}

impl RunContext {
    /// Reads `_meta` from a finished pipeline result. Returns `None` unless a
    /// non-empty `source` is present.
    pub fn from_pipeline_result(result: &serde_json::Value) -> Option<Self> {
        let meta = result.get("_meta")?;
        let text = |key: &str| {
            meta.get(key)
                .and_then(serde_json::Value::as_str)
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };
        let source = text("source");
        if source.is_empty() {
            return None;
        }
        Some(Self {
            source,
            source_name: text("source_name"),
            keyword: text("keyword"),
        })
    }
}
