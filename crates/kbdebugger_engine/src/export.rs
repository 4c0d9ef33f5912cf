use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use kbdebugger_core::{ExportFormat, SentenceExport};
use serde_json::json;

use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("export path has no file name: {0}")]
    InvalidPath(String),
}

/// JSON document: `{keyword, exported_at, sentences:[...]}`.
pub fn render_json(export: &SentenceExport, exported_at: &str) -> Result<String, ExportError> {
    let document = json!({
        "keyword": export.keyword,
        "exported_at": exported_at,
        "sentences": export.sentences,
    });
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Numbered plain-text list of the unique sentences.
pub fn render_text(export: &SentenceExport) -> String {
    let mut buffer = String::new();
    for (index, record) in export.sentences.iter().enumerate() {
        let _ = writeln!(buffer, "{}. {}", index + 1, record.sentence);
    }
    buffer
}

pub fn write_export(
    path: &Path,
    format: ExportFormat,
    export: &SentenceExport,
    exported_at: &str,
) -> Result<PathBuf, ExportError> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ExportError::InvalidPath(path.display().to_string()))?;
    let content = match format {
        ExportFormat::Json => render_json(export, exported_at)?,
        ExportFormat::Text => render_text(export),
    };
    Ok(AtomicFileWriter::for_file(path).write(filename, content)?)
}
