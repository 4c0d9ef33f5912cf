use std::fs;
use std::path::Path;

use engine_logging::{engine_error, engine_info, engine_warn};
use kbdebugger_core::RunContext;
use kbdebugger_engine::AtomicFileWriter;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSession {
    run_context: RunContext,
}

/// Run context left behind by an earlier session, if any.
pub(crate) fn load_run_context(path: &Path) -> Option<RunContext> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            engine_warn!("Failed to read session file {:?}: {}", path, err);
            return None;
        }
    };

    let session: PersistedSession = match ron::from_str(&content) {
        Ok(session) => session,
        Err(err) => {
            engine_warn!("Failed to parse session file {:?}: {}", path, err);
            return None;
        }
    };
    if session.run_context.source.trim().is_empty() {
        return None;
    }

    engine_info!("Restored run context from {:?}", path);
    Some(session.run_context)
}

/// Writes the run context, or removes the session file for `None`.
pub(crate) fn save_run_context(path: &Path, context: Option<&RunContext>) {
    let Some(filename) = path.file_name().and_then(|name| name.to_str()) else {
        engine_error!("Session file path {:?} has no file name", path);
        return;
    };
    let writer = AtomicFileWriter::for_file(path);

    let Some(context) = context else {
        if let Err(err) = writer.remove(filename) {
            engine_error!("Failed to clear session file {:?}: {}", path, err);
        }
        return;
    };

    let session = PersistedSession {
        run_context: context.clone(),
    };
    let content = match ron::ser::to_string_pretty(&session, ron::ser::PrettyConfig::new()) {
        Ok(text) => text,
        Err(err) => {
            engine_error!("Failed to serialize session: {}", err);
            return;
        }
    };
    if let Err(err) = writer.write(filename, &content) {
        engine_error!("Failed to write session file {:?}: {}", path, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn context() -> RunContext {
        RunContext {
            source: "ui/temp_uploads/act.pdf".to_string(),
            source_name: "act.pdf".to_string(),
            keyword: "Transparency".to_string(),
        }
    }

    #[test]
    fn saved_context_is_restored() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".kbdebugger_session.ron");

        save_run_context(&path, Some(&context()));
        assert_eq!(load_run_context(&path), Some(context()));
    }

    #[test]
    fn clearing_removes_the_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".kbdebugger_session.ron");

        save_run_context(&path, Some(&context()));
        save_run_context(&path, None);
        assert!(!path.exists());
        assert_eq!(load_run_context(&path), None);
    }

    #[test]
    fn garbage_or_blank_source_is_ignored() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("session.ron");

        fs::write(&path, "not ron at all {").unwrap();
        assert_eq!(load_run_context(&path), None);

        fs::write(&path, "(run_context: (source: \"  \"))").unwrap();
        assert_eq!(load_run_context(&path), None);
    }
}
