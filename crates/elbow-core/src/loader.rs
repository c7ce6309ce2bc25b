//! Schema directory loading
//!
//! Flat directory, one schema per file, filtered by extension. The first
//! unreadable or malformed file fails the whole load; no partial results.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::schema::Schema;

/// Extensions treated as schema files when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["json"];

/// Load every schema in `dir` whose extension is in `extensions`.
///
/// Entries are visited in file-name order so the result (and which malformed
/// file gets reported first) does not depend on the filesystem.
///
/// # Errors
///
/// Returns [`LoadError::DirectoryRead`] if `dir` cannot be listed and
/// [`LoadError::SchemaParse`] for the first file that cannot be read or parsed.
pub fn load<S: AsRef<str>>(dir: &Path, extensions: &[S]) -> Result<Vec<Schema>, LoadError> {
    tracing::debug!(dir = %dir.display(), "loading schemas");

    let dir = std::path::absolute(dir).map_err(|e| LoadError::directory(dir, &e))?;
    let entries = std::fs::read_dir(&dir).map_err(|e| LoadError::directory(&dir, &e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| LoadError::directory(&dir, &e))?;
        let path = entry.path();
        if path.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }
    files.sort();

    let mut schemas = Vec::with_capacity(files.len());
    for path in files {
        schemas.push(load_file(&path)?);
    }

    tracing::debug!(dir = %dir.display(), count = schemas.len(), "schemas loaded");
    Ok(schemas)
}

/// Load and parse a single schema file.
///
/// # Errors
///
/// Returns [`LoadError::SchemaParse`] if the file cannot be read, is not
/// valid JSON/YAML, or is not a schema-shaped object.
pub fn load_file(path: &Path) -> Result<Schema, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|e| LoadError::SchemaParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let document = parse_document(path, &content).map_err(|message| LoadError::SchemaParse {
        path: path.to_path_buf(),
        message,
    })?;
    Schema::from_document(document, path.to_path_buf()).map_err(|message| LoadError::SchemaParse {
        path: path.to_path_buf(),
        message,
    })
}

/// Case-insensitive match against the allow-list; entries may carry a dot.
fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|allowed| allowed.as_ref().trim_start_matches('.').eq_ignore_ascii_case(ext))
}

/// Parse a schema document from JSON or YAML.
///
/// Detection strategy: try extension first (`.yaml`/`.yml`/`.json`), then fall
/// back to content sniffing (leading `{` → JSON, otherwise YAML).
fn parse_document(path: &Path, content: &str) -> Result<Value, String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "yaml" | "yml" => serde_yml::from_str(content).map_err(|e| format!("Invalid YAML: {e}")),
        "json" => serde_json::from_str(content).map_err(|e| format!("Invalid JSON: {e}")),
        _ => {
            if content.trim_start().starts_with('{') {
                serde_json::from_str(content).map_err(|e| format!("Invalid JSON: {e}"))
            } else {
                serde_yml::from_str(content).map_err(|e| format!("Invalid YAML: {e}"))
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Cannot read schema directory {}: {message}", dir.display())]
    DirectoryRead { dir: PathBuf, message: String },
    #[error("Invalid schema {}: {message}", path.display())]
    SchemaParse { path: PathBuf, message: String },
}

impl LoadError {
    fn directory(dir: &Path, err: &std::io::Error) -> Self {
        Self::DirectoryRead {
            dir: dir.to_path_buf(),
            message: err.to_string(),
        }
    }
}
