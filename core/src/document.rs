#![deny(missing_docs)]

//! # Document Loading & Writing
//!
//! Reads YAML (or JSON) OpenAPI documents into an ordered `serde_yaml::Value`
//! tree and serializes results back out.
//!
//! Mapping order is insertion order on both sides, so keys come out in the
//! order the document declared them.

use crate::error::{AppError, AppResult};
use serde_yaml::Value;
use std::fs;
use std::path::Path;

/// Key of the single field in the JSON envelope printed to standard output.
pub const ENVELOPE_KEY: &str = "integrated_openapi_yaml";

/// Parses raw YAML text into a document tree.
///
/// YAML merge keys (`<<`) are applied after parsing so that the tree only
/// contains plain mappings, sequences and scalars.
pub fn parse_document(yaml_content: &str) -> AppResult<Value> {
    let mut document: Value = serde_yaml::from_str(yaml_content)?;
    document.apply_merge()?;
    Ok(document)
}

/// Reads and parses the document stored at `path`.
pub fn load_document(path: &Path) -> AppResult<Value> {
    let yaml_content = fs::read_to_string(path)
        .map_err(|e| AppError::General(format!("Failed to read {:?}: {}", path, e)))?;

    let document = parse_document(&yaml_content)?;
    tracing::debug!(path = %path.display(), "loaded document");
    Ok(document)
}

/// Serializes a document tree to YAML text without re-sorting keys.
pub fn render_document(document: &Value) -> AppResult<String> {
    Ok(serde_yaml::to_string(document)?)
}

/// Writes already-rendered YAML text to `path`, creating parent directories.
pub fn write_document(path: &Path, yaml_text: &str) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, yaml_text)?;
    tracing::info!(path = %path.display(), "wrote integrated document");
    Ok(())
}

/// Wraps rendered YAML text into the one-line JSON object printed on stdout.
///
/// ```
/// let line = apigw_core::render_envelope("paths: {}\n").unwrap();
/// assert_eq!(line, r#"{"integrated_openapi_yaml":"paths: {}\n"}"#);
/// ```
pub fn render_envelope(yaml_text: &str) -> AppResult<String> {
    let envelope = serde_json::json!({ ENVELOPE_KEY: yaml_text });
    Ok(serde_json::to_string(&envelope)?)
}
