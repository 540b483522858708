#![deny(missing_docs)]

//! # Document Assembly
//!
//! Top-level orchestration of a run:
//!
//! 1. Integrate the primary document.
//! 2. Prefix its paths for backend-for-frontend deployments.
//! 3. Prefix and merge the paths of an optional supplementary document.
//!
//! Maintenance mode bypasses all of the above and serves a static document.

use crate::document::load_document;
use crate::error::{AppError, AppResult};
use crate::integration::{integrate_openapi, IntegrationOptions};
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Deployment tag that enables path prefixing.
pub const BFF_TYPE: &str = "bff";

/// Segment prepended to every path of a backend-for-frontend deployment.
pub const BFF_PATH_PREFIX: &str = "/backend-for-frontend";

/// The flavor of API Gateway the document is assembled for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeploymentType {
    /// Paths are published as declared.
    #[default]
    Standard,
    /// Paths are nested under `/backend-for-frontend`.
    BackendForFrontend,
}

impl DeploymentType {
    /// Maps a deployment tag to its type. Only `bff` is recognized; any other
    /// tag, including the empty one, is `Standard`.
    pub fn from_tag(tag: &str) -> Self {
        if tag == BFF_TYPE {
            Self::BackendForFrontend
        } else {
            Self::Standard
        }
    }

    /// Prefix applied to path keys, if any.
    pub fn path_prefix(self) -> Option<&'static str> {
        match self {
            Self::Standard => None,
            Self::BackendForFrontend => Some(BFF_PATH_PREFIX),
        }
    }
}

/// Settings for a full assembly run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyOptions {
    /// Deployment flavor.
    pub deployment: DeploymentType,
    /// Settings forwarded to the integrator.
    pub integration: IntegrationOptions,
}

/// Prepends `prefix` to every key of the document's `paths` mapping.
///
/// Declaration order is kept. A document without `paths` is left as is.
pub fn prefix_paths(document: &mut Value, prefix: &str) -> AppResult<()> {
    let Some(paths) = document.get_mut("paths").filter(|p| !p.is_null()) else {
        return Ok(());
    };
    let paths = paths
        .as_mapping_mut()
        .ok_or_else(|| AppError::InvalidDocument("`paths` is not a mapping".into()))?;

    let renamed = std::mem::take(paths)
        .into_iter()
        .map(|(key, item)| {
            let path = key.as_str().ok_or_else(|| {
                AppError::InvalidDocument(format!("Path key {:?} is not a string", key))
            })?;
            Ok((Value::from(format!("{}{}", prefix, path)), item))
        })
        .collect::<AppResult<Mapping>>()?;

    *paths = renamed;
    Ok(())
}

/// Moves the `paths` of `source` into the `paths` of `target`.
///
/// Keys already present in `target` take the Path Item from `source`.
pub fn merge_paths(target: &mut Value, source: Value) -> AppResult<()> {
    let Value::Mapping(mut source) = source else {
        return Err(AppError::InvalidDocument(
            "Supplementary document root is not a mapping".into(),
        ));
    };

    let source_paths = match source.remove("paths") {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::Mapping(paths)) => paths,
        Some(_) => {
            return Err(AppError::InvalidDocument(
                "Supplementary `paths` is not a mapping".into(),
            ))
        }
    };

    let target_paths = target
        .get_mut("paths")
        .and_then(Value::as_mapping_mut)
        .ok_or_else(|| AppError::InvalidDocument("OpenAPI document has no `paths` mapping".into()))?;

    for (path, item) in source_paths {
        if target_paths.contains_key(&path) {
            tracing::warn!(path = ?path, "supplementary path replaces integrated path");
        }
        target_paths.insert(path, item);
    }

    Ok(())
}

/// Assembles the final document from already-parsed inputs.
///
/// # Arguments
///
/// * `primary` - The OpenAPI document to integrate. Consumed.
/// * `supplementary` - Extra paths merged in after integration, as is.
/// * `options` - Deployment and integration settings.
pub fn assemble(
    primary: Value,
    supplementary: Option<Value>,
    options: &AssemblyOptions,
) -> AppResult<Value> {
    let prefix = options.deployment.path_prefix();

    // 1. Integrate
    let mut document = integrate_openapi(&primary, &options.integration)?;

    // 2. BFF prefix
    if let Some(prefix) = prefix {
        prefix_paths(&mut document, prefix)?;
        tracing::info!(prefix, "prefixed integrated paths");
    }

    // 3. Supplementary paths
    if let Some(mut extra) = supplementary {
        if let Some(prefix) = prefix {
            prefix_paths(&mut extra, prefix)?;
        }
        merge_paths(&mut document, extra)?;
        tracing::info!("merged supplementary paths");
    }

    Ok(document)
}

/// Loads `input` (and `supplementary`, if given) and assembles them.
pub fn assemble_from_files(
    input: &Path,
    supplementary: Option<&Path>,
    options: &AssemblyOptions,
) -> AppResult<Value> {
    let primary = load_document(input)?;
    let supplementary = supplementary.map(load_document).transpose()?;

    assemble(primary, supplementary, options)
}

/// Loads a maintenance document, returned verbatim without integration.
pub fn load_maintenance(path: &Path) -> AppResult<Value> {
    tracing::info!(path = %path.display(), "serving maintenance document");
    load_document(path)
}
