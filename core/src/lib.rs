#![deny(missing_docs)]

//! # API Gateway OpenAPI Core
//!
//! Turns an OpenAPI document into an AWS API Gateway definition by attaching
//! HTTP-proxy integrations (through a VPC link) to every operation.
//!
//! - **document**: YAML loading, rendering and the stdout envelope.
//! - **params**: Path parameter collection.
//! - **integration**: Per-path and per-document integration.
//! - **assembly**: BFF prefixing, supplementary merge and maintenance mode.

/// Shared error types.
pub mod error;

/// Document loading & writing.
pub mod document;

/// Path parameter collection.
pub mod params;

/// Integration generation.
pub mod integration;

/// Pipeline orchestration.
pub mod assembly;

pub use assembly::{
    assemble, assemble_from_files, load_maintenance, merge_paths, prefix_paths, AssemblyOptions,
    DeploymentType, BFF_PATH_PREFIX, BFF_TYPE,
};
pub use document::{
    load_document, parse_document, render_document, render_envelope, write_document, ENVELOPE_KEY,
};
pub use error::{AppError, AppResult};
pub use integration::{
    backend_uri, integrate_openapi, integrate_path, Integration, IntegrationOptions,
    BINARY_MEDIA_TYPES_KEY, HTTP_METHODS, INTEGRATION_KEY,
};
pub use params::{declared_path_parameters, ParameterScope, PathParameterSet};
