//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// YAML parse or serialization failure.
    #[display("YAML Error: {_0}")]
    Yaml(serde_yaml::Error),

    /// JSON serialization failure.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),

    /// The document does not have the shape an OpenAPI document must have.
    /// Ignored for `From<String>` to avoid conflict with General.
    #[from(ignore)]
    #[display("Invalid Document: {_0}")]
    InvalidDocument(String),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;
