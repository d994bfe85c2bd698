//! Error types for the core text pipeline.

use thiserror::Error;

/// Result type for core operations.
pub type CardResult<T> = Result<T, CardError>;

/// Errors that can occur while configuring or persisting a render.
///
/// Normalization and layout never fail; malformed Markdown degrades into
/// residual markers instead of raising.
#[derive(Debug, Error)]
pub enum CardError {
    /// A colour string could not be parsed as `#rgb`, `#rrggbb` or `#rrggbbaa`.
    #[error("Invalid color '{0}': expected #rgb, #rrggbb or #rrggbbaa")]
    InvalidColor(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An unknown export format was requested.
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// Serialization/deserialization of persisted settings failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persistence collaborator failure.
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
}
