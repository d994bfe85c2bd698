//! Renderer error types.

use mdcard_core::CardError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The Markdown source was blank.
    #[error("Nothing to render: input is empty")]
    EmptyInput,

    /// Another export is still running.
    #[error("An export is already in progress")]
    Busy,

    /// The render configuration was rejected.
    #[error("Invalid render configuration: {0}")]
    Config(#[from] CardError),

    /// A drawing surface could not be created or drawn on.
    #[error("Surface error: {0}")]
    Surface(String),

    /// Rasterization or encoding failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// A font file could not be loaded.
    #[error("Font error: {0}")]
    Font(String),

    /// The background export task did not complete.
    #[error("Export task failed: {0}")]
    Task(String),
}
