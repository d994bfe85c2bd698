//! Serialized, non-blocking card export.
//!
//! Rasterization is CPU bound, so it runs on the blocking pool. Only one export
//! may be outstanding per [`Exporter`]; a second request while one is running
//! is refused with [`RenderError::Busy`] rather than queued.

use std::sync::Arc;

use mdcard_core::RenderConfig;
use tokio::sync::Semaphore;
use usvg::fontdb::Database;

use crate::error::{RenderError, RenderResult};
use crate::export::ExportedImage;
use crate::font::load_fonts;
use crate::render::render_markdown;
use crate::surface::SvgSurface;

/// Runs exports one at a time on tokio's blocking pool.
///
/// Clones share the same busy state and font database.
#[derive(Debug, Clone)]
pub struct Exporter {
    permit: Arc<Semaphore>,
    fontdb: Arc<Database>,
}

impl Exporter {
    /// Exporter drawing with fonts from `fontdb`.
    #[must_use]
    pub fn new(fontdb: Arc<Database>) -> Self {
        Self {
            permit: Arc::new(Semaphore::new(1)),
            fontdb,
        }
    }

    /// Exporter with system fonts plus the config's extra font files.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Font`] if a font file cannot be loaded.
    pub fn for_config(config: &RenderConfig) -> RenderResult<Self> {
        Ok(Self::new(load_fonts(&config.font_files)?))
    }

    /// Whether an export is currently running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.permit.available_permits() == 0
    }

    /// Render `markdown` with `config` off the async executor.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Busy`] if another export is running, any render
    /// error, or [`RenderError::Task`] if the blocking task panicked.
    pub async fn export(
        &self,
        markdown: String,
        config: RenderConfig,
    ) -> RenderResult<ExportedImage> {
        let permit = Arc::clone(&self.permit)
            .try_acquire_owned()
            .map_err(|_| RenderError::Busy)?;
        let fontdb = Arc::clone(&self.fontdb);

        tracing::debug!(bytes = markdown.len(), "export started");
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let mut surface = SvgSurface::new(fontdb, &config.font_family, config.font_size);
            render_markdown(&markdown, &config, &mut surface)
        });

        handle
            .await
            .map_err(|e| RenderError::Task(e.to_string()))?
    }
}
