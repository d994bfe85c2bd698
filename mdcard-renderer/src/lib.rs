//! # mdcard renderer
//!
//! Paints laid-out card text onto a [`Surface`] and encodes the result.
//!
//! ## Pipeline
//!
//! ```text
//! markdown ─► normalize ─► estimate ─┐
//!                      └─► layout(surface measure) ─► render ─► PNG / JPEG
//! ```
//!
//! [`SvgSurface`] records draw commands as SVG and rasterizes them with
//! usvg/resvg onto a tiny-skia pixmap. [`Exporter`] runs that work on tokio's
//! blocking pool, one export at a time.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;
pub mod exporter;
pub mod font;
pub mod render;
pub mod surface;

pub use error::{RenderError, RenderResult};
pub use export::{ExportedImage, ImageInfo};
pub use exporter::Exporter;
pub use font::{load_fonts, FontMeasure};
pub use render::{effective_scale, render, render_markdown};
pub use surface::{RasterRequest, Surface, SvgSurface};
