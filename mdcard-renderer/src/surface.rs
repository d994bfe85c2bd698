//! Drawing surfaces.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              Surface Trait                  │
//! ├─────────────────────────────────────────────┤
//! │ measure · font size · fill colour           │
//! │ fill_rect · fill_text · rasterize           │
//! ├─────────────────────────────────────────────┤
//! │ SvgSurface: records SVG, rasterizes with    │
//! │ usvg/resvg onto a tiny-skia pixmap          │
//! └─────────────────────────────────────────────┘
//! ```

use std::fmt::Write;
use std::sync::Arc;

use mdcard_core::{Color, ExportFormat, TextMeasure};
use usvg::fontdb::Database;

use crate::error::RenderResult;
use crate::export::{self, escape_xml, ExportedImage};
use crate::font::FontMeasure;

/// Parameters for turning recorded drawing into pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterRequest {
    /// Canvas width in layout units.
    pub width: f32,
    /// Canvas height in layout units.
    pub height: f32,
    /// Device pixels per layout unit.
    pub scale: f32,
    /// Output encoding.
    pub format: ExportFormat,
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
    /// Colour transparent pixels are composited over for JPEG.
    pub background: Color,
}

impl RasterRequest {
    /// Output size in whole pixels, at least 1x1.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn pixel_size(&self) -> (u32, u32) {
        let w = (self.width * self.scale).round().max(1.0) as u32;
        let h = (self.height * self.scale).round().max(1.0) as u32;
        (w, h)
    }
}

/// A 2D drawing target in layout units.
pub trait Surface {
    /// Width of `text` at the current font size.
    fn measure_text_width(&self, text: &str) -> f32;

    /// Font size for subsequent text.
    fn set_font_size(&mut self, size: f32);

    /// Fill colour for subsequent rectangles and text.
    fn set_fill_color(&mut self, color: Color);

    /// Fill an axis-aligned rectangle.
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32);

    /// Draw `text` with its baseline at `y`.
    fn fill_text(&mut self, text: &str, x: f32, y: f32);

    /// Rasterize everything drawn so far.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization or encoding fails.
    fn rasterize(&self, request: &RasterRequest) -> RenderResult<ExportedImage>;
}

/// Surface that records drawing as SVG elements.
#[derive(Debug)]
pub struct SvgSurface {
    body: String,
    fill: Color,
    font_family: String,
    fontdb: Arc<Database>,
    measure: FontMeasure,
}

impl SvgSurface {
    /// Surface drawing with `font_family` from `fontdb`.
    #[must_use]
    pub fn new(fontdb: Arc<Database>, font_family: &str, font_size: f32) -> Self {
        Self {
            body: String::with_capacity(4096),
            fill: Color::BLACK,
            font_family: font_family.to_string(),
            measure: FontMeasure::new(Arc::clone(&fontdb), font_family, font_size),
            fontdb,
        }
    }

    /// Whether text will be painted with a real font face.
    #[must_use]
    pub fn has_font(&self) -> bool {
        self.measure.has_face()
    }

    /// Full SVG document for `request`.
    #[must_use]
    pub fn to_svg(&self, request: &RasterRequest) -> String {
        let (out_w, out_h) = request.pixel_size();
        let mut svg = String::with_capacity(self.body.len() + 256);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {} {}\">",
            request.width, request.height,
        );
        svg.push_str(&self.body);
        svg.push_str("</svg>");
        svg
    }

    fn fill_attrs(&self) -> String {
        let mut attrs = format!("fill=\"{}\"", self.fill.to_rgb_hex());
        if self.fill.a != 255 {
            let _ = write!(attrs, " fill-opacity=\"{}\"", self.fill.opacity());
        }
        attrs
    }
}

impl Surface for SvgSurface {
    fn measure_text_width(&self, text: &str) -> f32 {
        self.measure.measure(text)
    }

    fn set_font_size(&mut self, size: f32) {
        self.measure.set_font_size(size);
    }

    fn set_fill_color(&mut self, color: Color) {
        self.fill = color;
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let fill = self.fill_attrs();
        let _ = write!(
            self.body,
            "<rect x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\" {fill}/>",
        );
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        tracing::trace!(x, y, chars = text.chars().count(), "fill_text");
        let fill = self.fill_attrs();
        let _ = write!(
            self.body,
            "<text x=\"{x}\" y=\"{y}\" font-size=\"{}\" font-family=\"{}\" {fill} xml:space=\"preserve\">{}</text>",
            self.measure.font_size(),
            escape_xml(&self.font_family),
            escape_xml(text),
        );
    }

    fn rasterize(&self, request: &RasterRequest) -> RenderResult<ExportedImage> {
        let svg = self.to_svg(request);
        let mut options = usvg::Options::default();
        options.fontdb = Arc::clone(&self.fontdb);
        options.font_family.clone_from(&self.font_family);

        let pixmap = export::rasterize_svg(&svg, &options)?;
        export::encode(&pixmap, request.format, request.background, request.jpeg_quality)
    }
}
