//! Pixmap encoding and the exported image value.
//!
//! Rasterization goes through an SVG intermediate and the resvg/tiny-skia
//! pipeline; this module turns the resulting pixmap into PNG or JPEG bytes.

use base64::Engine;
use image::ImageEncoder;
use mdcard_core::{Color, ExportFormat};
use serde::Serialize;

use crate::error::{RenderError, RenderResult};

/// An encoded card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
    /// Encoding of `bytes`.
    pub format: ExportFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Summary of an [`ExportedImage`] without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    /// Encoding.
    pub format: ExportFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Encoded size in bytes.
    pub bytes: usize,
}

impl ExportedImage {
    /// `data:` URI embedding the image as base64.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    /// Dimensions and size, for logs and JSON output.
    #[must_use]
    pub fn info(&self) -> ImageInfo {
        ImageInfo {
            format: self.format,
            width: self.width,
            height: self.height,
            bytes: self.bytes.len(),
        }
    }
}

/// Parse and rasterize an SVG document onto a pixmap of its own size.
///
/// # Errors
///
/// Returns [`RenderError::Export`] if the SVG is invalid or the pixmap cannot
/// be allocated.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rasterize_svg(svg: &str, options: &usvg::Options<'_>) -> RenderResult<tiny_skia::Pixmap> {
    let tree = usvg::Tree::from_str(svg, options)
        .map_err(|e| RenderError::Export(format!("SVG parsing failed: {e}")))?;

    let px_w = tree.size().width().round() as u32;
    let px_h = tree.size().height().round() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1)).ok_or_else(|| {
        RenderError::Export(format!("Failed to create {px_w}x{px_h} pixmap"))
    })?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    Ok(pixmap)
}

/// Encode a pixmap in `format`.
///
/// JPEG has no alpha channel, so pixels are composited over `background`.
///
/// # Errors
///
/// Returns [`RenderError::Export`] if encoding fails.
pub fn encode(
    pixmap: &tiny_skia::Pixmap,
    format: ExportFormat,
    background: Color,
    jpeg_quality: u8,
) -> RenderResult<ExportedImage> {
    let bytes = match format {
        ExportFormat::Png => pixmap
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))?,
        ExportFormat::Jpeg => encode_jpeg(pixmap, background, jpeg_quality)?,
    };
    tracing::debug!(
        %format,
        width = pixmap.width(),
        height = pixmap.height(),
        bytes = bytes.len(),
        "encoded image"
    );
    Ok(ExportedImage {
        bytes,
        format,
        width: pixmap.width(),
        height: pixmap.height(),
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn encode_jpeg(
    pixmap: &tiny_skia::Pixmap,
    background: Color,
    quality: u8,
) -> RenderResult<Vec<u8>> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let bg = [background.r, background.g, background.b];
    let mut rgb_data = Vec::with_capacity(width as usize * height as usize * 3);

    // tiny-skia stores premultiplied RGBA
    for pixel in pixmap.data().chunks_exact(4) {
        let inv = 1.0 - f32::from(pixel[3]) / 255.0;
        for channel in 0..3 {
            let value = f32::from(bg[channel]).mul_add(inv, f32::from(pixel[channel]));
            rgb_data.push(value.round().clamp(0.0, 255.0) as u8);
        }
    }

    let mut buf = std::io::Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .write_image(&rgb_data, width, height, image::ColorType::Rgb8.into())
        .map_err(|e| RenderError::Export(format!("JPEG encoding failed: {e}")))?;

    Ok(buf.into_inner())
}

/// Escape special XML characters.
pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, color: tiny_skia::Color) -> tiny_skia::Pixmap {
        let mut pixmap = tiny_skia::Pixmap::new(width, height).unwrap();
        pixmap.fill(color);
        pixmap
    }

    #[test]
    fn test_png_magic_bytes() {
        let image = encode(
            &solid(4, 3, tiny_skia::Color::WHITE),
            ExportFormat::Png,
            Color::WHITE,
            100,
        )
        .unwrap();
        assert_eq!(&image.bytes[0..4], &[137, 80, 78, 71]);
        assert_eq!((image.width, image.height), (4, 3));
    }

    #[test]
    fn test_jpeg_composites_transparency_over_background() {
        let image = encode(
            &solid(8, 8, tiny_skia::Color::TRANSPARENT),
            ExportFormat::Jpeg,
            Color::BLACK,
            90,
        )
        .unwrap();
        assert_eq!(&image.bytes[0..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&image.bytes).unwrap().to_rgb8();
        let pixel = decoded.get_pixel(4, 4);
        assert!(pixel.0.iter().all(|&c| c < 8), "expected black, got {pixel:?}");
    }

    #[test]
    fn test_rasterize_uses_svg_size() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="30" height="20" viewBox="0 0 15 10"><rect width="100%" height="100%" fill="#ff0000"/></svg>"##;
        let pixmap = rasterize_svg(svg, &usvg::Options::default()).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (30, 20));
        let px = pixmap.pixel(10, 10).unwrap();
        assert_eq!((px.red(), px.green(), px.blue()), (255, 0, 0));
    }

    #[test]
    fn test_rasterize_rejects_invalid_svg() {
        assert!(matches!(
            rasterize_svg("<not-svg", &usvg::Options::default()),
            Err(RenderError::Export(_))
        ));
    }

    #[test]
    fn test_data_uri() {
        let image = ExportedImage {
            bytes: b"abc".to_vec(),
            format: ExportFormat::Jpeg,
            width: 1,
            height: 1,
        };
        assert_eq!(image.to_data_uri(), "data:image/jpeg;base64,YWJj");
        assert_eq!(image.info().bytes, 3);
    }

    #[test]
    fn test_xml_escaping() {
        assert_eq!(escape_xml("A < B & C > \"D\""), "A &lt; B &amp; C &gt; &quot;D&quot;");
    }
}
