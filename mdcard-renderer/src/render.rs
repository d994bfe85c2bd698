//! The drawing pass: paint a layout onto a surface and rasterize it.

use mdcard_core::{normalize, LayoutEngine, LayoutResult, RenderConfig};

use crate::error::{RenderError, RenderResult};
use crate::export::ExportedImage;
use crate::surface::{RasterRequest, Surface};

/// Largest scale at which a `width × height` canvas stays within
/// `max_dimension` pixels on both axes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn effective_scale(width: f32, height: f32, scale: f32, max_dimension: u32) -> f32 {
    let largest = width.max(height);
    let limit = max_dimension as f32;
    if largest * scale <= limit {
        return scale;
    }
    let clamped = limit / largest;
    tracing::warn!(
        requested = scale,
        clamped,
        max_dimension,
        "output would exceed the pixel limit, reducing scale"
    );
    clamped
}

/// Paint `layout` and rasterize it.
///
/// The whole `target_width × total_height` canvas is filled with the
/// background first; text is white on pure black and `#1c1c1e` otherwise.
///
/// # Errors
///
/// Returns [`RenderError::Config`] for an invalid configuration, or the
/// surface's error if rasterization fails.
pub fn render(
    layout: &LayoutResult,
    config: &RenderConfig,
    surface: &mut dyn Surface,
) -> RenderResult<ExportedImage> {
    config.validate()?;

    let height = layout.total_height;
    surface.set_fill_color(config.background_color);
    surface.fill_rect(0.0, 0.0, config.target_width, height);

    surface.set_fill_color(config.text_color());
    surface.set_font_size(config.font_size);
    for line in &layout.lines {
        surface.fill_text(&line.text, config.padding, line.baseline);
    }

    let request = RasterRequest {
        width: config.target_width,
        height,
        scale: effective_scale(
            config.target_width,
            height,
            config.quality_scale,
            config.max_output_dimension,
        ),
        format: config.export_format,
        jpeg_quality: config.jpeg_quality,
        background: config.background_color,
    };
    let image = surface.rasterize(&request)?;
    tracing::info!(
        lines = layout.lines.len(),
        width = image.width,
        height = image.height,
        format = %image.format,
        "rendered card"
    );
    Ok(image)
}

/// Normalize, lay out and render `markdown`.
///
/// The draw pass wraps with the surface's own measurements; the canvas is
/// never shorter than the surface-free estimate.
///
/// # Errors
///
/// Returns [`RenderError::EmptyInput`] for blank input, plus everything
/// [`render`] can return.
pub fn render_markdown(
    markdown: &str,
    config: &RenderConfig,
    surface: &mut dyn Surface,
) -> RenderResult<ExportedImage> {
    if markdown.trim().is_empty() {
        return Err(RenderError::EmptyInput);
    }
    config.validate()?;

    let text = normalize(markdown);
    let engine = LayoutEngine::new(config.layout_params());
    let estimate = engine.estimate(&text);

    surface.set_font_size(config.font_size);
    let measure = |line: &str| -> f32 { surface.measure_text_width(line) };
    let mut drawn = engine.layout(&text, &measure);
    drawn.total_height = drawn.total_height.max(estimate.total_height);

    tracing::debug!(
        estimated = estimate.total_height,
        drawn = drawn.total_height,
        lines = drawn.lines.len(),
        "laid out card"
    );
    render(&drawn, config, surface)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_kept_when_within_limit() {
        assert!((effective_scale(750.0, 300.0, 6.0, 16_384) - 6.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_scale_clamped_to_limit() {
        let scale = effective_scale(750.0, 4000.0, 6.0, 16_384);
        assert!((4000.0 * scale - 16_384.0).abs() < 0.5);
        assert!(scale < 6.0);
    }
}
