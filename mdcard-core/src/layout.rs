//! Line wrapping and canvas height estimation.
//!
//! ## Two passes, one wrapper
//!
//! ```text
//!  normalized text ──► estimate()  (no surface: heuristic widths) ──► canvas height
//!                  └─► layout(m)   (surface measure m)            ──► lines + baselines
//! ```
//!
//! Both passes run the same greedy character-by-character wrapper
//! ([`wrap_line`]); only the [`TextMeasure`] differs. The sizing pass keeps the
//! larger of the closed-form estimate and the heuristic wrap so it errs on the
//! tall side.
//!
//! Wrapping is per character, not per word: Latin words may be split across
//! lines. Rendered output depends on this, so it is kept as is.

use serde::{Deserialize, Serialize};

use crate::normalize::unify_line_endings;
use crate::width::{EstimatedMeasure, TextMeasure, WrapUnit};

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_RATIO: f32 = 1.6;

/// Height of a blank line as a fraction of the line height.
pub const BLANK_LINE_RATIO: f32 = 0.6;

/// Minimum canvas height in layout units.
pub const MIN_CANVAS_HEIGHT: f32 = 300.0;

/// Geometry inputs for a layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    /// Canvas width in layout units.
    pub target_width: f32,
    /// Font size in layout units.
    pub font_size: f32,
    /// Padding on every side.
    pub padding: f32,
}

impl LayoutParams {
    /// Create layout parameters.
    #[must_use]
    pub fn new(target_width: f32, font_size: f32, padding: f32) -> Self {
        Self {
            target_width,
            font_size,
            padding,
        }
    }

    /// Distance between consecutive baselines.
    #[must_use]
    pub fn line_height(&self) -> f32 {
        self.font_size * LINE_HEIGHT_RATIO
    }

    /// Width available to text.
    #[must_use]
    pub fn max_width(&self) -> f32 {
        self.target_width - 2.0 * self.padding
    }

    /// Baseline of the first line.
    #[must_use]
    pub fn first_baseline(&self) -> f32 {
        self.padding + self.font_size
    }
}

/// One wrapped line positioned on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutLine {
    /// Text of the line.
    pub text: String,
    /// Y coordinate of the text baseline.
    pub baseline: f32,
}

/// Output of a layout pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    /// Wrapped lines in drawing order.
    pub lines: Vec<LayoutLine>,
    /// Baseline-to-baseline distance used.
    pub line_height: f32,
    /// Canvas height required, never below [`MIN_CANVAS_HEIGHT`].
    pub total_height: f32,
}

impl LayoutResult {
    /// Layout of empty input.
    #[must_use]
    pub fn empty(params: &LayoutParams) -> Self {
        Self {
            lines: Vec::new(),
            line_height: params.line_height(),
            total_height: MIN_CANVAS_HEIGHT,
        }
    }

    /// The wrapped strings, in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.text.as_str())
    }

    /// Number of wrapped lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Whether nothing will be drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Greedy character wrap of a single line.
///
/// Characters are appended one at a time; when the candidate exceeds
/// `max_width` and the current line is non-empty, the current line is flushed
/// and the character starts the next one. An empty line is never flushed, so a
/// glyph wider than `max_width` sits alone on its own line.
#[must_use]
pub fn wrap_line(unit: &WrapUnit<'_>, max_width: f32, measure: &dyn TextMeasure) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for glyph in unit.glyphs() {
        let mut candidate = current.clone();
        candidate.push(glyph.ch);
        if measure.measure(&candidate) > max_width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current.push(glyph.ch);
        } else {
            current = candidate;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Lays out normalized text for a fixed canvas geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutEngine {
    params: LayoutParams,
}

impl LayoutEngine {
    /// Engine for `params`.
    #[must_use]
    pub fn new(params: LayoutParams) -> Self {
        Self { params }
    }

    /// Geometry in use.
    #[must_use]
    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    /// Draw pass: wrap with a real measure and position every line.
    #[must_use]
    pub fn layout(&self, text: &str, measure: &dyn TextMeasure) -> LayoutResult {
        let text = unify_line_endings(text);
        if text.trim().is_empty() {
            return LayoutResult::empty(&self.params);
        }

        let line_height = self.params.line_height();
        let max_width = self.params.max_width();
        let mut lines = Vec::new();
        let mut offset = 0.0_f32;

        for source in text.split('\n') {
            let unit = WrapUnit::new(source);
            if unit.is_blank() {
                offset += line_height * BLANK_LINE_RATIO;
                continue;
            }
            for wrapped in wrap_line(&unit, max_width, measure) {
                lines.push(LayoutLine {
                    text: wrapped,
                    baseline: self.params.first_baseline() + offset,
                });
                offset += line_height;
            }
        }

        let total_height = (2.0 * self.params.padding + offset).max(MIN_CANVAS_HEIGHT);
        tracing::trace!(lines = lines.len(), total_height, "layout pass");
        LayoutResult {
            lines,
            line_height,
            total_height,
        }
    }

    /// Sizing pass without a surface.
    ///
    /// Lines come from the heuristic wrap; the height is the larger of that
    /// wrap and the closed-form per-line estimate.
    #[must_use]
    pub fn estimate(&self, text: &str) -> LayoutResult {
        let text = unify_line_endings(text);
        let mut result = self.layout(&text, &EstimatedMeasure::new(self.params.font_size));
        if !result.is_empty() {
            result.total_height = result.total_height.max(self.closed_form_height(&text));
        }
        result
    }

    /// Visual lines a source line is expected to occupy:
    /// `max(1, ceil(display_width / chars_per_line))`.
    #[must_use]
    pub fn estimated_line_count(&self, line: &str) -> usize {
        let width = WrapUnit::new(line).display_width() as usize;
        width.div_ceil(self.chars_per_line()).max(1)
    }

    /// Columns that fit on one line at the heuristic column width, at least 1.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn chars_per_line(&self) -> usize {
        let column = EstimatedMeasure::new(self.params.font_size).column_width();
        let fit = (self.params.max_width() / column).floor();
        if fit.is_finite() && fit >= 1.0 {
            fit as usize
        } else {
            1
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn closed_form_height(&self, text: &str) -> f32 {
        let line_height = self.params.line_height();
        let body: f32 = text
            .split('\n')
            .map(|line| {
                if line.trim().is_empty() {
                    line_height * BLANK_LINE_RATIO
                } else {
                    self.estimated_line_count(line) as f32 * line_height
                }
            })
            .sum();
        (2.0 * self.params.padding + body).max(MIN_CANVAS_HEIGHT)
    }
}

/// Sizing-pass layout of `text` on a canvas of the given geometry.
#[must_use]
pub fn layout(text: &str, target_width: f32, font_size: f32, padding: f32) -> LayoutResult {
    LayoutEngine::new(LayoutParams::new(target_width, font_size, padding)).estimate(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[allow(clippy::cast_precision_loss)]
    fn ten_per_char(text: &str) -> f32 {
        text.chars().count() as f32 * 10.0
    }

    fn small_engine() -> LayoutEngine {
        // max width 80: eight 10-unit characters per line
        LayoutEngine::new(LayoutParams::new(100.0, 10.0, 10.0))
    }

    #[test]
    fn test_empty_input_hits_floor() {
        for (w, f, p) in [(750.0, 16.0, 24.0), (1.0, 1.0, 1.0), (2000.0, 48.0, 0.5)] {
            let result = layout("", w, f, p);
            assert!(result.lines.is_empty());
            assert!((result.total_height - MIN_CANVAS_HEIGHT).abs() < f32::EPSILON);
        }
        assert!((layout("  \n\n ", 750.0, 16.0, 24.0).total_height - 300.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_wrap_breaks_before_overflow() {
        let unit = WrapUnit::new("abcdefghij");
        let lines = wrap_line(&unit, 80.0, &ten_per_char);
        assert_eq!(lines, vec!["abcdefgh", "ij"]);
    }

    #[test]
    fn test_wrap_splits_words() {
        let unit = WrapUnit::new("hello world");
        let lines = wrap_line(&unit, 50.0, &ten_per_char);
        assert_eq!(lines, vec!["hello", " worl", "d"]);
    }

    #[test]
    fn test_oversized_glyph_stays_alone() {
        let wide = |text: &str| if text.contains('W') { 500.0 } else { ten_per_char(text) };
        let unit = WrapUnit::new("aWb");
        let lines = wrap_line(&unit, 80.0, &wide);
        assert_eq!(lines, vec!["a", "W", "b"]);
    }

    #[test]
    fn test_baselines_and_blank_gap() {
        let result = small_engine().layout("abcdefghij\n\nxy", &ten_per_char);
        let texts: Vec<&str> = result.texts().collect();
        assert_eq!(texts, vec!["abcdefgh", "ij", "xy"]);
        assert!((result.lines[0].baseline - 20.0).abs() < 1e-4);
        assert!((result.lines[1].baseline - 36.0).abs() < 1e-4);
        assert!((result.lines[2].baseline - 61.6).abs() < 1e-4);
        assert!((result.total_height - MIN_CANVAS_HEIGHT).abs() < f32::EPSILON);
    }

    #[test]
    fn test_crlf_lines_match_lf_lines() {
        let lf = small_engine().layout("abcdefghij\n\nxy", &ten_per_char);
        let crlf = small_engine().layout("abcdefghij\r\n\r\nxy", &ten_per_char);
        assert_eq!(crlf, lf);
        assert!(crlf.texts().all(|t| !t.contains('\r')));

        let estimated = layout("abc\r\n\r\ndef", 750.0, 16.0, 24.0);
        assert_eq!(estimated.texts().collect::<Vec<_>>(), vec!["abc", "def"]);
    }

    #[test]
    fn test_height_accumulates_past_floor() {
        let text = vec!["x"; 20].join("\n");
        let result = layout(&text, 750.0, 16.0, 24.0);
        // 2 * 24 padding + 20 * 25.6 line height
        assert!((result.total_height - 560.0).abs() < 1e-2);
        assert_eq!(result.line_count(), 20);
    }

    #[test]
    fn test_chars_per_line() {
        let engine = LayoutEngine::new(LayoutParams::new(750.0, 16.0, 24.0));
        // 702 / 8.8 = 79.77
        assert_eq!(engine.chars_per_line(), 79);
        assert_eq!(engine.estimated_line_count(""), 1);
        assert_eq!(engine.estimated_line_count(&"a".repeat(79)), 1);
        assert_eq!(engine.estimated_line_count(&"a".repeat(80)), 2);
        // CJK counts double
        assert_eq!(engine.estimated_line_count(&"中".repeat(40)), 2);
    }

    #[test]
    fn test_degenerate_width_does_not_panic() {
        let engine = LayoutEngine::new(LayoutParams::new(10.0, 16.0, 24.0));
        assert_eq!(engine.chars_per_line(), 1);
        let result = engine.estimate("abc");
        assert_eq!(result.line_count(), 3);
    }

    #[test]
    fn test_estimate_not_below_draw_pass() {
        let engine = LayoutEngine::new(LayoutParams::new(300.0, 16.0, 20.0));
        let text = "中文混排 mixed text 的换行估计需要足够保守 so nothing is clipped\n\n第二段";
        let estimate = engine.estimate(text);
        let drawn = engine.layout(text, &EstimatedMeasure::new(16.0));
        assert!(estimate.total_height >= drawn.total_height);
    }

    proptest! {
        #[test]
        fn prop_draw_lines_fit(text in "[a-zA-Z 中文字、]{0,80}", max in 5.0f32..200.0) {
            let unit = WrapUnit::new(&text);
            let measure = EstimatedMeasure::new(10.0);
            for line in wrap_line(&unit, max, &measure) {
                prop_assert!(measure.measure(&line) <= max || line.chars().count() == 1);
            }
        }

        #[test]
        fn prop_wrap_preserves_characters(text in "\\PC{0,120}", max in 1.0f32..300.0) {
            let unit = WrapUnit::new(&text);
            let joined: String = wrap_line(&unit, max, &EstimatedMeasure::new(12.0)).concat();
            prop_assert_eq!(joined, text);
        }

        #[test]
        fn prop_estimate_at_least_floor(text in "\\PC{0,200}") {
            let result = layout(&text, 750.0, 16.0, 24.0);
            prop_assert!(result.total_height >= MIN_CANVAS_HEIGHT);
        }
    }
}
