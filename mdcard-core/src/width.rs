//! Display-width estimation for mixed Latin/CJK text.
//!
//! Widths here are a wrapping heuristic, not glyph metrics: every character in
//! the CJK unified ideograph block or the halfwidth/fullwidth forms block counts
//! as two columns, everything else as one. Proportional Latin fonts and CJK
//! punctuation outside those blocks are a known source of error.

use std::ops::RangeInclusive;

/// CJK unified ideographs.
const CJK_IDEOGRAPHS: RangeInclusive<char> = '\u{4E00}'..='\u{9FFF}';

/// Halfwidth and fullwidth forms.
const FULLWIDTH_FORMS: RangeInclusive<char> = '\u{FF00}'..='\u{FFEF}';

/// Average advance of a one-column glyph as a fraction of the font size.
pub const DEFAULT_EM_RATIO: f32 = 0.55;

/// Returns `true` for characters that occupy two display columns.
#[must_use]
pub fn is_wide(ch: char) -> bool {
    CJK_IDEOGRAPHS.contains(&ch) || FULLWIDTH_FORMS.contains(&ch)
}

/// Display width of a single character (1 or 2).
#[must_use]
pub fn char_width(ch: char) -> u32 {
    if is_wide(ch) {
        2
    } else {
        1
    }
}

/// Display width of a string, the sum of its character widths.
#[must_use]
pub fn display_width(text: &str) -> u32 {
    text.chars().map(char_width).sum()
}

/// Anything that can report the rendered width of a string.
///
/// The layout engine is written against this trait so the same wrapping code
/// runs with the heuristic estimator (sizing) and with a real surface (drawing).
pub trait TextMeasure {
    /// Width of `text` in layout units.
    fn measure(&self, text: &str) -> f32;
}

impl<F> TextMeasure for F
where
    F: Fn(&str) -> f32,
{
    fn measure(&self, text: &str) -> f32 {
        self(text)
    }
}

/// Heuristic measure: `display_width × font_size × em_ratio`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatedMeasure {
    /// Font size in layout units.
    pub font_size: f32,
    /// Advance of a single column relative to the font size.
    pub em_ratio: f32,
}

impl EstimatedMeasure {
    /// Estimator for `font_size` with the default column ratio.
    #[must_use]
    pub fn new(font_size: f32) -> Self {
        Self {
            font_size,
            em_ratio: DEFAULT_EM_RATIO,
        }
    }

    /// Width of one display column.
    #[must_use]
    pub fn column_width(&self) -> f32 {
        self.font_size * self.em_ratio
    }
}

impl TextMeasure for EstimatedMeasure {
    #[allow(clippy::cast_precision_loss)]
    fn measure(&self, text: &str) -> f32 {
        display_width(text) as f32 * self.column_width()
    }
}

/// One character of a wrap unit together with its estimated width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    /// The character.
    pub ch: char,
    /// Its display width (1 or 2).
    pub display_width: u32,
}

/// A single input line decomposed into glyphs, ready for line breaking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapUnit<'a> {
    source: &'a str,
    glyphs: Vec<Glyph>,
}

impl<'a> WrapUnit<'a> {
    /// Decompose `line` into glyph records.
    #[must_use]
    pub fn new(line: &'a str) -> Self {
        let glyphs = line
            .chars()
            .map(|ch| Glyph {
                ch,
                display_width: char_width(ch),
            })
            .collect();
        Self {
            source: line,
            glyphs,
        }
    }

    /// The original line.
    #[must_use]
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Glyphs in source order.
    #[must_use]
    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    /// Total display width of the unit.
    #[must_use]
    pub fn display_width(&self) -> u32 {
        self.glyphs.iter().map(|g| g.display_width).sum()
    }

    /// Whether the line is blank (empty or whitespace only).
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.glyphs.iter().all(|g| g.ch.is_whitespace())
    }
}
