//! Font loading and glyph-advance text measurement.
//!
//! Faces come from the same `fontdb` database usvg renders with, so measured
//! widths and painted glyphs agree. Characters the face cannot map fall back to
//! the heuristic column width.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use mdcard_core::width::{char_width, EstimatedMeasure};
use mdcard_core::TextMeasure;
use usvg::fontdb::{Database, Family, Query, ID};

use crate::error::{RenderError, RenderResult};

/// Build a font database from system fonts plus `font_files`.
///
/// # Errors
///
/// Returns [`RenderError::Font`] if any listed file cannot be read.
pub fn load_fonts(font_files: &[PathBuf]) -> RenderResult<Arc<Database>> {
    let mut db = Database::new();
    db.load_system_fonts();
    for path in font_files {
        db.load_font_file(path)
            .map_err(|e| RenderError::Font(format!("{}: {e}", path.display())))?;
    }
    tracing::debug!(faces = db.len(), extra = font_files.len(), "loaded font database");
    Ok(Arc::new(db))
}

/// Map a CSS-style family name onto a fontdb family.
fn family(name: &str) -> Family<'_> {
    match name.trim().to_ascii_lowercase().as_str() {
        "serif" => Family::Serif,
        "sans-serif" => Family::SansSerif,
        "monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(name),
    }
}

/// Text measure backed by real glyph advances.
///
/// Advances are looked up per character and cached; kerning is ignored.
#[derive(Debug)]
pub struct FontMeasure {
    db: Arc<Database>,
    face: Option<ID>,
    font_size: f32,
    advances: RefCell<HashMap<char, Option<f32>>>,
}

impl FontMeasure {
    /// Measure with the face best matching `family_name`, or sans-serif.
    #[must_use]
    pub fn new(db: Arc<Database>, family_name: &str, font_size: f32) -> Self {
        let families = [family(family_name), Family::SansSerif];
        let face = db.query(&Query {
            families: &families,
            ..Query::default()
        });
        if face.is_none() {
            tracing::warn!(
                family = family_name,
                "no matching font face, using estimated widths"
            );
        }
        Self {
            db,
            face,
            font_size,
            advances: RefCell::new(HashMap::new()),
        }
    }

    /// Whether a font face was found.
    #[must_use]
    pub fn has_face(&self) -> bool {
        self.face.is_some()
    }

    /// Font size used for measurement.
    #[must_use]
    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    /// Change the font size. Cached advances are size independent.
    pub fn set_font_size(&mut self, font_size: f32) {
        self.font_size = font_size;
    }

    /// Advance of `ch` as a fraction of the em, `None` if unmapped.
    fn advance_em(&self, ch: char) -> Option<f32> {
        if let Some(cached) = self.advances.borrow().get(&ch) {
            return *cached;
        }
        let advance = self.face.and_then(|id| {
            self.db
                .with_face_data(id, |data, index| {
                    let face = ttf_parser::Face::parse(data, index).ok()?;
                    let glyph = face.glyph_index(ch)?;
                    let units = face.glyph_hor_advance(glyph)?;
                    Some(f32::from(units) / f32::from(face.units_per_em()))
                })
                .flatten()
        });
        self.advances.borrow_mut().insert(ch, advance);
        advance
    }
}

impl TextMeasure for FontMeasure {
    #[allow(clippy::cast_precision_loss)]
    fn measure(&self, text: &str) -> f32 {
        let column = EstimatedMeasure::new(self.font_size).column_width();
        text.chars()
            .map(|ch| {
                self.advance_em(ch).map_or_else(
                    || char_width(ch) as f32 * column,
                    |em| em * self.font_size,
                )
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_database_falls_back_to_estimate() {
        let measure = FontMeasure::new(Arc::new(Database::new()), "sans-serif", 20.0);
        assert!(!measure.has_face());
        let estimate = EstimatedMeasure::new(20.0);
        assert!((measure.measure("ab中") - estimate.measure("ab中")).abs() < 1e-4);
    }

    #[test]
    fn test_font_size_change_rescales() {
        let mut measure = FontMeasure::new(Arc::new(Database::new()), "serif", 10.0);
        let small = measure.measure("hello");
        measure.set_font_size(20.0);
        assert!((measure.measure("hello") - small * 2.0).abs() < 1e-4);
        assert!((measure.font_size() - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_generic_family_names() {
        assert!(matches!(family("Sans-Serif"), Family::SansSerif));
        assert!(matches!(family("monospace"), Family::Monospace));
        assert!(matches!(family("Noto Sans CJK SC"), Family::Name("Noto Sans CJK SC")));
    }

    #[test]
    fn test_missing_font_file_is_an_error() {
        let missing = PathBuf::from("/definitely/not/a/font.ttf");
        assert!(matches!(load_fonts(&[missing]), Err(RenderError::Font(_))));
    }
}
