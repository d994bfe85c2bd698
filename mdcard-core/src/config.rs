//! Render configuration and the small value types it is built from.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CardError, CardResult};
use crate::layout::LayoutParams;

/// Default canvas background.
pub const DEFAULT_BACKGROUND: Color = Color::WHITE;

/// Default font size in layout units.
pub const DEFAULT_FONT_SIZE: f32 = 16.0;

/// Default padding in layout units.
pub const DEFAULT_PADDING: f32 = 24.0;

/// Default canvas width in layout units.
pub const DEFAULT_TARGET_WIDTH: f32 = 750.0;

/// Default rasterization scale.
pub const DEFAULT_QUALITY_SCALE: f32 = 6.0;

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 100;

/// Default font family.
pub const DEFAULT_FONT_FAMILY: &str = "sans-serif";

/// Largest pixel dimension an export may have.
pub const DEFAULT_MAX_OUTPUT_DIMENSION: u32 = 16_384;

/// An sRGB colour with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 is opaque).
    pub a: u8,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Dark text colour used on non-black backgrounds (`#1c1c1e`).
    pub const DARK_TEXT: Self = Self::rgb(0x1c, 0x1c, 0x1e);

    /// Opaque colour from channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Whether the colour is `rgb(0, 0, 0)`, regardless of alpha.
    #[must_use]
    pub fn is_black(&self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }

    /// Text colour for this background: white on pure black, dark otherwise.
    #[must_use]
    pub fn text_color(&self) -> Self {
        if self.is_black() {
            Self::WHITE
        } else {
            Self::DARK_TEXT
        }
    }

    /// Alpha as a 0.0-1.0 opacity.
    #[must_use]
    pub fn opacity(&self) -> f32 {
        f32::from(self.a) / 255.0
    }

    /// `#rrggbb` form, dropping alpha.
    #[must_use]
    pub fn to_rgb_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "{}", self.to_rgb_hex())
        } else {
            write!(f, "{}{:02x}", self.to_rgb_hex(), self.a)
        }
    }
}

impl FromStr for Color {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CardError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |i: usize, width: usize| -> CardResult<u8> {
            let digits = hex.get(i * width..(i + 1) * width).ok_or_else(invalid)?;
            let value = u8::from_str_radix(digits, 16).map_err(|_| invalid())?;
            Ok(if width == 1 { value * 17 } else { value })
        };

        match hex.len() {
            3 => Ok(Self::rgb(channel(0, 1)?, channel(1, 1)?, channel(2, 1)?)),
            6 => Ok(Self::rgb(channel(0, 2)?, channel(1, 2)?, channel(2, 2)?)),
            8 => Ok(Self {
                r: channel(0, 2)?,
                g: channel(1, 2)?,
                b: channel(2, 2)?,
                a: channel(3, 2)?,
            }),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = CardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Raster encoding of an exported card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// JPEG, alpha composited over the background.
    #[serde(alias = "jpg")]
    Jpeg,
}

impl ExportFormat {
    /// Conventional file extension.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// MIME type of the encoded bytes.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            other => Err(CardError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Everything needed to turn normalized text into an image.
///
/// Every field has a default, so partial TOML or JSON documents deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Canvas background colour.
    pub background_color: Color,
    /// Font size in layout units.
    pub font_size: f32,
    /// Padding on every side.
    pub padding: f32,
    /// Canvas width in layout units.
    pub target_width: f32,
    /// Output encoding.
    pub export_format: ExportFormat,
    /// Device pixels per layout unit.
    pub quality_scale: f32,
    /// JPEG quality, 1-100. Ignored for PNG.
    pub jpeg_quality: u8,
    /// Font family requested from the font database.
    pub font_family: String,
    /// Extra font files loaded before system fonts are queried.
    pub font_files: Vec<PathBuf>,
    /// Cap on either pixel dimension of the output.
    pub max_output_dimension: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background_color: DEFAULT_BACKGROUND,
            font_size: DEFAULT_FONT_SIZE,
            padding: DEFAULT_PADDING,
            target_width: DEFAULT_TARGET_WIDTH,
            export_format: ExportFormat::default(),
            quality_scale: DEFAULT_QUALITY_SCALE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_files: Vec::new(),
            max_output_dimension: DEFAULT_MAX_OUTPUT_DIMENSION,
        }
    }
}

impl RenderConfig {
    /// Set the background colour.
    #[must_use]
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Set the font size.
    #[must_use]
    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    /// Set the export format.
    #[must_use]
    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.export_format = format;
        self
    }

    /// Set the rasterization scale.
    #[must_use]
    pub fn with_quality_scale(mut self, scale: f32) -> Self {
        self.quality_scale = scale;
        self
    }

    /// Colour used for body text.
    #[must_use]
    pub fn text_color(&self) -> Color {
        self.background_color.text_color()
    }

    /// Layout geometry derived from this configuration.
    #[must_use]
    pub fn layout_params(&self) -> LayoutParams {
        LayoutParams::new(self.target_width, self.font_size, self.padding)
    }

    /// Check that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> CardResult<()> {
        let positive = |name: &str, value: f32| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(CardError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )))
            }
        };

        positive("font_size", self.font_size)?;
        positive("target_width", self.target_width)?;
        positive("quality_scale", self.quality_scale)?;

        if !self.padding.is_finite() || self.padding < 0.0 {
            return Err(CardError::InvalidConfig(format!(
                "padding must be zero or positive, got {}",
                self.padding
            )));
        }
        if self.layout_params().max_width() <= 0.0 {
            return Err(CardError::InvalidConfig(format!(
                "target_width {} leaves no room for text with padding {}",
                self.target_width, self.padding
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(CardError::InvalidConfig(format!(
                "jpeg_quality must be within 1-100, got {}",
                self.jpeg_quality
            )));
        }
        if self.max_output_dimension == 0 {
            return Err(CardError::InvalidConfig(
                "max_output_dimension must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_hex() {
        let c: Color = "#fff".parse().unwrap();
        assert_eq!(c, Color::WHITE);
        let c: Color = "#1a2".parse().unwrap();
        assert_eq!(c, Color::rgb(0x11, 0xaa, 0x22));
    }

    #[test]
    fn test_parse_long_hex_and_alpha() {
        let c: Color = "#1C1C1E".parse().unwrap();
        assert_eq!(c, Color::DARK_TEXT);
        let c: Color = "#00000080".parse().unwrap();
        assert!(c.is_black());
        assert_eq!(c.a, 0x80);
        assert_eq!(c.to_string(), "#00000080");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "fff", "#ff", "#gggggg", "#12345", "#ffééff", "white"] {
            assert!(bad.parse::<Color>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_text_color_rule() {
        assert_eq!(Color::BLACK.text_color(), Color::WHITE);
        assert_eq!(Color::WHITE.text_color(), Color::DARK_TEXT);
        assert_eq!(Color::rgb(0, 0, 1).text_color(), Color::DARK_TEXT);
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!("PNG".parse::<ExportFormat>().unwrap(), ExportFormat::Png);
        assert_eq!("jpg".parse::<ExportFormat>().unwrap(), ExportFormat::Jpeg);
        assert_eq!("jpeg".parse::<ExportFormat>().unwrap(), ExportFormat::Jpeg);
        assert!(matches!(
            "webp".parse::<ExportFormat>(),
            Err(CardError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = RenderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.background_color, Color::WHITE);
        assert_eq!(config.export_format, ExportFormat::Png);
        assert!((config.layout_params().max_width() - 702.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let bad = [
            RenderConfig::default().with_font_size(0.0),
            RenderConfig::default().with_quality_scale(f32::NAN),
            RenderConfig {
                padding: 400.0,
                ..RenderConfig::default()
            },
            RenderConfig {
                jpeg_quality: 0,
                ..RenderConfig::default()
            },
            RenderConfig {
                max_output_dimension: 0,
                ..RenderConfig::default()
            },
        ];
        for config in bad {
            assert!(matches!(
                config.validate(),
                Err(CardError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RenderConfig =
            serde_json::from_str(r##"{"background_color":"#000","export_format":"jpg"}"##)
                .unwrap();
        assert!(config.background_color.is_black());
        assert_eq!(config.export_format, ExportFormat::Jpeg);
        assert!((config.font_size - DEFAULT_FONT_SIZE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bad_color_fails_deserialization() {
        let result: Result<RenderConfig, _> =
            serde_json::from_str(r#"{"background_color":"blue"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_json_roundtrip_keeps_alpha() {
        let config = RenderConfig::default().with_background("#11223344".parse().unwrap());
        let json = serde_json::to_string(&config).unwrap();
        let back: RenderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
