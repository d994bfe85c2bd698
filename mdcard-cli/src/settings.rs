//! Layered render configuration.
//!
//! Sources, lowest precedence first: the embedded defaults, a user TOML file,
//! settings remembered in a store, then individual overrides from flags.

use std::path::Path;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use mdcard_core::RenderConfig;

/// Built-in defaults, mirrored by `RenderConfig::default()`.
pub const DEFAULT_TOML: &str = include_str!("../defaults/mdcard.default.toml");

/// Stack of configuration sources that resolves to a [`RenderConfig`].
///
/// Later layers win key by key, so a layer only needs the keys it changes.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
    layers: usize,
}

impl Loader {
    /// Card defaults only.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml)),
            layers: 1,
        }
    }

    /// Add a user TOML file on top. The file must exist when [`Loader::build`]
    /// runs.
    #[must_use]
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        let card_file = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.push(card_file)
    }

    /// Add the JSON written by `save_settings` on top.
    #[must_use]
    pub fn with_saved(self, json: &str) -> Self {
        self.push(File::from_str(json, FileFormat::Json))
    }

    /// Pin one key, above every file layer.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is not a valid configuration path.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Merge the layers into a [`RenderConfig`].
    ///
    /// # Errors
    ///
    /// Fails when a file is missing or unreadable, or a value does not fit its
    /// field (bad colour, unknown format, wrong type).
    pub fn build(self) -> Result<RenderConfig, ConfigError> {
        tracing::debug!(layers = self.layers, "resolving render config");
        self.builder.build()?.try_deserialize()
    }

    fn push<S>(mut self, source: S) -> Self
    where
        S: config::Source + Send + Sync + 'static,
    {
        self.builder = self.builder.add_source(source);
        self.layers += 1;
        self
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdcard_core::{Color, ExportFormat};
    use std::io::Write;

    #[test]
    fn test_embedded_defaults_match_code_defaults() {
        assert_eq!(Loader::new().build().unwrap(), RenderConfig::default());
    }

    #[test]
    fn test_file_layer_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "background_color = \"#000\"\nexport_format = \"jpg\"\nfont_size = 20").unwrap();

        let config = Loader::new().with_file(file.path()).build().unwrap();
        assert_eq!(config.background_color, Color::BLACK);
        assert_eq!(config.export_format, ExportFormat::Jpeg);
        assert!((config.font_size - 20.0).abs() < f32::EPSILON);
        assert!((config.padding - 24.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_layers_stack_in_order() {
        let loader = Loader::new().with_saved("{\"padding\": 4}");
        assert_eq!(loader.layers, 2);
        let config = loader
            .with_saved("{\"padding\": 6}")
            .build()
            .unwrap();
        assert!((config.padding - 6.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = Loader::new()
            .with_file("/definitely/not/here.toml")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_saved_settings_then_override() {
        let saved = serde_json::to_string(&RenderConfig::default().with_font_size(30.0)).unwrap();
        let config = Loader::new()
            .with_saved(&saved)
            .set_override("padding", 8.0)
            .unwrap()
            .build()
            .unwrap();
        assert!((config.font_size - 30.0).abs() < f32::EPSILON);
        assert!((config.padding - 8.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bad_color_is_rejected() {
        let result = Loader::new()
            .set_override("background_color", "teal")
            .unwrap()
            .build();
        assert!(result.is_err());
    }
}
