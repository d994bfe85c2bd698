//! Subcommand implementations.

use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use mdcard_core::store::{save_settings, SETTINGS_KEY};
use mdcard_core::{
    normalize, Analysis, DirectoryStore, ExportFormat, KeyValueStore, LayoutEngine, RenderConfig,
};
use mdcard_renderer::Exporter;

use crate::settings::Loader;
use crate::{InputArgs, PreviewArgs, RenderArgs};

/// Read Markdown from a file, or from stdin when `path` is `-`.
///
/// # Errors
///
/// Returns an error if the input cannot be read as UTF-8.
pub fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut markdown = String::new();
        std::io::stdin()
            .read_to_string(&mut markdown)
            .context("Failed to read Markdown from stdin")?;
        return Ok(markdown);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Output path used when `-o` is not given.
#[must_use]
pub fn default_output(input: &Path, format: ExportFormat) -> PathBuf {
    let stem = if input == Path::new("-") {
        None
    } else {
        input.file_stem()
    };
    PathBuf::from(stem.unwrap_or_else(|| OsStr::new("card"))).with_extension(format.extension())
}

fn load_config(
    loader: Loader,
    file: Option<&PathBuf>,
    store: Option<&DirectoryStore>,
) -> anyhow::Result<Loader> {
    let mut loader = loader;
    if let Some(path) = file {
        loader = loader.with_file(path);
    }
    if let Some(store) = store {
        if let Some(saved) = store.get(SETTINGS_KEY)? {
            let json = String::from_utf8(saved).context("Saved settings are not UTF-8")?;
            tracing::debug!(root = %store.root().display(), "layering saved settings");
            loader = loader.with_saved(&json);
        }
    }
    Ok(loader)
}

/// `mdcard render`.
///
/// # Errors
///
/// Returns an error if configuration, rendering or writing the output fails.
pub async fn render(args: &RenderArgs) -> anyhow::Result<()> {
    let markdown = read_input(&args.input)?;

    let store = args
        .store
        .as_ref()
        .map(DirectoryStore::open)
        .transpose()
        .context("Failed to open store directory")?;

    let loader = load_config(Loader::new(), args.config.as_ref(), store.as_ref())?;
    let config: RenderConfig = args
        .apply_overrides(loader)?
        .build()
        .context("Invalid configuration")?;
    config.validate()?;

    let exporter = Exporter::for_config(&config)?;
    let image = exporter.export(markdown, config.clone()).await?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input, config.export_format));
    std::fs::write(&output, &image.bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    tracing::info!(path = %output.display(), "wrote card");

    if let Some(store) = &store {
        let key = output
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("card");
        store.set(key, &image.bytes)?;
        save_settings(store, &config)?;
    }

    println!("{}", serde_json::to_string(&image.info())?);
    if args.data_uri {
        println!("{}", image.to_data_uri());
    }
    Ok(())
}

/// `mdcard preview`.
///
/// # Errors
///
/// Returns an error if the input or configuration cannot be read.
pub fn preview(args: &PreviewArgs) -> anyhow::Result<()> {
    let markdown = read_input(&args.input)?;
    let text = normalize(&markdown);

    if !args.lines {
        println!("{text}");
        return Ok(());
    }

    let config = load_config(Loader::new(), args.config.as_ref(), None)?
        .build()
        .context("Invalid configuration")?;
    config.validate()?;
    let layout = LayoutEngine::new(config.layout_params()).estimate(&text);
    for line in &layout.lines {
        println!("{:>8.1}  {}", line.baseline, line.text);
    }
    println!("height: {:.1}", layout.total_height);
    Ok(())
}

/// `mdcard inspect`.
///
/// # Errors
///
/// Returns an error if the input cannot be read.
pub fn inspect(args: &InputArgs) -> anyhow::Result<()> {
    let markdown = read_input(&args.input)?;
    let analysis = Analysis::of(&markdown);
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_names() {
        assert_eq!(
            default_output(Path::new("notes/today.md"), ExportFormat::Png),
            PathBuf::from("today.png")
        );
        assert_eq!(
            default_output(Path::new("-"), ExportFormat::Jpeg),
            PathBuf::from("card.jpg")
        );
    }

    #[test]
    fn test_read_missing_file_has_context() {
        let err = read_input(Path::new("/no/such/file.md")).unwrap_err();
        assert!(err.to_string().contains("/no/such/file.md"));
    }

    #[test]
    fn test_saved_settings_are_layered() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::open(dir.path()).unwrap();
        save_settings(&store, &RenderConfig::default().with_font_size(22.0)).unwrap();

        let config = load_config(Loader::new(), None, Some(&store))
            .unwrap()
            .build()
            .unwrap();
        assert!((config.font_size - 22.0).abs() < f32::EPSILON);
    }
}
