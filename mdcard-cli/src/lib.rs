//! # mdcard
//!
//! Command-line front end: render Markdown into PNG or JPEG image cards.
//!
//! ## Usage
//!
//! ```bash
//! mdcard render notes.md -o notes.png
//! cat notes.md | mdcard render - -o notes.jpg --format jpeg --background '#000'
//! mdcard preview notes.md
//! mdcard inspect notes.md
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `settings::Loader` - Embedded defaults, user TOML, saved settings, flags
//! - `commands` - One function per subcommand
//! - Uses `mdcard-renderer::Exporter` for off-thread rasterization

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

pub mod commands;
pub mod settings;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use config::ConfigError;
use mdcard_core::{Color, ExportFormat};

use crate::settings::Loader;

/// Command-line arguments for mdcard.
#[derive(Debug, Clone, Parser)]
#[command(name = "mdcard")]
#[command(about = "Render Markdown notes into shareable image cards")]
#[command(version)]
pub struct CliArgs {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// mdcard subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Render Markdown to an image file
    Render(RenderArgs),
    /// Print the normalized plain text
    Preview(PreviewArgs),
    /// Print statistics, outline and syntax issues as JSON
    Inspect(InputArgs),
}

/// A Markdown input.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Markdown file, or `-` for stdin
    pub input: PathBuf,
}

/// Arguments for `preview`.
#[derive(Debug, Clone, Args)]
pub struct PreviewArgs {
    /// Markdown file, or `-` for stdin
    pub input: PathBuf,

    /// Show wrapped lines with baselines instead of the plain text
    #[arg(long)]
    pub lines: bool,

    /// Configuration file layered over the defaults
    #[arg(long, env = "MDCARD_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Arguments for `render`.
#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Markdown file, or `-` for stdin
    pub input: PathBuf,

    /// Output image path (default: input name with the format's extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format: png or jpeg
    #[arg(long)]
    pub format: Option<ExportFormat>,

    /// Background colour (#rgb, #rrggbb or #rrggbbaa)
    #[arg(long)]
    pub background: Option<Color>,

    /// Font size in layout units
    #[arg(long)]
    pub font_size: Option<f32>,

    /// Padding in layout units
    #[arg(long)]
    pub padding: Option<f32>,

    /// Canvas width in layout units
    #[arg(long)]
    pub width: Option<f32>,

    /// Device pixels per layout unit
    #[arg(long)]
    pub scale: Option<f32>,

    /// Configuration file layered over the defaults
    #[arg(long, env = "MDCARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory that keeps exported cards and the last used settings
    #[arg(long, env = "MDCARD_STORE")]
    pub store: Option<PathBuf>,

    /// Also print the image as a data URI
    #[arg(long)]
    pub data_uri: bool,
}

impl RenderArgs {
    /// Layer the flags that were given onto `loader`.
    ///
    /// # Errors
    ///
    /// Returns an error if an override key is rejected.
    pub fn apply_overrides(&self, mut loader: Loader) -> Result<Loader, ConfigError> {
        if let Some(format) = self.format {
            loader = loader.set_override("export_format", format.to_string())?;
        }
        if let Some(color) = self.background {
            loader = loader.set_override("background_color", color.to_string())?;
        }
        let numbers = [
            ("font_size", self.font_size),
            ("padding", self.padding),
            ("target_width", self.width),
            ("quality_scale", self.scale),
        ];
        for (key, value) in numbers {
            if let Some(value) = value {
                loader = loader.set_override(key, f64::from(value))?;
            }
        }
        Ok(loader)
    }
}

/// Run the parsed command line.
///
/// # Errors
///
/// Returns an error if the selected command fails.
pub async fn run(args: CliArgs) -> anyhow::Result<()> {
    match args.command {
        Command::Render(args) => commands::render(&args).await,
        Command::Preview(args) => commands::preview(&args),
        Command::Inspect(args) => commands::inspect(&args),
    }
}
