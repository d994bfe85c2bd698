//! # mdcard core
//!
//! Text side of the Markdown-to-image card pipeline. Nothing here touches a
//! font or a pixel; the renderer crate supplies those.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 mdcard-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Normalizer        │  Layout Engine         │
//! │  - Table flatten   │  - Display width       │
//! │  - Ordered rules   │  - Greedy char wrap    │
//! │  - Emphasis guard  │  - Height estimate     │
//! ├─────────────────────────────────────────────┤
//! │  Config            │  Analysis / Store      │
//! │  - RenderConfig    │  - Stats, outline      │
//! │  - Color, format   │  - Settings persist    │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod layout;
pub mod normalize;
pub mod store;
pub mod table;
pub mod width;

pub use analysis::{Analysis, DocumentKind, DocumentStats, OutlineEntry, SyntaxReport};
pub use config::{Color, ExportFormat, RenderConfig};
pub use error::{CardError, CardResult};
pub use layout::{layout, LayoutEngine, LayoutLine, LayoutParams, LayoutResult, MIN_CANVAS_HEIGHT};
pub use normalize::{normalize, unify_line_endings, Normalizer, RuleTag, SubstitutionRule};
pub use store::{DirectoryStore, KeyValueStore, MemoryStore, StoreError};
pub use table::TableBlock;
pub use width::{display_width, EstimatedMeasure, TextMeasure, WrapUnit};

/// mdcard core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
