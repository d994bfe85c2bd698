//! Pipe-table flattening.
//!
//! Image cards have no room for grid layout, so each data row of a pipe table
//! becomes a numbered list of `header：value` lines:
//!
//! ```text
//! | Name | Age |          1、Name：Ann
//! |------|-----|   ==>    2、Age：30
//! | Ann  | 30  |
//! ```
//!
//! Cell contents are cleaned of inline markup here, before the table is
//! replaced with plain lines, because the global emphasis and link rules would
//! otherwise re-tokenize the flattened output.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// A maximal run of lines that start and end with a pipe.
pub(crate) static TABLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(?:^\|.+\|[ \t]*$\n?)+").expect("valid table block regex"));

/// Inline cleanup applied to every cell, in order.
static CELL_CLEANUP: Lazy<[(Regex, &'static str); 4]> = Lazy::new(|| {
    [
        (Regex::new(r"\*\*(.*?)\*\*").expect("valid regex"), "$1"),
        (Regex::new(r"\*(.*?)\*").expect("valid regex"), "$1"),
        (Regex::new(r"`(.*?)`").expect("valid regex"), "$1"),
        (
            Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid regex"),
            "$1",
        ),
    ]
});

/// Cells made only of dashes, colons and whitespace.
static SEPARATOR_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-:\s]*$").expect("valid separator regex"));

/// Classification of a single table line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRow {
    /// Alignment row such as `|---|:--:|`.
    Separator,
    /// A row with at least one meaningful cell.
    Cells(Vec<String>),
    /// A row with nothing but blanks or separator punctuation.
    Invalid,
}

/// A parsed table: header cells plus data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableBlock {
    /// Header cells, from the first valid row.
    pub header: Vec<String>,
    /// Remaining valid rows.
    pub rows: Vec<Vec<String>>,
}

impl TableBlock {
    /// Parse the lines of one table run.
    #[must_use]
    pub fn parse(block: &str) -> Self {
        let mut table = Self::default();
        for line in block.trim().lines() {
            match classify_row(line) {
                TableRow::Cells(cells) if table.header.is_empty() => table.header = cells,
                TableRow::Cells(cells) => table.rows.push(cells),
                TableRow::Separator | TableRow::Invalid => {}
            }
        }
        table
    }

    /// Whether the table can be flattened (has a header and data).
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        !self.header.is_empty() && !self.rows.is_empty()
    }

    /// Flatten into `index、header：value` lines, one group per data row.
    ///
    /// Returns an empty string when the table has no header or no data rows.
    #[must_use]
    pub fn flatten(&self) -> String {
        if !self.is_renderable() {
            return String::new();
        }

        let mut out = String::new();
        for (row_index, row) in self.rows.iter().enumerate() {
            if row_index > 0 {
                out.push('\n');
            }
            for (col, (header, cell)) in self.header.iter().zip(row).enumerate() {
                if header.trim().is_empty() {
                    continue;
                }
                out.push_str(&format!("{}、{header}：{cell}\n", col + 1));
            }
        }
        out.push('\n');
        out
    }
}

/// Classify one raw table line.
#[must_use]
pub fn classify_row(line: &str) -> TableRow {
    let line = line.trim();
    if line.is_empty() || !line.starts_with('|') || !line.ends_with('|') {
        return TableRow::Invalid;
    }
    if is_separator_line(line) {
        return TableRow::Separator;
    }

    let cells = split_cells(line)
        .into_iter()
        .map(clean_cell)
        .collect::<Vec<_>>();
    if is_valid_row(&cells) {
        TableRow::Cells(cells)
    } else {
        TableRow::Invalid
    }
}

/// A separator line has only non-empty cells of `-`, `:` and spaces.
#[must_use]
pub fn is_separator_line(line: &str) -> bool {
    split_cells(line.trim()).iter().all(|cell| {
        let trimmed = cell.trim();
        !trimmed.is_empty() && SEPARATOR_CELL.is_match(trimmed)
    })
}

fn is_valid_row(cells: &[String]) -> bool {
    cells.iter().any(|cell| {
        let trimmed = cell.trim();
        !trimmed.is_empty() && !SEPARATOR_CELL.is_match(trimmed)
    })
}

fn split_cells(line: &str) -> Vec<&str> {
    let inner = line.strip_prefix('|').unwrap_or(line);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').collect()
}

fn clean_cell(cell: &str) -> String {
    CELL_CLEANUP
        .iter()
        .fold(cell.trim().to_string(), |acc, (pattern, replacement)| {
            pattern.replace_all(&acc, *replacement).into_owned()
        })
}

/// Flatten the table run captured by [`TABLE_BLOCK`].
pub(crate) fn replace_block(caps: &Captures<'_>) -> String {
    TableBlock::parse(&caps[0]).flatten()
}

/// Replace every pipe table in `text` with its flattened listing.
#[must_use]
pub fn transform(text: &str) -> String {
    let mut tables = 0usize;
    let out = TABLE_BLOCK.replace_all(text, |caps: &Captures<'_>| {
        tables += 1;
        replace_block(caps)
    });
    if tables > 0 {
        tracing::debug!(tables, "flattened pipe tables");
    }
    out.into_owned()
}
