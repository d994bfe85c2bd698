//! Document statistics, heading outline and lightweight syntax checks.
//!
//! None of this affects rendering; it backs the `inspect` command and the
//! metadata attached to an export.

use std::ops::RangeInclusive;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Ideographs counted as CJK characters for reading time.
const CJK_COUNTED: RangeInclusive<char> = '\u{4E00}'..='\u{9FA5}';

/// CJK characters read per minute.
const CJK_PER_MINUTE: f64 = 300.0;

/// English words read per minute.
const WORDS_PER_MINUTE: f64 = 200.0;

static HEADING_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(#{1,6})[ \t]+(.*)$").expect("valid heading regex"));
static LIST_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:[-*+]|\d+\.)[ \t]+").expect("valid list regex")
});
static CODE_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```.*?```|`[^`\n]+`").expect("valid code regex"));
static QUOTE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^>[ \t]+").expect("valid quote regex"));
static UNCLOSED_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)\[[^\]\n]*\]\([^)\n]*$").expect("valid link regex"));

/// Counts describing a block of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Whitespace-separated tokens.
    pub word_count: usize,
    /// Unicode scalar values.
    pub char_count: usize,
    /// Characters in U+4E00..=U+9FA5.
    pub cjk_count: usize,
    /// Tokens made only of ASCII letters.
    pub english_words: usize,
    /// Non-blank lines.
    pub line_count: usize,
    /// Estimated reading time, at least one minute.
    pub read_minutes: u32,
    /// Whether the text is blank.
    pub is_empty: bool,
}

/// Compute statistics for `text`.
#[must_use]
pub fn stats(text: &str) -> DocumentStats {
    let cjk_count = text.chars().filter(|c| CJK_COUNTED.contains(c)).count();
    let english_words = text
        .split_whitespace()
        .filter(|word| word.chars().all(|c| c.is_ascii_alphabetic()))
        .count();

    DocumentStats {
        word_count: text.split_whitespace().count(),
        char_count: text.chars().count(),
        cjk_count,
        english_words,
        line_count: text.lines().filter(|l| !l.trim().is_empty()).count(),
        read_minutes: read_minutes(cjk_count, english_words),
        is_empty: text.trim().is_empty(),
    }
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn read_minutes(cjk: usize, english: usize) -> u32 {
    let minutes = cjk as f64 / CJK_PER_MINUTE + english as f64 / WORDS_PER_MINUTE;
    (minutes.ceil() as u32).max(1)
}

/// One heading in the outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Heading level, 1-6.
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// URL fragment derived from the title.
    pub anchor: String,
}

/// ATX headings of `markdown` in document order.
#[must_use]
pub fn outline(markdown: &str) -> Vec<OutlineEntry> {
    HEADING_LINE
        .captures_iter(markdown)
        .map(|caps| {
            let title = caps[2].trim().to_string();
            OutlineEntry {
                level: u8::try_from(caps[1].len()).unwrap_or(6),
                anchor: anchor(&title),
                title,
            }
        })
        .collect()
}

/// Lowercased slug: ASCII word characters, CJK ideographs (U+4E00..=U+9FA5)
/// and hyphens kept, whitespace runs become a single hyphen, everything else
/// dropped.
#[must_use]
pub fn anchor(title: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for ch in title.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_whitespace() || ch == '-' {
            pending_dash = true;
        } else if ch.is_ascii_alphanumeric() || ch == '_' || CJK_COUNTED.contains(&ch) {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        }
    }
    slug
}

/// Severity of a [`SyntaxIssue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Output will likely be wrong.
    Error,
    /// Output may look odd.
    Warning,
}

/// A problem found by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxIssue {
    /// How serious the issue is.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// 1-based line the issue was found on, when known.
    pub line: Option<usize>,
}

/// Result of a syntax check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxReport {
    /// Issues in the order they were found.
    pub issues: Vec<SyntaxIssue>,
}

impl SyntaxReport {
    /// Whether no error-level issue was found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Error-level issues.
    pub fn errors(&self) -> impl Iterator<Item = &SyntaxIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    /// Warning-level issues.
    pub fn warnings(&self) -> impl Iterator<Item = &SyntaxIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    fn push(&mut self, severity: Severity, message: impl Into<String>, line: Option<usize>) {
        self.issues.push(SyntaxIssue {
            severity,
            message: message.into(),
            line,
        });
    }
}

/// Check `markdown` for unbalanced fences, stray backticks and cut-off links.
#[must_use]
pub fn validate(markdown: &str) -> SyntaxReport {
    let mut report = SyntaxReport::default();

    let fences = markdown.matches("```").count();
    if fences % 2 != 0 {
        let line = markdown
            .lines()
            .enumerate()
            .filter(|(_, l)| l.contains("```"))
            .map(|(i, _)| i + 1)
            .last();
        report.push(Severity::Error, "unclosed code block", line);
    }

    let inline_ticks = markdown.replace("```", "").matches('`').count();
    if inline_ticks % 2 != 0 {
        report.push(Severity::Warning, "possibly unclosed inline code", None);
    }

    for m in UNCLOSED_LINK.find_iter(markdown) {
        let line = markdown[..m.start()].matches('\n').count() + 1;
        report.push(Severity::Error, "malformed link", Some(line));
    }

    if !report.issues.is_empty() {
        tracing::debug!(issues = report.issues.len(), "markdown syntax issues");
    }
    report
}

/// Coarse classification of a Markdown document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Blank input.
    Empty,
    /// Headings and code.
    Technical,
    /// Headings and lists.
    Structured,
    /// Block quotes without the above.
    Article,
    /// Headings only.
    Document,
    /// None of the above.
    Plain,
}

/// Classify `markdown` by the constructs it uses.
#[must_use]
pub fn detect_kind(markdown: &str) -> DocumentKind {
    if markdown.trim().is_empty() {
        return DocumentKind::Empty;
    }
    let headers = HEADING_LINE.is_match(markdown);
    let code = CODE_SPAN.is_match(markdown);
    let lists = LIST_LINE.is_match(markdown);
    let quotes = QUOTE_LINE.is_match(markdown);

    match (headers, code, lists, quotes) {
        (true, true, _, _) => DocumentKind::Technical,
        (true, _, true, _) => DocumentKind::Structured,
        (_, _, _, true) => DocumentKind::Article,
        (true, _, _, _) => DocumentKind::Document,
        _ => DocumentKind::Plain,
    }
}

/// Everything `inspect` reports about a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Statistics of the normalized text.
    pub stats: DocumentStats,
    /// Heading outline of the source.
    pub outline: Vec<OutlineEntry>,
    /// Syntax check of the source.
    pub report: SyntaxReport,
    /// Document classification.
    pub kind: DocumentKind,
}

impl Analysis {
    /// Analyse `markdown`; statistics are taken over its normalized form.
    #[must_use]
    pub fn of(markdown: &str) -> Self {
        let markdown = crate::normalize::unify_line_endings(markdown);
        let plain = crate::normalize::normalize(&markdown);
        Self {
            stats: stats(&plain),
            outline: outline(&markdown),
            report: validate(&markdown),
            kind: detect_kind(&markdown),
        }
    }
}
