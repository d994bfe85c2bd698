//! Markdown to styled plain text.
//!
//! The normalizer is an ordered list of regex substitutions interpreted by a
//! simple loop. Each rule sees the output of the rules before it, so the order
//! of [`RULES`] is part of the contract: tables are flattened before emphasis
//! runs, headings are matched from the deepest level up, bold-italic before bold
//! before italic, images before links.
//!
//! The result is lossy by design and re-normalizing already normalized text is
//! not a no-op (bracket markers may be rewritten again).

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::table;

/// Marker framing the start of a fenced code block.
pub const CODE_BLOCK_OPEN: &str = "┌─ 代码块 ─┐";

/// Marker framing the end of a fenced code block.
pub const CODE_BLOCK_CLOSE: &str = "└─────────┘";

/// Leading glyph for heading levels 1 through 6.
pub const HEADING_GLYPHS: [&str; 6] = ["■", "□", "▪", "▫", "▸", "▹"];

/// Length of the divider that replaces horizontal rules.
pub const DIVIDER_WIDTH: usize = 30;

/// Rewrite `\r\n` and lone `\r` line endings as `\n`.
///
/// Line-anchored rules only see `\n` as a line end.
#[must_use]
pub fn unify_line_endings(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Semantic label of a substitution rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleTag {
    /// Pipe tables flattened into `index、header：value` lines.
    Table,
    /// Fenced code blocks.
    CodeBlock,
    /// ATX heading of the given level (1-6).
    Heading(u8),
    /// `***text***`.
    BoldItalic,
    /// `**text**`.
    Bold,
    /// `*text*`.
    Italic,
    /// `__text__`.
    UnderscoreBold,
    /// `_text_`.
    UnderscoreItalic,
    /// `` `code` ``.
    InlineCode,
    /// `![alt](src)`.
    Image,
    /// `[text](href)`.
    Link,
    /// `-`, `*` or `+` list items.
    UnorderedList,
    /// `1.` list items.
    OrderedList,
    /// `>` quotes.
    Blockquote,
    /// `---` style rules.
    HorizontalRule,
    /// `~~text~~`.
    Strikethrough,
    /// Runs of three or more newlines.
    BlankLines,
}

impl RuleTag {
    /// Short machine-readable name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::CodeBlock => "code-block",
            Self::Heading(_) => "heading",
            Self::BoldItalic => "bold-italic",
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::UnderscoreBold => "underscore-bold",
            Self::UnderscoreItalic => "underscore-italic",
            Self::InlineCode => "inline-code",
            Self::Image => "image",
            Self::Link => "link",
            Self::UnorderedList => "unordered-list",
            Self::OrderedList => "ordered-list",
            Self::Blockquote => "blockquote",
            Self::HorizontalRule => "hr",
            Self::Strikethrough => "strikethrough",
            Self::BlankLines => "blank-lines",
        }
    }
}

/// How a rule rewrites its matches.
#[derive(Clone)]
pub enum Replacement {
    /// A regex replacement template (`$1` style).
    Template(String),
    /// A pure function of the match.
    Func(fn(&Captures<'_>) -> String),
}

impl std::fmt::Debug for Replacement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// One step of the normalization pipeline.
#[derive(Debug, Clone)]
pub struct SubstitutionRule {
    pattern: Regex,
    replacement: Replacement,
    tag: RuleTag,
}

impl SubstitutionRule {
    fn template(pattern: &str, template: impl Into<String>, tag: RuleTag) -> Self {
        Self {
            pattern: compile(pattern),
            replacement: Replacement::Template(template.into()),
            tag,
        }
    }

    fn func(pattern: &str, func: fn(&Captures<'_>) -> String, tag: RuleTag) -> Self {
        Self {
            pattern: compile(pattern),
            replacement: Replacement::Func(func),
            tag,
        }
    }

    /// The rule's semantic label.
    #[must_use]
    pub fn tag(&self) -> RuleTag {
        self.tag
    }

    /// The compiled pattern.
    #[must_use]
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Apply the rule to every match in `text`.
    #[must_use]
    pub fn apply(&self, text: &str) -> String {
        match &self.replacement {
            Replacement::Template(template) => self
                .pattern
                .replace_all(text, template.as_str())
                .into_owned(),
            Replacement::Func(func) => self
                .pattern
                .replace_all(text, |caps: &Captures<'_>| func(caps))
                .into_owned(),
        }
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("normalizer patterns are valid")
}

/// Lines the emphasis rules must leave alone: horizontal rules (handled by a
/// later rule) and `*`/`-`/`+` list markers.
const EMPHASIS_GUARD: &str = r"(?m)(?P<keep>^[-*_]{3,}[ \t]*$|^[ \t]*[-*+][ \t]+)";

/// Builds an emphasis pattern whose first alternative is [`EMPHASIS_GUARD`].
fn guarded(pattern: &str) -> String {
    format!("{EMPHASIS_GUARD}|{pattern}")
}

fn bracket_or_keep(caps: &Captures<'_>) -> String {
    match caps.name("keep") {
        Some(kept) => kept.as_str().to_string(),
        None => format!("【{}】", caps.get(2).map_or("", |m| m.as_str())),
    }
}

fn inner_or_keep(caps: &Captures<'_>) -> String {
    match caps.name("keep") {
        Some(kept) => kept.as_str().to_string(),
        None => caps.get(2).map_or("", |m| m.as_str()).to_string(),
    }
}

static FENCE_OPEN: Lazy<Regex> = Lazy::new(|| compile(r"```\w*\n?"));
static FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| compile(r"```$"));

fn code_block(caps: &Captures<'_>) -> String {
    let block = FENCE_OPEN.replace(&caps[0], "");
    let block = FENCE_CLOSE.replace(&block, "");
    format!("{CODE_BLOCK_OPEN}\n{}\n{CODE_BLOCK_CLOSE}\n", block.trim())
}

/// The pipeline, in application order.
pub static RULES: Lazy<Vec<SubstitutionRule>> = Lazy::new(|| {
    let mut rules = vec![
        SubstitutionRule::func(table::TABLE_BLOCK.as_str(), table::replace_block, RuleTag::Table),
        SubstitutionRule::func(r"```[\s\S]*?```", code_block, RuleTag::CodeBlock),
    ];

    for level in (1..=6u8).rev() {
        let depth = usize::from(level);
        let glyph = HEADING_GLYPHS[depth - 1];
        rules.push(SubstitutionRule::template(
            &format!(r"(?m)^#{{{depth}}}[ \t]+(.+)$"),
            format!("{}{glyph} $1", " ".repeat(depth)),
            RuleTag::Heading(level),
        ));
    }

    rules.extend([
        SubstitutionRule::func(
            &guarded(r"\*\*\*(.*?)\*\*\*"),
            bracket_or_keep,
            RuleTag::BoldItalic,
        ),
        SubstitutionRule::func(&guarded(r"\*\*(.*?)\*\*"), bracket_or_keep, RuleTag::Bold),
        SubstitutionRule::func(&guarded(r"\*(.*?)\*"), inner_or_keep, RuleTag::Italic),
        SubstitutionRule::func(&guarded(r"__(.*?)__"), bracket_or_keep, RuleTag::UnderscoreBold),
        SubstitutionRule::func(&guarded(r"_(.*?)_"), inner_or_keep, RuleTag::UnderscoreItalic),
        SubstitutionRule::template(r"`(.*?)`", "[$1]", RuleTag::InlineCode),
        SubstitutionRule::template(r"!\[([^\]]*)\]\([^)]+\)", "[图片: $1]", RuleTag::Image),
        SubstitutionRule::template(r"\[([^\]]+)\]\([^)]+\)", "$1", RuleTag::Link),
        SubstitutionRule::template(r"(?m)^[ \t]*[-*+][ \t]+(.+)$", "• $1", RuleTag::UnorderedList),
        SubstitutionRule::template(r"(?m)^[ \t]*\d+\.[ \t]+(.+)$", "• $1", RuleTag::OrderedList),
        SubstitutionRule::template(r"(?m)^>[ \t]*(.+)$", "❝ $1", RuleTag::Blockquote),
        SubstitutionRule::template(
            r"(?m)^[-*_]{3,}[ \t]*$",
            "─".repeat(DIVIDER_WIDTH),
            RuleTag::HorizontalRule,
        ),
        SubstitutionRule::template(r"~~(.*?)~~", "$1", RuleTag::Strikethrough),
        SubstitutionRule::template(r"\n{3,}", "\n\n", RuleTag::BlankLines),
    ]);

    rules
});

/// Interpreter over the ordered rule list.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    rules: &'static [SubstitutionRule],
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// A normalizer over the standard rule list.
    #[must_use]
    pub fn new() -> Self {
        Self { rules: &RULES }
    }

    /// The rules in application order.
    #[must_use]
    pub fn rules(&self) -> &[SubstitutionRule] {
        self.rules
    }

    /// Run every rule, then trim surrounding whitespace.
    #[must_use]
    pub fn normalize(&self, text: &str) -> String {
        let out = self
            .rules
            .iter()
            .fold(unify_line_endings(text).into_owned(), |acc, rule| {
                rule.apply(&acc)
            });
        let out = out.trim().to_string();
        tracing::debug!(
            input_bytes = text.len(),
            output_bytes = out.len(),
            "normalized markdown"
        );
        out
    }

    /// Run the rules up to and including the first rule tagged `tag`.
    ///
    /// No trimming is applied. Useful for inspecting intermediate stages.
    #[must_use]
    pub fn apply_until(&self, text: &str, tag: RuleTag) -> String {
        let mut out = unify_line_endings(text).into_owned();
        for rule in self.rules {
            out = rule.apply(&out);
            if rule.tag == tag {
                break;
            }
        }
        out
    }
}

/// Normalize `text` with the standard rule list.
#[must_use]
pub fn normalize(text: &str) -> String {
    Normalizer::new().normalize(text)
}
