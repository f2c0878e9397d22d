//! Rewrite rule catalogue.
//!
//! Contains the ordered table of regex rewrites that make up the built-in
//! cleaning pipeline.  Each entry carries a short name, a [`RuleCategory`]
//! for reporting, the regex source, and the [`Replacement`] written in place
//! of every match.  Order is significant: earlier rules change what later
//! rules can see.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Broad classification of the noise a rule removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleCategory {
    /// Angle-bracket markup such as `<p>` or `</section>`.
    Markup,
    /// Web addresses starting with `http` or `www`.
    Link,
    /// Email addresses and phone numbers.
    Contact,
    /// Simple `var x = 1;` script fragments.
    Script,
    /// HTML character entities such as `&copy;`.
    Entity,
    /// Runs of a repeated punctuation character.
    Punctuation,
    /// Characters outside the allowed set.
    CharacterFilter,
    /// Runs of whitespace.
    Whitespace,
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Markup => write!(f, "Markup"),
            Self::Link => write!(f, "Link"),
            Self::Contact => write!(f, "Contact"),
            Self::Script => write!(f, "Script"),
            Self::Entity => write!(f, "Entity"),
            Self::Punctuation => write!(f, "Punctuation"),
            Self::CharacterFilter => write!(f, "CharacterFilter"),
            Self::Whitespace => write!(f, "Whitespace"),
        }
    }
}

// ---------------------------------------------------------------------------
// Rule definition
// ---------------------------------------------------------------------------

/// What a rule writes in place of each match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replacement {
    /// Inserted verbatim; `$` has no special meaning.
    Literal(&'static str),
    /// Template expanded against the match's capture groups (`$1`, `$name`).
    Expand(&'static str),
}

/// A single pattern-to-replacement rewrite step.
#[derive(Debug)]
pub struct RewriteRule {
    /// Short, snake_case identifier used in logs and reports.
    pub name: &'static str,
    /// The kind of noise this rule removes.
    pub category: RuleCategory,
    /// A regex string (compiled by [`crate::pipeline::Pipeline`]).
    pub pattern: &'static str,
    /// Replacement applied to every non-overlapping match.
    pub replacement: Replacement,
}

const SPACE: Replacement = Replacement::Literal(" ");

// ---------------------------------------------------------------------------
// Rule catalogue
// ---------------------------------------------------------------------------

/// The built-in rule table, in application order.
///
/// Removal of tags, links, contacts, scripts, entities and phone numbers has
/// to run before the character filter, otherwise `<`, `@`, `&` and digit
/// groups would be reduced to debris instead of a single separator.
///
/// Wherever a rule means "whitespace" it spells out `[\s\x1C-\x1F]`: the
/// ASCII information separators count as whitespace here, `\s` alone skips
/// them.
pub static RULES: &[RewriteRule] = &[
    RewriteRule {
        name: "html_tag",
        category: RuleCategory::Markup,
        pattern: r"<[^>]+>",
        replacement: SPACE,
    },
    RewriteRule {
        name: "url",
        category: RuleCategory::Link,
        pattern: r"http[^\s\x1C-\x1F]+|www[^\s\x1C-\x1F]+",
        replacement: SPACE,
    },
    RewriteRule {
        name: "email",
        category: RuleCategory::Contact,
        pattern: r"[^\s\x1C-\x1F]+@[^\s\x1C-\x1F]+",
        replacement: SPACE,
    },
    RewriteRule {
        name: "script_var",
        category: RuleCategory::Script,
        pattern: r"\bvar\b[\s\x1C-\x1F]*\w*[\s\x1C-\x1F]*=?[\s\x1C-\x1F]*\d*;",
        replacement: SPACE,
    },
    RewriteRule {
        name: "html_entity",
        category: RuleCategory::Entity,
        pattern: r"&\w+;",
        replacement: SPACE,
    },
    RewriteRule {
        name: "phone_number",
        category: RuleCategory::Contact,
        pattern: r"\b\d{3}[-.\s\x1C-\x1F]?\d{3}[-.\s\x1C-\x1F]?\d{4}\b",
        replacement: SPACE,
    },
    // One alternative per character: only runs of the same character
    // collapse, so `?!` survives.
    RewriteRule {
        name: "repeated_punctuation",
        category: RuleCategory::Punctuation,
        pattern: r"!{2,}|\?{2,}|\.{2,}|#{2,}|-{2,}",
        replacement: SPACE,
    },
    RewriteRule {
        name: "disallowed_character",
        category: RuleCategory::CharacterFilter,
        pattern: r#"[^a-zA-Z0-9\s\x1C-\x1F,.!?'"-]"#,
        replacement: SPACE,
    },
    RewriteRule {
        name: "whitespace_run",
        category: RuleCategory::Whitespace,
        pattern: r"[\s\x1C-\x1F]+",
        replacement: SPACE,
    },
];
