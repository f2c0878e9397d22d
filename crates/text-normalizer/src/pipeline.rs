//! Compiled rewrite pipeline that runs a rule table over a string, one rule
//! after another.

use std::borrow::Cow;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::rules::{Replacement, RewriteRule, RULES};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while constructing a [`Pipeline`].
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to compile rule '{rule}': {source}")]
    RegexCompile {
        rule: &'static str,
        #[source]
        source: regex::Error,
    },
}

// ---------------------------------------------------------------------------
// RuleHit
// ---------------------------------------------------------------------------

/// How many replacements a single rule made during one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleHit {
    /// The `name` field of the [`RewriteRule`] that fired.
    pub rule: String,
    /// Human-readable category string (e.g. `"Contact"`).
    pub category: String,
    /// Number of matches replaced by different text.
    pub replacements: usize,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

struct CompiledRule {
    rule: &'static RewriteRule,
    regex: Regex,
}

impl CompiledRule {
    /// Replace every match of this rule in `text`, returning the rewritten
    /// text and the number of matches whose replacement differs from the
    /// matched text.  Borrowed output means nothing matched.
    fn rewrite<'t>(&self, text: &'t str) -> (Cow<'t, str>, usize) {
        let mut replacements = 0;
        let rewritten = match self.rule.replacement {
            Replacement::Literal(literal) => {
                self.regex.replace_all(text, |caps: &Captures<'_>| {
                    // A lone space rewritten to a space is not a change.
                    if &caps[0] != literal {
                        replacements += 1;
                    }
                    literal
                })
            }
            Replacement::Expand(template) => {
                self.regex.replace_all(text, |caps: &Captures<'_>| {
                    replacements += 1;
                    let mut dst = String::new();
                    caps.expand(template, &mut dst);
                    dst
                })
            }
        };
        (rewritten, replacements)
    }
}

/// An ordered sequence of compiled rules followed by a final trim.
///
/// The pipeline holds no per-call state; a single instance can serve any
/// number of callers, including concurrently.
pub struct Pipeline {
    rules: Vec<CompiledRule>,
}

impl Pipeline {
    /// Compile the built-in [`RULES`] table.
    pub fn new() -> Result<Self, PipelineError> {
        Self::with_rules(RULES)
    }

    /// Compile a custom rule table.  Rules run in slice order.
    pub fn with_rules(rules: &'static [RewriteRule]) -> Result<Self, PipelineError> {
        let rules = rules
            .iter()
            .map(|rule| {
                Regex::new(rule.pattern)
                    .map(|regex| CompiledRule { rule, regex })
                    .map_err(|source| PipelineError::RegexCompile {
                        rule: rule.name,
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules })
    }

    /// Run every rule over `text` in order and trim the result.
    pub fn apply(&self, text: &str) -> String {
        self.run(text, |_, _| {})
    }

    /// Like [`apply`](Self::apply), but also returns one [`RuleHit`] for each
    /// rule that changed the text, in pipeline order.
    pub fn apply_with_hits(&self, text: &str) -> (String, Vec<RuleHit>) {
        let mut hits = Vec::new();
        let output = self.run(text, |rule, replacements| {
            hits.push(RuleHit {
                rule: rule.name.to_string(),
                category: rule.category.to_string(),
                replacements,
            });
        });
        (output, hits)
    }

    /// Returns the number of rules in the pipeline.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Rule names in application order.
    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|compiled| compiled.rule.name)
    }

    fn run<F>(&self, text: &str, mut on_hit: F) -> String
    where
        F: FnMut(&'static RewriteRule, usize),
    {
        let mut working = text.to_owned();

        for compiled in &self.rules {
            let (rewritten, replacements) = compiled.rewrite(&working);
            if let Cow::Owned(next) = rewritten {
                working = next;
            }
            if replacements > 0 {
                on_hit(compiled.rule, replacements);
            }
        }

        working.trim().to_owned()
    }
}
