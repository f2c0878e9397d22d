//! # text-normalizer
//!
//! Strips markup, links, contact details, script fragments and noisy
//! punctuation from free text with a fixed, ordered sequence of regex
//! rewrites.
//!
//! The crate is organised around three layers:
//!
//! 1. **[`rules`]** -- static, ordered catalogue of rewrite rules, each tagged
//!    with a [`RuleCategory`](rules::RuleCategory).
//! 2. **[`pipeline`]** -- compiles a rule table and applies it left to right,
//!    optionally counting replacements as [`RuleHit`](pipeline::RuleHit)s.
//! 3. **[`normalizer`]** -- the public entry point returning either the
//!    cleaned string or a [`CleanReport`](normalizer::CleanReport).
//!
//! Every built-in pattern runs on the `regex` crate's linear-time engine, so
//! cleaning cost stays proportional to input length.
//!
//! ## Quick start
//!
//! ```rust
//! assert_eq!(
//!     text_normalizer::clean("visit https://x.com or a@b.com now"),
//!     "visit or now"
//! );
//! ```

use std::sync::LazyLock;

pub mod normalizer;
pub mod pipeline;
pub mod rules;

pub use normalizer::{CleanReport, Normalizer};
pub use pipeline::{Pipeline, PipelineError, RuleHit};
pub use rules::{Replacement, RewriteRule, RuleCategory, RULES};

static DEFAULT_NORMALIZER: LazyLock<Normalizer> = LazyLock::new(Normalizer::default);

/// Clean `text` with the built-in rules.
///
/// The rules are compiled on first use and shared by every later call.
pub fn clean(text: &str) -> String {
    DEFAULT_NORMALIZER.clean(text)
}
