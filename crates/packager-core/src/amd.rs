//! Textual naming of anonymous AMD definitions
//!
//! `define([...], ...)`, `define({...})` and `define(function ...)` become
//! `define('<id>', ...)`. This is plain pattern substitution over the source
//! text: every match is rewritten, including ones inside strings or
//! comments, and already named definitions (`define('x', ...)`) are left
//! alone because a quote never matches the pattern.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

/// Factory name used by the default rewriter
pub const DEFAULT_FACTORY: &str = "define";

static DEFINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| factory_pattern(DEFAULT_FACTORY));

fn factory_pattern(factory: &str) -> Regex {
    let pattern = format!(r"{}\((\[|\{{|function)", regex::escape(factory));
    Regex::new(&pattern).expect("factory pattern is built from an escaped literal")
}

/// Rewrites anonymous factory calls into named ones
#[derive(Debug, Clone)]
pub struct AmdRewriter {
    factory: String,
    pattern: Regex,
}

impl AmdRewriter {
    /// Rewriter for a custom factory function name
    pub fn new(factory: impl Into<String>) -> Self {
        let factory = factory.into();
        let pattern = factory_pattern(&factory);
        Self { factory, pattern }
    }

    pub fn factory(&self) -> &str {
        &self.factory
    }

    /// Insert `'<id>'` as the first argument of every anonymous call.
    /// Content without a match is returned borrowed and unchanged.
    pub fn name_definitions<'a>(&self, content: &'a str, id: &str) -> Cow<'a, str> {
        self.pattern.replace_all(content, |caps: &Captures<'_>| {
            format!("{}('{}', {}", self.factory, id, &caps[1])
        })
    }
}

impl Default for AmdRewriter {
    fn default() -> Self {
        Self {
            factory: DEFAULT_FACTORY.to_string(),
            pattern: DEFINE_PATTERN.clone(),
        }
    }
}
