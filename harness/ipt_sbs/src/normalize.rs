//! Output normalization.
//!
//! Two runtimes legitimately differ in volatile output: object addresses,
//! interactive prompt echo, line endings. Those differences are masked
//! before diffing so only behavioral divergence is reported.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::SbsError;

/// Interactive prompts echoed at the start of a line.
#[expect(clippy::expect_used, reason = "literal pattern")]
static PROMPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:>>>|\.\.\.)(?: |$)").expect("valid prompt pattern"));

/// Hexadecimal object addresses (`<object at 0x01A2B3C4>`).
#[expect(clippy::expect_used, reason = "literal pattern")]
static ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b0[xX][0-9a-fA-F]+\b").expect("valid address pattern"));

/// Replacement used for masked addresses.
pub const ADDRESS_MASK: &str = "0x?";

/// A regex substitution applied to the whole output.
#[derive(Clone, Debug)]
pub struct NormalizationRule {
    pattern: Regex,
    replacement: String,
}

impl NormalizationRule {
    /// `replacement` may refer to capture groups (`$1`, `${name}`).
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, SbsError> {
        let regex = Regex::new(pattern).map_err(|source| SbsError::InvalidRule {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(NormalizationRule {
            pattern: regex,
            replacement: replacement.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, self.replacement.as_str())
            .into_owned()
    }
}

/// Ordered normalization pipeline.
///
/// With built-ins enabled, the pipeline first converts CRLF to LF, strips
/// `>>> `/`... ` prompts, and masks hex addresses; configured rules run next
/// in order; finally trailing whitespace and trailing blank lines are
/// dropped.
#[derive(Clone, Debug)]
pub struct Normalizer {
    builtin: bool,
    rules: Vec<NormalizationRule>,
}

impl Normalizer {
    /// Normalizer with built-in rules and no custom rules.
    pub fn new() -> Self {
        Normalizer {
            builtin: true,
            rules: Vec::new(),
        }
    }

    /// Normalizer that only applies custom rules and whitespace trimming.
    pub fn without_builtins() -> Self {
        Normalizer {
            builtin: false,
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_rule(mut self, rule: NormalizationRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn add_rule(&mut self, rule: NormalizationRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[NormalizationRule] {
        &self.rules
    }

    pub fn normalize(&self, text: &str) -> String {
        let mut text = if self.builtin {
            let unix = text.replace("\r\n", "\n");
            let unprompted = PROMPT.replace_all(&unix, "");
            ADDRESS.replace_all(&unprompted, ADDRESS_MASK).into_owned()
        } else {
            text.to_string()
        };

        for rule in &self.rules {
            text = rule.apply(&text);
        }

        let mut lines: Vec<&str> = text.lines().map(str::trim_end).collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        if lines.is_empty() {
            return String::new();
        }
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer::new()
    }
}
