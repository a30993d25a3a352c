//! Wildcard patterns (`*` and `?`) and ordered allow/disallow groups.

use super::value::AccumulatingList;
use crate::SluiceError;
use regex::Regex;

/// A compiled wildcard pattern. `*` matches any run, `?` any single char.
#[derive(Debug, Clone)]
pub struct Wildcard {
    spec: String,
    regex: Regex,
}

impl Wildcard {
    pub fn new(spec: &str) -> Result<Self, SluiceError> {
        let mut pattern = String::with_capacity(spec.len() + 8);
        pattern.push('^');
        let mut literal = [0u8; 4];
        for c in spec.chars() {
            match c {
                '*' => pattern.push_str(".*"),
                '?' => pattern.push('.'),
                other => pattern.push_str(&regex::escape(other.encode_utf8(&mut literal))),
            }
        }
        pattern.push('$');

        let regex = Regex::new(&pattern)
            .map_err(|e| SluiceError::ConfigError(format!("Bad wildcard '{}': {}", spec, e)))?;
        Ok(Self {
            spec: spec.to_string(),
            regex,
        })
    }

    #[must_use]
    pub fn spec(&self) -> &str {
        &self.spec
    }

    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Wildcard {
    fn eq(&self, other: &Self) -> bool {
        self.spec == other.spec
    }
}

impl Eq for Wildcard {}

/// One rule of a [`WildcardGroup`].
#[derive(Debug, Clone, PartialEq, Eq)]
struct WildcardRule {
    pattern: Wildcard,
    allow: bool,
}

/// Ordered allow/disallow patterns; the last matching rule decides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WildcardGroup {
    rules: AccumulatingList<WildcardRule>,
}

impl WildcardGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(&mut self, spec: &str) -> Result<(), SluiceError> {
        self.push(spec, true)
    }

    pub fn disallow(&mut self, spec: &str) -> Result<(), SluiceError> {
        self.push(spec, false)
    }

    fn push(&mut self, spec: &str, allow: bool) -> Result<(), SluiceError> {
        self.rules.push(WildcardRule {
            pattern: Wildcard::new(spec)?,
            allow,
        });
        Ok(())
    }

    /// Outcome of the last rule matching `text`, or `default` if none does.
    #[must_use]
    pub fn matches(&self, text: &str, default: bool) -> bool {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.pattern.matches(text))
            .map(|rule| rule.allow)
            .unwrap_or(default)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// `first`'s rules followed by `second`'s.
    #[must_use]
    pub fn merged(first: &Self, second: &Self) -> Self {
        Self {
            rules: AccumulatingList::merged(&first.rules, &second.rules),
        }
    }
}
