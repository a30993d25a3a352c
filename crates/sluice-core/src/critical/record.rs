//! The decoded critical-resource payload.

use crate::CriticalContext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Critical resources per discovery context. The two sets are independent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalResourceRecord {
    pub html: BTreeSet<String>,
    pub css: BTreeSet<String>,
}

impl CriticalResourceRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, context: CriticalContext) -> &BTreeSet<String> {
        match context {
            CriticalContext::Html => &self.html,
            CriticalContext::Css => &self.css,
        }
    }

    /// Replace one context's set, leaving the other untouched.
    pub fn set(&mut self, context: CriticalContext, resources: BTreeSet<String>) {
        match context {
            CriticalContext::Html => self.html = resources,
            CriticalContext::Css => self.css = resources,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.html.is_empty() && self.css.is_empty()
    }

    /// Total number of resources across both contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.html.len() + self.css.len()
    }
}
