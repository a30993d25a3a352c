//! # Core Type Definitions
//!
//! Shared vocabulary for the decision layer:
//! - Discovery contexts for critical resources (`CriticalContext`)
//! - The diagnostic sink used while parsing operator input (`MessageHandler`)
//! - Error types (`SluiceError`)
//!
//! ## Determinism Guarantees
//!
//! All ordered types here implement `Ord` so they can live in
//! `BTreeMap`/`BTreeSet` and iterate the same way on every run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// CRITICAL CONTEXT
// =============================================================================

/// Where a critical resource was discovered.
///
/// Each context keeps an independent set of resources; updating one never
/// touches the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriticalContext {
    /// Referenced directly from the HTML markup.
    Html,
    /// Referenced from a stylesheet.
    Css,
}

impl CriticalContext {
    /// Every context, in canonical order.
    pub const ALL: [CriticalContext; 2] = [CriticalContext::Html, CriticalContext::Css];

    /// Lowercase token used in config, CLI and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CriticalContext::Html => "html",
            CriticalContext::Css => "css",
        }
    }
}

impl fmt::Display for CriticalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CriticalContext {
    type Err = SluiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(CriticalContext::Html),
            "css" => Ok(CriticalContext::Css),
            other => Err(SluiceError::ConfigError(format!(
                "Unknown critical context: {}",
                other
            ))),
        }
    }
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

/// Severity attached to a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Sink for non-fatal diagnostics produced while applying operator input.
///
/// Unknown filter names, bad domain patterns and similar problems are reported
/// here instead of aborting; the caller decides whether to surface them.
pub trait MessageHandler {
    /// Record one diagnostic.
    fn message(&mut self, severity: Severity, text: &str);

    /// Shorthand for a warning.
    fn warning(&mut self, text: &str) {
        self.message(Severity::Warning, text);
    }
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMessageHandler;

impl MessageHandler for TracingMessageHandler {
    fn message(&mut self, severity: Severity, text: &str) {
        match severity {
            Severity::Info => tracing::info!(target: "sluice_core::diagnostics", "{}", text),
            Severity::Warning => tracing::warn!(target: "sluice_core::diagnostics", "{}", text),
            Severity::Error => tracing::error!(target: "sluice_core::diagnostics", "{}", text),
        }
    }
}

/// Keeps every diagnostic in memory, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct CollectingMessageHandler {
    messages: Vec<(Severity, String)>,
}

impl CollectingMessageHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded messages.
    #[must_use]
    pub fn messages(&self) -> &[(Severity, String)] {
        &self.messages
    }

    /// Texts of the recorded messages, dropping severities.
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.messages.iter().map(|(_, text)| text.clone()).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl MessageHandler for CollectingMessageHandler {
    fn message(&mut self, severity: Severity, text: &str) {
        self.messages.push((severity, text.to_string()));
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the decision layer.
///
/// Several failure modes are NOT errors: unknown filter names
/// in a list, undecodable cache payloads, and merge. Those degrade instead
/// of propagating.
#[derive(Debug, Error)]
pub enum SluiceError {
    /// A filter name did not resolve to a filter or a filter group.
    #[error("Invalid filter name: {0}")]
    UnknownFilter(String),

    /// An option name is not part of the option table.
    #[error("Unknown option: {0}")]
    UnknownOption(String),

    /// An option value has the wrong type or cannot be parsed.
    #[error("Invalid value for option {name}: {value}")]
    InvalidOptionValue { name: String, value: String },

    /// A rewrite level name is not recognised.
    #[error("Invalid rewrite level: {0}")]
    InvalidRewriteLevel(String),

    /// A statistic was requested before being registered.
    #[error("Statistic not registered: {0}")]
    UnknownStatistic(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// The property store failed.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Configuration could not be applied.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The scheduler or its dispatch thread failed.
    #[error("Scheduler error: {0}")]
    SchedulerError(String),
}

// =============================================================================
// TESTS
// =============================================================================
