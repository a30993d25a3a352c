//! # Statistics
//!
//! Named, process-wide monotonic counters.
//!
//! Counters are registered while the registry is still privately owned
//! (`&mut self`), then the registry is shared read-only. Increments go
//! through atomics, so a shared `Variable` needs no lock.

use crate::SluiceError;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// One named counter.
#[derive(Debug)]
pub struct Variable {
    name: String,
    value: AtomicU64,
}

impl Variable {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add `delta` to the counter.
    pub fn add(&self, delta: u64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn increment(&self) {
        self.add(1);
    }

    #[must_use]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Registry of named counters.
#[derive(Debug, Default)]
pub struct Statistics {
    variables: BTreeMap<String, Arc<Variable>>,
}

impl Statistics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, returning the existing counter if already present.
    pub fn add_variable(&mut self, name: &str) -> Arc<Variable> {
        Arc::clone(
            self.variables
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Variable::new(name))),
        )
    }

    /// A registered counter.
    pub fn get_variable(&self, name: &str) -> Result<Arc<Variable>, SluiceError> {
        self.variables
            .get(name)
            .cloned()
            .ok_or_else(|| SluiceError::UnknownStatistic(name.to_string()))
    }

    /// Name and current value of every counter, ordered by name.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.variables
            .iter()
            .map(|(name, var)| (name.clone(), var.get()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
