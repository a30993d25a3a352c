//! # Filters Module
//!
//! The closed set of rewrite filters, the rewrite levels, and the
//! process-wide catalog that maps operator-facing names onto both.

mod catalog;
mod filter;
mod level;

pub use catalog::FilterCatalog;
pub use filter::{Filter, FilterSet};
pub use level::RewriteLevel;
