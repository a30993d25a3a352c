//! # Options
//!
//! Configuration snapshots, their typed option slots and the merge that
//! layers one scope on another.

pub mod domain;
mod merge;
pub mod names;
pub mod rewrite_options;
pub mod value;
pub mod wildcard;

pub use domain::{DomainLawyer, FileLoadPolicy};
pub use names::{OptionName, OptionType, ScalarValue};
pub use rewrite_options::RewriteOptions;
pub use value::{AccumulatingList, MergePolicy, MonotonicOption, OptionValue};
pub use wildcard::{Wildcard, WildcardGroup};
