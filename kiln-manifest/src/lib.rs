//! The project package manifest (`package.json`) model.
//!
//! Plugins edit the manifest throughout a generation run; this crate owns
//! the merge and ordering rules that keep the result deterministic:
//!
//! - [`merge`] - deep-merge semantics for plugin manifest patches
//! - [`sort`] - stable priority-then-alphabetical key ordering
//! - [`Manifest`] - parse, validate, and serialize the descriptor itself

mod error;
mod manifest;
pub mod merge;
pub mod sort;

pub use error::{Error, Result};
pub use manifest::{Manifest, SCRIPT_PRIORITY, TOP_LEVEL_PRIORITY};
pub use merge::{DepConflict, MergeReport, deep_merge};
pub use sort::sort_object;
