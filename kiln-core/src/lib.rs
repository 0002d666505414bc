//! Core types for the kiln project generator.
//!
//! This crate provides the fundamental building blocks shared across
//! the kiln ecosystem: the in-memory virtual file tree that plugins
//! mutate during generation, and the plugin package naming helpers.

mod file_tree;
mod plugin_id;

pub use file_tree::{FileContent, VirtualFileTree};
pub use plugin_id::{SERVICE_ID, is_plugin, matches_plugin_id, to_short_id};
