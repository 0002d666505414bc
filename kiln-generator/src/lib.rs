//! The kiln generation engine.
//!
//! Given an ordered set of selected plugins, the engine produces a
//! coherent project on disk: every plugin mutates a shared virtual file
//! tree and package manifest through a bounded per-invocation API, config
//! fields are extracted into dedicated files, import and option requests
//! are merged structurally into the sources multiple plugins touch, and
//! the result is flushed to disk in a single terminal step.
//!
//! # Module Organization
//!
//! - [`registry`] - the plugin trait and the id → generator registry
//! - [`api`] - the capability object handed to each plugin invocation
//! - [`config_transform`] - manifest-field → dedicated-config-file rendering
//! - [`codemod`] - structural import/option injection into source files
//! - [`template`] - string and directory template rendering
//! - [`generator`] - the orchestrator driving the whole lifecycle

pub mod api;
pub mod codemod;
pub mod config_transform;
mod error;
mod exit_log;
pub mod generator;
mod package_manager;
pub mod registry;
pub mod template;

pub use api::GeneratorApi;
pub use config_transform::{ConfigFormat, ConfigTransform, GeneratedConfig};
pub use error::{Error, Result};
pub use exit_log::{ExitLog, Severity};
pub use generator::{Generator, GenerateOptions, Stage};
pub use package_manager::{FixedPackageManager, NodeModulesPackageManager, PackageManager};
pub use registry::{PluginDescriptor, PluginGenerator, PluginRegistry};
