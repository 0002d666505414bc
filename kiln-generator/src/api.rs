//! The plugin-facing API.
//!
//! The orchestrator exclusively owns the file tree and manifest; each
//! plugin invocation receives a [`GeneratorApi`] bound to its id and
//! options that forwards mutation requests into the owner. Nothing here
//! touches the disk: all effects land in the shared in-memory state and
//! are committed (or discarded wholesale) by the orchestrator.

use std::path::Path;

use kiln_core::VirtualFileTree;
use kiln_manifest::Manifest;
use serde_json::{Map, Value};

use crate::{
    config_transform::{ConfigTransform, reserved_config_transforms},
    error::Result,
    exit_log::{ExitLog, Severity},
    generator::GeneratorState,
    template,
};

/// Per-invocation capability object handed to a plugin.
pub struct GeneratorApi<'a> {
    id: String,
    options: Value,
    state: &'a mut GeneratorState,
}

impl<'a> GeneratorApi<'a> {
    pub(crate) fn new(id: String, options: Value, state: &'a mut GeneratorState) -> Self {
        Self { id, options, state }
    }

    /// Id of the plugin this API is bound to.
    pub fn plugin_id(&self) -> &str {
        &self.id
    }

    /// The plugin's own options.
    pub fn options(&self) -> &Value {
        &self.options
    }

    /// Options of the core service plugin, shared with every plugin.
    pub fn root_options(&self) -> &Value {
        &self.state.root_options
    }

    /// Whether this is a re-invocation against an existing project.
    pub fn invoking(&self) -> bool {
        self.state.invoking
    }

    /// Read access to the manifest as it currently stands.
    pub fn manifest(&self) -> &Manifest {
        &self.state.manifest
    }

    /// The project directory the run will flush into.
    pub fn context(&self) -> &Path {
        &self.state.context
    }

    /// Deep-merge a patch object into the manifest.
    ///
    /// Nested objects merge, arrays concatenate, scalars replace.
    /// Dependency version collisions resolve to the incoming range and
    /// queue a warning exit log.
    pub fn extend_manifest(&mut self, patch: Value) -> eyre::Result<()> {
        let Value::Object(patch) = patch else {
            eyre::bail!("manifest patch must be an object");
        };
        let report = self.state.manifest.merge(&patch);
        for conflict in report.dep_conflicts {
            self.state.exit_logs.push(ExitLog::warn(
                &self.id,
                format!(
                    "conflicting versions for '{}' in {}: '{}' replaced by '{}'",
                    conflict.name, conflict.field, conflict.previous, conflict.incoming
                ),
            ));
        }
        Ok(())
    }

    /// Render a single template string into the tree.
    ///
    /// `{{ key }}` placeholders resolve against the root options extended
    /// by this plugin's options.
    pub fn render(&mut self, path: impl Into<String>, template: &str) {
        let data = self.template_data();
        self.state.files.insert(path, template::render(template, &data));
    }

    /// Render a template directory into the tree at `prefix`, with a
    /// per-file inclusion predicate.
    pub fn render_dir(
        &mut self,
        source: &Path,
        prefix: &str,
        include: &dyn Fn(&str) -> bool,
    ) -> Result<()> {
        let data = self.template_data();
        template::render_dir(&mut self.state.files, source, prefix, &data, include)
    }

    /// Register a config transform for a manifest field.
    ///
    /// Attempts to override a reserved transform are ignored.
    pub fn add_config_transform(&mut self, key: impl Into<String>, transform: ConfigTransform) {
        let key = key.into();
        if reserved_config_transforms().contains_key(&key) {
            return;
        }
        self.state.config_transforms.insert(key, transform);
    }

    /// Request imports be merged into a file during the resolve phase.
    ///
    /// Requests are full import statements or bare module sources;
    /// duplicates (by module identity) are dropped at merge time.
    pub fn inject_imports(
        &mut self,
        file: impl Into<String>,
        requests: impl IntoIterator<Item = impl Into<String>>,
    ) {
        let pending = self.state.imports.entry(file.into()).or_default();
        for request in requests {
            pending.insert(request.into());
        }
    }

    /// Request entries be merged into a file's exported configuration
    /// object during the resolve phase. Values are raw JS expressions.
    pub fn inject_root_options(
        &mut self,
        file: impl Into<String>,
        entries: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) {
        let pending = self.state.option_injections.entry(file.into()).or_default();
        for (key, expr) in entries {
            let key = key.into();
            if pending.iter().all(|(existing, _)| *existing != key) {
                pending.push((key, expr.into()));
            }
        }
    }

    /// Register a middleware run over the whole tree during the resolve
    /// phase, in registration order.
    pub fn add_file_middleware(
        &mut self,
        middleware: impl FnOnce(&mut VirtualFileTree) -> eyre::Result<()> + Send + 'static,
    ) {
        self.state
            .file_middlewares
            .push((self.id.clone(), Box::new(middleware)));
    }

    /// Register a callback run over the final tree, after codemods.
    pub fn post_process_files(
        &mut self,
        callback: impl FnOnce(&mut VirtualFileTree) -> eyre::Result<()> + Send + 'static,
    ) {
        self.state
            .post_process
            .push((self.id.clone(), Box::new(callback)));
    }

    /// Register a callback run after this plugin's own invocation
    /// completes (post-generation).
    pub fn after_invoke(&mut self, callback: impl FnOnce() -> eyre::Result<()> + Send + 'static) {
        self.state
            .after_invoke
            .push((self.id.clone(), Box::new(callback)));
    }

    /// Register a callback run after any invocation completes. Only
    /// registrations made during the dependency hook scan are retained.
    pub fn after_any_invoke(
        &mut self,
        callback: impl FnOnce() -> eyre::Result<()> + Send + 'static,
    ) {
        self.state
            .after_any_invoke
            .push((self.id.clone(), Box::new(callback)));
    }

    /// Whether a plugin (by full or short id) is applied or declared as a
    /// dependency.
    pub fn has_plugin(&self, id: &str) -> bool {
        self.state.has_plugin(id, None)
    }

    /// Like [`GeneratorApi::has_plugin`], additionally requiring the
    /// installed version to satisfy a semver range.
    pub fn has_plugin_version(&self, id: &str, range: &str) -> bool {
        self.state.has_plugin(id, Some(range))
    }

    /// Queue a message to print once generation completes successfully.
    pub fn exit_log(&mut self, severity: Severity, message: impl Into<String>) {
        self.state
            .exit_logs
            .push(ExitLog::new(&self.id, severity, message));
    }

    fn template_data(&self) -> Map<String, Value> {
        let mut data = match &self.state.root_options {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        if let Value::Object(options) = &self.options {
            for (k, v) in options {
                data.insert(k.clone(), v.clone());
            }
        }
        data
    }
}
