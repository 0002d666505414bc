//! The generation orchestrator.
//!
//! A [`Generator`] owns the whole run: it applies every plugin against a
//! shared in-memory state, extracts configuration fields into standalone
//! files, resolves the virtual tree (middlewares, then codemods), sorts
//! the manifest, and only then flushes the result to disk in one pass.
//! Nothing touches the filesystem until every plugin has succeeded, so a
//! failing run leaves the project directory exactly as it was.

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use kiln_core::{SERVICE_ID, VirtualFileTree, is_plugin, matches_plugin_id};
use kiln_manifest::Manifest;
use semver::VersionReq;
use serde_json::{Map, Value, json};

use crate::{
    api::GeneratorApi,
    codemod::{inject_imports, inject_options},
    config_transform::{ConfigTransform, default_config_transforms, reserved_config_transforms},
    error::{Error, Result},
    exit_log::ExitLog,
    package_manager::{NodeModulesPackageManager, PackageManager},
    registry::{PluginDescriptor, PluginRegistry},
};

pub(crate) type FileMiddleware = Box<dyn FnOnce(&mut VirtualFileTree) -> eyre::Result<()> + Send>;
pub(crate) type Callback = Box<dyn FnOnce() -> eyre::Result<()> + Send>;

/// Where a [`Generator`] currently stands in its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Constructed,
    PluginsInitialized,
    ConfigExtracted,
    FilesResolved,
    ManifestSorted,
    Written,
}

/// Knobs for a single [`Generator::generate`] run.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    /// Extract every eligible manifest field instead of only the
    /// always-extracted engine fields.
    pub extract_config_files: bool,
    /// Treat files already on disk as occupied when picking config
    /// file names.
    pub check_existing: bool,
}

/// Mutable run state shared with plugins through [`GeneratorApi`].
pub(crate) struct GeneratorState {
    pub(crate) context: PathBuf,
    pub(crate) original_manifest: Manifest,
    pub(crate) manifest: Manifest,
    pub(crate) files: VirtualFileTree,
    pub(crate) root_options: Value,
    pub(crate) invoking: bool,
    pub(crate) plugin_ids: Vec<String>,
    pub(crate) all_plugin_ids: Vec<String>,
    pub(crate) package_manager: Box<dyn PackageManager>,
    pub(crate) imports: IndexMap<String, IndexSet<String>>,
    pub(crate) option_injections: IndexMap<String, Vec<(String, String)>>,
    pub(crate) config_transforms: IndexMap<String, ConfigTransform>,
    pub(crate) file_middlewares: Vec<(String, FileMiddleware)>,
    pub(crate) post_process: Vec<(String, FileMiddleware)>,
    pub(crate) after_invoke: Vec<(String, Callback)>,
    pub(crate) after_any_invoke: Vec<(String, Callback)>,
    pub(crate) exit_logs: Vec<ExitLog>,
}

impl GeneratorState {
    pub(crate) fn has_plugin(&self, id: &str, range: Option<&str>) -> bool {
        let requirement = match range {
            None => None,
            Some(range) => match VersionReq::parse(range) {
                Ok(requirement) => Some(requirement),
                Err(_) => return false,
            },
        };
        self.plugin_ids
            .iter()
            .chain(self.all_plugin_ids.iter())
            .any(|known| {
                if !matches_plugin_id(id, known) {
                    return false;
                }
                match &requirement {
                    None => true,
                    Some(requirement) => self
                        .package_manager
                        .installed_version(known)
                        .is_some_and(|version| requirement.matches(&version)),
                }
            })
    }
}

/// Single-use orchestrator for one generation run.
pub struct Generator {
    registry: PluginRegistry,
    plugins: Vec<PluginDescriptor>,
    passed_after_invoke: Vec<(String, Callback)>,
    stage: Stage,
    state: GeneratorState,
}

impl Generator {
    /// Build a generator over `context` with a validated starting
    /// manifest and the plugins to apply.
    ///
    /// The core service plugin, if present, is moved to the front of the
    /// apply order; the order among the remaining plugins is preserved.
    ///
    /// # Errors
    ///
    /// Fails when the manifest is structurally invalid.
    pub fn new(
        context: impl Into<PathBuf>,
        registry: PluginRegistry,
        manifest: Manifest,
        plugins: Vec<PluginDescriptor>,
    ) -> Result<Self> {
        manifest
            .validate()
            .map_err(|e| Box::new(Error::Manifest(e)))?;

        let mut plugins = plugins;
        plugins.sort_by_key(|plugin| if plugin.id == SERVICE_ID { 0 } else { 1 });

        let root_options = plugins
            .iter()
            .find(|plugin| plugin.id == SERVICE_ID)
            .map(|plugin| plugin.options.clone())
            .unwrap_or_else(|| infer_root_options(&manifest));

        let plugin_ids = plugins.iter().map(|plugin| plugin.id.clone()).collect();
        let all_plugin_ids = manifest
            .dep_names()
            .into_iter()
            .filter(|id| is_plugin(id))
            .collect();
        let context = context.into();

        Ok(Self {
            registry,
            plugins,
            passed_after_invoke: Vec::new(),
            stage: Stage::Constructed,
            state: GeneratorState {
                original_manifest: manifest.clone(),
                manifest,
                files: VirtualFileTree::new(),
                root_options,
                invoking: false,
                plugin_ids,
                all_plugin_ids,
                package_manager: Box::new(NodeModulesPackageManager::new(&context)),
                context,
                imports: IndexMap::new(),
                option_injections: IndexMap::new(),
                config_transforms: IndexMap::new(),
                file_middlewares: Vec::new(),
                post_process: Vec::new(),
                after_invoke: Vec::new(),
                after_any_invoke: Vec::new(),
                exit_logs: Vec::new(),
            },
        })
    }

    /// Seed the virtual tree, typically with the project's existing
    /// files when re-invoking into a live project.
    pub fn with_files(mut self, files: VirtualFileTree) -> Self {
        self.state.files = files;
        self
    }

    /// Replace the package manager used for version lookups.
    pub fn with_package_manager(mut self, package_manager: impl PackageManager + 'static) -> Self {
        self.state.package_manager = Box::new(package_manager);
        self
    }

    /// Mark this run as a re-invocation against an existing project.
    pub fn invoking(mut self, invoking: bool) -> Self {
        self.state.invoking = invoking;
        self
    }

    /// Queue a caller-supplied callback to run with the plugins' own
    /// completion callbacks.
    pub fn on_after_invoke(
        mut self,
        callback: impl FnOnce() -> eyre::Result<()> + Send + 'static,
    ) -> Self {
        self.passed_after_invoke
            .push(("kiln".to_string(), Box::new(callback)));
        self
    }

    /// Run the whole pipeline and flush the result to disk.
    ///
    /// # Errors
    ///
    /// Any plugin, extraction, codemod, or I/O failure aborts the run
    /// before anything is written. A generator can only run once;
    /// calling this again fails with [`Error::AlreadyRun`].
    pub fn generate(&mut self, options: GenerateOptions) -> Result<()> {
        if self.stage != Stage::Constructed {
            return Err(Box::new(Error::AlreadyRun));
        }

        self.init_plugins()?;
        self.stage = Stage::PluginsInitialized;

        // Everything staged before extraction is what the project looked
        // like going in; the flush diffs against it to pick up deletions.
        let initial = self.state.files.snapshot();

        self.extract_config_files(options.extract_config_files, options.check_existing)?;
        self.stage = Stage::ConfigExtracted;

        self.resolve_files()?;
        self.stage = Stage::FilesResolved;

        self.state.manifest.sort();
        self.stage = Stage::ManifestSorted;

        self.state
            .files
            .insert("package.json", self.state.manifest.to_pretty_string());

        self.state
            .files
            .write_to_disk(&self.state.context, &initial)
            .map_err(|e| {
                Box::new(Error::Flush {
                    context: self.state.context.clone(),
                    source: e.into(),
                })
            })?;
        self.stage = Stage::Written;
        Ok(())
    }

    /// Run the queued completion callbacks, after-invoke first, then
    /// after-any-invoke, each group in registration order.
    ///
    /// # Errors
    ///
    /// A failing callback stops the drain and reports the plugin that
    /// registered it.
    pub fn run_completion_hooks(&mut self) -> Result<()> {
        let callbacks: Vec<_> = self.state.after_invoke.drain(..).collect();
        for (id, callback) in callbacks {
            callback().map_err(|e| Error::plugin(&id, e))?;
        }
        let callbacks: Vec<_> = self.state.after_any_invoke.drain(..).collect();
        for (id, callback) in callbacks {
            callback().map_err(|e| Error::plugin(&id, e))?;
        }
        Ok(())
    }

    /// Whether a plugin is applied in this run or declared as a project
    /// dependency, optionally constrained to a semver range.
    pub fn has_plugin(&self, id: &str, range: Option<&str>) -> bool {
        self.state.has_plugin(id, range)
    }

    pub fn exit_logs(&self) -> &[ExitLog] {
        &self.state.exit_logs
    }

    pub fn take_exit_logs(&mut self) -> Vec<ExitLog> {
        std::mem::take(&mut self.state.exit_logs)
    }

    pub fn manifest(&self) -> &Manifest {
        &self.state.manifest
    }

    pub fn files(&self) -> &VirtualFileTree {
        &self.state.files
    }

    pub fn context(&self) -> &Path {
        &self.state.context
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Apply every plugin against the shared state.
    ///
    /// Two passes keep callback ordering deterministic. The first pass
    /// runs the hooks of every plugin declared in the manifest, with
    /// empty options; only after-any-invoke callbacks registered there
    /// are kept. The second pass applies the invoked plugins (and their
    /// hooks), keeping their after-invoke callbacks but discarding any
    /// after-any-invoke registrations they make.
    fn init_plugins(&mut self) -> Result<()> {
        let root_options = self.state.root_options.clone();
        let plugin_ids = self.state.plugin_ids.clone();
        let invoking = self.state.invoking;
        let empty = Value::Object(Map::new());

        for id in self.state.all_plugin_ids.clone() {
            let Some(generator) = self.registry.resolve(&id) else {
                continue;
            };
            if !generator.has_hooks() {
                continue;
            }
            let mut api = GeneratorApi::new(id.clone(), empty.clone(), &mut self.state);
            generator
                .hooks(&mut api, &empty, &root_options, &plugin_ids)
                .map_err(|e| Error::plugin(&id, e))?;
        }

        let after_any = std::mem::take(&mut self.state.after_any_invoke);
        self.state.after_invoke = std::mem::take(&mut self.passed_after_invoke);
        self.state.post_process.clear();

        for plugin in self.plugins.clone() {
            let generator = self.registry.resolve_or_noop(&plugin.id);
            let mut api =
                GeneratorApi::new(plugin.id.clone(), plugin.options.clone(), &mut self.state);
            generator
                .apply(&mut api, &plugin.options, &root_options, invoking)
                .map_err(|e| Error::plugin(&plugin.id, e))?;
            if generator.has_hooks() {
                let mut api =
                    GeneratorApi::new(plugin.id.clone(), plugin.options.clone(), &mut self.state);
                generator
                    .hooks(&mut api, &plugin.options, &root_options, &plugin_ids)
                    .map_err(|e| Error::plugin(&plugin.id, e))?;
            }
        }

        self.state.after_any_invoke = after_any;
        Ok(())
    }

    /// Move eligible manifest fields into standalone config files.
    ///
    /// A field is eligible when a transform is registered for it and the
    /// project's original manifest did not already carry it. In minimal
    /// mode only the always-extracted engine fields are considered.
    fn extract_config_files(&mut self, extract_all: bool, check_existing: bool) -> Result<()> {
        let mut transforms = default_config_transforms();
        for (key, transform) in &self.state.config_transforms {
            transforms.insert(key.clone(), transform.clone());
        }
        for (key, transform) in reserved_config_transforms() {
            transforms.insert(key, transform);
        }

        let keys: Vec<String> = if extract_all {
            self.state.manifest.fields().keys().cloned().collect()
        } else {
            vec!["kiln".to_string(), "babel".to_string()]
        };

        for key in keys {
            let Some(transform) = transforms.get(&key) else {
                continue;
            };
            if self.state.original_manifest.contains(&key) {
                continue;
            }
            let Some(value) = self.state.manifest.get(&key).cloned() else {
                continue;
            };
            match transform.transform(
                &key,
                &value,
                check_existing,
                &self.state.files,
                &self.state.context,
            ) {
                Ok(config) => {
                    self.state.files.insert(config.filename, config.content);
                    self.state.manifest.remove(&key);
                }
                Err(err) => match *err {
                    Error::TransformConflict { key, filename } => {
                        self.state.exit_logs.push(ExitLog::warn(
                            "kiln",
                            format!("left '{key}' in package.json: '{filename}' already exists"),
                        ));
                    }
                    other => return Err(Box::new(other)),
                },
            }
        }
        Ok(())
    }

    /// Run file middlewares, normalize paths, merge pending codemod
    /// requests, then run post-process callbacks.
    fn resolve_files(&mut self) -> Result<()> {
        let GeneratorState {
            files,
            file_middlewares,
            post_process,
            imports,
            option_injections,
            ..
        } = &mut self.state;

        for (id, middleware) in file_middlewares.drain(..) {
            middleware(files).map_err(|e| Error::plugin(&id, e))?;
        }
        files.normalize_paths();

        for (path, requests) in std::mem::take(imports) {
            let path = path.replace('\\', "/");
            let Some(content) = files.get(&path) else {
                continue;
            };
            let Some(text) = content.as_text() else {
                return Err(Error::codemod(
                    &path,
                    "cannot inject imports into a binary file",
                    "",
                    None,
                ));
            };
            let requests: Vec<String> = requests.into_iter().collect();
            let updated = inject_imports(&path, text, &requests)?;
            files.insert(path, updated);
        }

        for (path, entries) in std::mem::take(option_injections) {
            let path = path.replace('\\', "/");
            let Some(content) = files.get(&path) else {
                continue;
            };
            let Some(text) = content.as_text() else {
                return Err(Error::codemod(
                    &path,
                    "cannot inject options into a binary file",
                    "",
                    None,
                ));
            };
            let updated = inject_options(&path, text, &entries)?;
            files.insert(path, updated);
        }

        for (id, callback) in post_process.drain(..) {
            callback(files).map_err(|e| Error::plugin(&id, e))?;
        }
        Ok(())
    }
}

/// Root options for runs where no service descriptor is present, e.g.
/// re-invoking a single plugin: fall back to the manifest's own engine
/// field, keeping the project name available to templates.
fn infer_root_options(manifest: &Manifest) -> Value {
    let mut options = match manifest.get("kiln") {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    if let Some(name) = manifest.name()
        && !options.contains_key("projectName")
    {
        options.insert("projectName".to_string(), json!(name));
    }
    Value::Object(options)
}
