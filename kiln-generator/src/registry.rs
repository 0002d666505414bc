//! The plugin trait and the id → generator registry.
//!
//! The original design loaded `"<id>/generator"` modules at runtime; here
//! any identifier can be bound to a statically-typed generator at startup
//! instead. Ids present in a project's dependencies but absent from the
//! registry resolve to an inert no-op so optional peer plugins never fail
//! a generation.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::api::GeneratorApi;

/// A plugin's generator: the unit of capability that contributes files,
/// manifest edits and config during generation.
///
/// `apply` runs once per explicit invocation. `hooks` lets a plugin
/// register completion callbacks and is also invoked for plugins that are
/// project dependencies without being explicitly selected; implementors
/// must override [`PluginGenerator::has_hooks`] to opt in.
pub trait PluginGenerator: Send + Sync {
    /// Contribute to the shared file tree and manifest.
    ///
    /// # Errors
    ///
    /// Any error aborts the entire generation before disk writes.
    fn apply(
        &self,
        api: &mut GeneratorApi<'_>,
        options: &Value,
        root_options: &Value,
        invoking: bool,
    ) -> eyre::Result<()>;

    /// Whether this generator has a meaningful [`PluginGenerator::hooks`].
    fn has_hooks(&self) -> bool {
        false
    }

    /// Register completion callbacks; `plugin_ids` lists the explicitly
    /// invoked plugins so a hook can react to what else is running.
    #[allow(unused_variables)]
    fn hooks(
        &self,
        api: &mut GeneratorApi<'_>,
        options: &Value,
        root_options: &Value,
        plugin_ids: &[String],
    ) -> eyre::Result<()> {
        Ok(())
    }
}

/// The inert generator substituted for unresolvable plugin ids.
pub struct NoopGenerator;

impl PluginGenerator for NoopGenerator {
    fn apply(
        &self,
        _api: &mut GeneratorApi<'_>,
        _options: &Value,
        _root_options: &Value,
        _invoking: bool,
    ) -> eyre::Result<()> {
        Ok(())
    }
}

struct FnPlugin<F>(F);

impl<F> PluginGenerator for FnPlugin<F>
where
    F: Fn(&mut GeneratorApi<'_>, &Value, &Value, bool) -> eyre::Result<()> + Send + Sync,
{
    fn apply(
        &self,
        api: &mut GeneratorApi<'_>,
        options: &Value,
        root_options: &Value,
        invoking: bool,
    ) -> eyre::Result<()> {
        (self.0)(api, options, root_options, invoking)
    }
}

/// Mapping from plugin id to generator implementation.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    generators: IndexMap<String, Arc<dyn PluginGenerator>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an id to a generator.
    pub fn register(&mut self, id: impl Into<String>, generator: impl PluginGenerator + 'static) {
        self.generators.insert(id.into(), Arc::new(generator));
    }

    /// Bind an id to a plain apply function without hooks.
    pub fn register_fn<F>(&mut self, id: impl Into<String>, apply: F)
    where
        F: Fn(&mut GeneratorApi<'_>, &Value, &Value, bool) -> eyre::Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.register(id, FnPlugin(apply));
    }

    /// Look up a generator by id.
    pub fn resolve(&self, id: &str) -> Option<Arc<dyn PluginGenerator>> {
        self.generators.get(id).cloned()
    }

    /// Look up a generator by id, degrading missing ids to a no-op.
    pub fn resolve_or_noop(&self, id: &str) -> Arc<dyn PluginGenerator> {
        self.resolve(id).unwrap_or_else(|| Arc::new(NoopGenerator))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.generators.contains_key(id)
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.generators.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

/// A selected plugin and its author-defined options.
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    pub id: String,
    pub options: Value,
}

impl PluginDescriptor {
    pub fn new(id: impl Into<String>, options: Value) -> Self {
        Self { id: id.into(), options }
    }

    /// A descriptor with no options.
    pub fn bare(id: impl Into<String>) -> Self {
        Self::new(id, Value::Object(Default::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_id_resolves_to_noop() {
        let registry = PluginRegistry::new();
        assert!(registry.resolve("@kiln/cli-plugin-ghost").is_none());
        // resolve_or_noop never fails a generation over an absent plugin
        let _ = registry.resolve_or_noop("@kiln/cli-plugin-ghost");
    }

    #[test]
    fn test_register_fn_and_lookup() {
        let mut registry = PluginRegistry::new();
        registry.register_fn("@kiln/cli-plugin-babel", |_api, _options, _root, _invoking| Ok(()));

        assert!(registry.contains("@kiln/cli-plugin-babel"));
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["@kiln/cli-plugin-babel"]);
    }
}
