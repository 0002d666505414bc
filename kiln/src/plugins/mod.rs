//! The built-in plugin generators.
//!
//! Each plugin contributes its slice of a project through the engine's
//! per-invocation API; the service plugin lays down the base application
//! the others extend.

mod babel;
mod lint;
mod router;
mod service;
mod store;

use kiln_core::SERVICE_ID;
use kiln_generator::PluginRegistry;

/// Registry of every plugin shipped with the CLI.
pub fn builtin_registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.register(SERVICE_ID, service::ServicePlugin);
    registry.register("@kiln/cli-plugin-babel", babel::BabelPlugin);
    registry.register("@kiln/cli-plugin-router", router::RouterPlugin);
    registry.register("@kiln/cli-plugin-store", store::StorePlugin);
    registry.register("@kiln/cli-plugin-lint", lint::LintPlugin);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_contains_service_and_plugins() {
        let registry = builtin_registry();
        assert!(registry.contains(SERVICE_ID));
        assert!(registry.contains("@kiln/cli-plugin-router"));
        assert_eq!(registry.len(), 5);
    }
}
