//! Preset loading and validation.
//!
//! A preset names the plugins to apply (with their options) and whether
//! extracted config files are preferred over inline manifest fields.

use std::path::Path;

use eyre::{Context, Result, bail};
use indexmap::IndexMap;
use kiln_core::{SERVICE_ID, is_plugin, to_short_id};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Preset {
    /// Prefer dedicated config files over inline manifest fields.
    #[serde(default)]
    pub use_config_files: bool,
    /// Plugin id to options, in application order.
    pub plugins: IndexMap<String, Value>,
}

impl Preset {
    /// The preset applied by `create --default`.
    pub fn default_preset() -> Self {
        let mut plugins = IndexMap::new();
        plugins.insert("@kiln/cli-plugin-babel".to_string(), Value::Object(Default::default()));
        plugins.insert(
            "@kiln/cli-plugin-lint".to_string(),
            serde_json::json!({ "config": "base", "lintOn": ["save"] }),
        );
        Self {
            use_config_files: false,
            plugins,
        }
    }

    /// Load and validate a preset from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read preset '{}'", path.display()))?;
        let preset: Preset = serde_json::from_str(&src)
            .wrap_err_with(|| format!("failed to parse preset '{}'", path.display()))?;
        preset.validate()?;
        Ok(preset)
    }

    /// Check that the preset names at least one recognizable plugin.
    pub fn validate(&self) -> Result<()> {
        if self.plugins.is_empty() {
            bail!("preset declares no plugins");
        }
        for (id, options) in &self.plugins {
            if id != SERVICE_ID && !is_plugin(id) {
                bail!(
                    "'{id}' is not a plugin id (expected e.g. '@kiln/cli-plugin-{}')",
                    to_short_id(id)
                );
            }
            if !options.is_object() {
                bail!("options for '{id}' must be an object");
            }
        }
        Ok(())
    }
}
