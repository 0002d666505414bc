//! Babel support: transpilation preset and polyfill dependency.

use kiln_generator::{GeneratorApi, PluginGenerator};
use serde_json::{Value, json};

pub struct BabelPlugin;

impl PluginGenerator for BabelPlugin {
    fn apply(
        &self,
        api: &mut GeneratorApi<'_>,
        _options: &Value,
        _root_options: &Value,
        _invoking: bool,
    ) -> eyre::Result<()> {
        api.extend_manifest(json!({
            "babel": { "presets": ["@kiln/app"] },
            "dependencies": { "core-js": "^3.0.0" },
            "devDependencies": { "@kiln/cli-plugin-babel": "^0.2.0" },
        }))?;
        Ok(())
    }
}
