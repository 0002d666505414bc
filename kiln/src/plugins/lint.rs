//! Lint support: eslint config, lint script, and a completion hook that
//! fixes up files regenerated by any invocation.

use kiln_generator::{GeneratorApi, PluginGenerator};
use serde_json::{Value, json};

pub struct LintPlugin;

impl PluginGenerator for LintPlugin {
    fn apply(
        &self,
        api: &mut GeneratorApi<'_>,
        options: &Value,
        _root_options: &Value,
        _invoking: bool,
    ) -> eyre::Result<()> {
        let config = options
            .get("config")
            .and_then(Value::as_str)
            .unwrap_or("base");

        api.extend_manifest(json!({
            "scripts": { "lint": "kiln-cli-service lint" },
            "eslintConfig": {
                "root": true,
                "extends": [format!("kiln/{config}")],
            },
            "devDependencies": {
                "@kiln/cli-plugin-lint": "^0.2.0",
                "eslint": "^8.0.0",
            },
        }))?;
        Ok(())
    }

    fn has_hooks(&self) -> bool {
        true
    }

    fn hooks(
        &self,
        api: &mut GeneratorApi<'_>,
        _options: &Value,
        _root_options: &Value,
        _plugin_ids: &[String],
    ) -> eyre::Result<()> {
        let context = api.context().to_path_buf();
        api.after_any_invoke(move || {
            // Best effort: a project without eslint installed is fine.
            let _ = std::process::Command::new("npx")
                .args(["eslint", "--fix", "src"])
                .current_dir(&context)
                .status();
            Ok(())
        });
        Ok(())
    }
}
