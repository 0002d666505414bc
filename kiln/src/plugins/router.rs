//! Router support: router module plus wiring into the app entry file.

use kiln_generator::{GeneratorApi, PluginGenerator, Severity};
use serde_json::{Value, json};

const ROUTER_JS: &str = "\
import { createRouter } from 'kiln-router'

export default createRouter({
  routes: [],
})
";

const ROUTER_HISTORY_JS: &str = "\
import { createRouter, createWebHistory } from 'kiln-router'

export default createRouter({
  history: createWebHistory(),
  routes: [],
})
";

pub struct RouterPlugin;

impl PluginGenerator for RouterPlugin {
    fn apply(
        &self,
        api: &mut GeneratorApi<'_>,
        options: &Value,
        _root_options: &Value,
        _invoking: bool,
    ) -> eyre::Result<()> {
        let history = options
            .get("historyMode")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        api.render(
            "src/router.js",
            if history { ROUTER_HISTORY_JS } else { ROUTER_JS },
        );
        api.inject_imports("src/main.js", ["import router from './router'"]);
        api.inject_root_options("src/main.js", [("router", "router")]);
        api.extend_manifest(json!({
            "dependencies": { "kiln-router": "^4.0.0" },
            "devDependencies": { "@kiln/cli-plugin-router": "^0.2.0" },
        }))?;

        if history {
            api.exit_log(
                Severity::Info,
                "history mode requires the server to rewrite all routes to index.html",
            );
        }
        Ok(())
    }
}
