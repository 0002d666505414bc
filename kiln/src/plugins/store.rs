//! Store support: state container module wired into the app entry file.

use kiln_generator::{GeneratorApi, PluginGenerator};
use serde_json::{Value, json};

const STORE_JS: &str = "\
import { createStore } from 'kiln-store'

export default createStore({
  state: {},
  mutations: {},
  actions: {},
})
";

pub struct StorePlugin;

impl PluginGenerator for StorePlugin {
    fn apply(
        &self,
        api: &mut GeneratorApi<'_>,
        _options: &Value,
        _root_options: &Value,
        _invoking: bool,
    ) -> eyre::Result<()> {
        api.render("src/store.js", STORE_JS);
        api.inject_imports("src/main.js", ["import store from './store'"]);
        api.inject_root_options("src/main.js", [("store", "store")]);
        api.extend_manifest(json!({
            "dependencies": { "kiln-store": "^2.0.0" },
            "devDependencies": { "@kiln/cli-plugin-store": "^0.2.0" },
        }))?;
        Ok(())
    }
}
