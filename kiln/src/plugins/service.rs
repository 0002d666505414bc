//! The core service plugin.
//!
//! Lays down the base application every other plugin extends: the entry
//! file with the exported app object, the root component, the html shell,
//! and the serve/build scripts.

use kiln_generator::{GeneratorApi, PluginGenerator};
use serde_json::{Value, json};

const MAIN_JS: &str = "\
import { createApp } from 'kiln'
import App from './App'

export default createApp({
  root: App,
})
";

const APP_JS: &str = "\
export default {
  name: 'App',
  render() {
    return 'Welcome to {{ projectName }}'
  },
}
";

const APP_JS_BARE: &str = "\
export default {
  name: 'App',
  render() {
    return ''
  },
}
";

const INDEX_HTML: &str = "\
<!DOCTYPE html>
<html lang=\"en\">
  <head>
    <meta charset=\"utf-8\">
    <meta name=\"viewport\" content=\"width=device-width,initial-scale=1.0\">
    <title>{{ projectName }}</title>
  </head>
  <body>
    <div id=\"app\"></div>
  </body>
</html>
";

const GITIGNORE: &str = "\
.DS_Store
node_modules
/dist
";

pub struct ServicePlugin;

impl PluginGenerator for ServicePlugin {
    fn apply(
        &self,
        api: &mut GeneratorApi<'_>,
        _options: &Value,
        root_options: &Value,
        _invoking: bool,
    ) -> eyre::Result<()> {
        api.extend_manifest(json!({
            "scripts": {
                "serve": "kiln-cli-service serve",
                "build": "kiln-cli-service build",
            },
            "dependencies": { "kiln": "^3.0.0" },
            "devDependencies": { "@kiln/cli-service": "^0.2.0" },
            "browserslist": ["> 1%", "last 2 versions"],
        }))?;

        let bare = root_options
            .get("bare")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        api.render("src/main.js", MAIN_JS);
        api.render("src/App.js", if bare { APP_JS_BARE } else { APP_JS });
        api.render("public/index.html", INDEX_HTML);
        api.render(".gitignore", GITIGNORE);
        Ok(())
    }
}
