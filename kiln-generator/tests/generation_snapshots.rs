//! Snapshot tests for generated project files.
//!
//! These verify that the staged output of a representative plugin set
//! stays stable. Run `cargo insta review` to update snapshots when making
//! intentional changes.

use kiln_core::SERVICE_ID;
use kiln_generator::{GenerateOptions, Generator, PluginDescriptor, PluginRegistry};
use kiln_manifest::Manifest;
use serde_json::json;
use tempfile::TempDir;

const MAIN_TEMPLATE: &str = "import { createApp } from 'kiln'\nimport App from './App'\n\nexport default createApp({\n  root: App,\n})\n";

/// Run a service + router + babel generation and return the staged tree.
fn generate_demo_project(dir: &TempDir) -> Generator {
    let mut registry = PluginRegistry::new();
    registry.register_fn(SERVICE_ID, |api, _options, _root, _invoking| {
        api.render("src/main.js", MAIN_TEMPLATE);
        api.extend_manifest(json!({
            "scripts": { "serve": "kiln-cli-service serve", "build": "kiln-cli-service build" },
            "dependencies": { "kiln": "^3.0.0" },
        }))?;
        Ok(())
    });
    registry.register_fn(
        "@kiln/cli-plugin-router",
        |api, _options, _root, _invoking| {
            api.inject_imports("src/main.js", ["import router from './router'"]);
            api.inject_root_options("src/main.js", [("router", "router")]);
            api.extend_manifest(json!({ "dependencies": { "kiln-router": "^4.0.0" } }))?;
            Ok(())
        },
    );
    registry.register_fn(
        "@kiln/cli-plugin-babel",
        |api, _options, _root, _invoking| {
            api.extend_manifest(json!({
                "babel": { "presets": ["@kiln/app"] },
                "devDependencies": { "@kiln/cli-plugin-babel": "^0.2.0" },
            }))?;
            Ok(())
        },
    );

    let manifest = Manifest::from_value(json!({
        "name": "demo",
        "version": "0.1.0",
        "private": true,
        "devDependencies": { "@kiln/cli-service": "^0.2.0" },
    }))
    .unwrap();

    let plugins = vec![
        PluginDescriptor::new(SERVICE_ID, json!({ "projectName": "demo" })),
        PluginDescriptor::bare("@kiln/cli-plugin-router"),
        PluginDescriptor::bare("@kiln/cli-plugin-babel"),
    ];
    let mut generator = Generator::new(dir.path(), registry, manifest, plugins).unwrap();
    generator.generate(GenerateOptions::default()).unwrap();
    generator
}

fn staged_text<'a>(generator: &'a Generator, path: &str) -> &'a str {
    generator
        .files()
        .get_text(path)
        .unwrap_or_else(|| panic!("'{path}' not staged as text"))
}

#[test]
fn test_entry_file_after_injections() {
    let dir = TempDir::new().unwrap();
    let generator = generate_demo_project(&dir);
    insta::assert_snapshot!(
        "entry_file_after_injections",
        staged_text(&generator, "src/main.js")
    );
}

#[test]
fn test_sorted_manifest() {
    let dir = TempDir::new().unwrap();
    let generator = generate_demo_project(&dir);
    insta::assert_snapshot!("sorted_manifest", staged_text(&generator, "package.json"));
}

#[test]
fn test_extracted_babel_config() {
    let dir = TempDir::new().unwrap();
    let generator = generate_demo_project(&dir);
    insta::assert_snapshot!(
        "extracted_babel_config",
        staged_text(&generator, "babel.config.js")
    );
}
