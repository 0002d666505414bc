//! End-to-end tests for the generation pipeline.
//!
//! Each test drives a full [`Generator`] run over a temporary project
//! directory and asserts on what actually lands on disk.

use std::sync::{Arc, Mutex};

use kiln_core::SERVICE_ID;
use kiln_generator::{
    GenerateOptions, Generator, GeneratorApi, PluginDescriptor, PluginGenerator, PluginRegistry,
    Severity,
};
use kiln_manifest::Manifest;
use serde_json::{Value, json};
use tempfile::TempDir;

const MAIN_TEMPLATE: &str = "import { createApp } from 'kiln'\nimport App from './App'\n\nexport default createApp({\n  root: App,\n})\n";

fn base_manifest() -> Manifest {
    Manifest::from_value(json!({
        "name": "demo",
        "version": "0.1.0",
        "devDependencies": { "@kiln/cli-service": "^0.2.0" },
    }))
    .expect("manifest literal is an object")
}

fn service_registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.register_fn(SERVICE_ID, |api, _options, _root, _invoking| {
        api.render("src/main.js", MAIN_TEMPLATE);
        api.extend_manifest(json!({
            "scripts": { "serve": "kiln-cli-service serve", "build": "kiln-cli-service build" },
        }))?;
        Ok(())
    });
    registry
}

fn run(
    dir: &TempDir,
    registry: PluginRegistry,
    manifest: Manifest,
    plugins: Vec<PluginDescriptor>,
    options: GenerateOptions,
) -> Generator {
    let mut generator =
        Generator::new(dir.path(), registry, manifest, plugins).expect("valid manifest");
    generator.generate(options).expect("generation succeeds");
    generator
}

fn read(dir: &TempDir, path: &str) -> String {
    std::fs::read_to_string(dir.path().join(path))
        .unwrap_or_else(|_| panic!("expected '{path}' on disk"))
}

#[test]
fn test_service_applies_before_other_plugins() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut registry = PluginRegistry::new();
    for id in [SERVICE_ID, "@kiln/cli-plugin-router"] {
        let order = Arc::clone(&order);
        registry.register_fn(id, move |api, _options, _root, _invoking| {
            order.lock().unwrap().push(api.plugin_id().to_string());
            Ok(())
        });
    }

    let dir = TempDir::new().unwrap();
    // Deliberately listed with the service last.
    let plugins = vec![
        PluginDescriptor::bare("@kiln/cli-plugin-router"),
        PluginDescriptor::new(SERVICE_ID, json!({ "projectName": "demo" })),
    ];
    run(
        &dir,
        registry,
        base_manifest(),
        plugins,
        GenerateOptions::default(),
    );

    assert_eq!(
        *order.lock().unwrap(),
        vec![SERVICE_ID, "@kiln/cli-plugin-router"]
    );
}

#[test]
fn test_plugins_converge_on_a_shared_entry_file() {
    let mut registry = service_registry();
    registry.register_fn(
        "@kiln/cli-plugin-router",
        |api, _options, _root, _invoking| {
            api.render(
                "src/router.js",
                "import { createRouter } from 'kiln-router'\n\nexport default createRouter()\n",
            );
            api.inject_imports("src/main.js", ["import router from './router'"]);
            api.inject_root_options("src/main.js", [("router", "router")]);
            api.extend_manifest(json!({ "dependencies": { "kiln-router": "^4.0.0" } }))?;
            Ok(())
        },
    );
    registry.register_fn(
        "@kiln/cli-plugin-store",
        |api, _options, _root, _invoking| {
            api.inject_imports("src/main.js", ["import store from './store'"]);
            api.inject_root_options("src/main.js", [("store", "store")]);
            Ok(())
        },
    );

    let dir = TempDir::new().unwrap();
    let plugins = vec![
        PluginDescriptor::new(SERVICE_ID, json!({ "projectName": "demo" })),
        PluginDescriptor::bare("@kiln/cli-plugin-router"),
        PluginDescriptor::bare("@kiln/cli-plugin-store"),
    ];
    run(
        &dir,
        registry,
        base_manifest(),
        plugins,
        GenerateOptions::default(),
    );

    let main = read(&dir, "src/main.js");
    assert!(main.contains("import router from './router'"));
    assert!(main.contains("import store from './store'"));
    assert!(main.contains("router,"));
    assert!(main.contains("store,"));
    // The original import header stays ahead of the injected ones.
    assert!(main.starts_with("import { createApp } from 'kiln'"));

    let manifest = read(&dir, "package.json");
    assert!(manifest.contains("\"kiln-router\": \"^4.0.0\""));
}

#[test]
fn test_minimal_extraction_still_extracts_babel() {
    let mut registry = service_registry();
    registry.register_fn(
        "@kiln/cli-plugin-babel",
        |api, _options, _root, _invoking| {
            api.extend_manifest(json!({
                "babel": { "presets": ["@kiln/app"] },
                "eslintConfig": { "root": true },
            }))?;
            Ok(())
        },
    );

    let dir = TempDir::new().unwrap();
    let plugins = vec![
        PluginDescriptor::new(SERVICE_ID, json!({ "projectName": "demo" })),
        PluginDescriptor::bare("@kiln/cli-plugin-babel"),
    ];
    run(
        &dir,
        registry,
        base_manifest(),
        plugins,
        GenerateOptions {
            extract_config_files: false,
            check_existing: false,
        },
    );

    let babel = read(&dir, "babel.config.js");
    assert!(babel.starts_with("module.exports = {"));
    assert!(babel.contains("'@kiln/app'"));

    // Minimal mode leaves every other field inline.
    let manifest = read(&dir, "package.json");
    assert!(!manifest.contains("\"babel\""));
    assert!(manifest.contains("\"eslintConfig\""));
    assert!(!dir.path().join(".eslintrc.js").exists());
}

#[test]
fn test_full_extraction_moves_registered_fields() {
    let mut registry = service_registry();
    registry.register_fn(
        "@kiln/cli-plugin-lint",
        |api, _options, _root, _invoking| {
            api.extend_manifest(json!({ "eslintConfig": { "root": true } }))?;
            Ok(())
        },
    );

    let dir = TempDir::new().unwrap();
    let plugins = vec![
        PluginDescriptor::new(SERVICE_ID, json!({ "projectName": "demo" })),
        PluginDescriptor::bare("@kiln/cli-plugin-lint"),
    ];
    run(
        &dir,
        registry,
        base_manifest(),
        plugins,
        GenerateOptions {
            extract_config_files: true,
            check_existing: false,
        },
    );

    assert!(dir.path().join(".eslintrc.js").exists());
    assert!(!read(&dir, "package.json").contains("\"eslintConfig\""));
}

#[test]
fn test_fields_from_the_original_manifest_stay_inline() {
    let manifest = Manifest::from_value(json!({
        "name": "demo",
        "babel": { "presets": ["legacy"] },
    }))
    .unwrap();
    let mut registry = PluginRegistry::new();
    registry.register_fn(SERVICE_ID, |_api, _options, _root, _invoking| Ok(()));

    let dir = TempDir::new().unwrap();
    run(
        &dir,
        registry,
        manifest,
        vec![PluginDescriptor::new(
            SERVICE_ID,
            json!({ "projectName": "demo" }),
        )],
        GenerateOptions {
            extract_config_files: true,
            check_existing: false,
        },
    );

    assert!(!dir.path().join("babel.config.js").exists());
    assert!(read(&dir, "package.json").contains("\"babel\""));
}

#[test]
fn test_existing_config_file_keeps_the_field_inline() {
    let dir = TempDir::new().unwrap();
    let user_babel = "module.exports = { presets: ['hand-rolled'] }\n";
    std::fs::write(dir.path().join("babel.config.js"), user_babel).unwrap();

    let mut registry = service_registry();
    registry.register_fn(
        "@kiln/cli-plugin-babel",
        |api, _options, _root, _invoking| {
            api.extend_manifest(json!({ "babel": { "presets": ["@kiln/app"] } }))?;
            Ok(())
        },
    );

    let plugins = vec![
        PluginDescriptor::new(SERVICE_ID, json!({ "projectName": "demo" })),
        PluginDescriptor::bare("@kiln/cli-plugin-babel"),
    ];
    let mut generator = run(
        &dir,
        registry,
        base_manifest(),
        plugins,
        GenerateOptions {
            extract_config_files: true,
            check_existing: true,
        },
    );

    // The hand-written config survives untouched and the field stays put.
    assert_eq!(read(&dir, "babel.config.js"), user_babel);
    assert!(read(&dir, "package.json").contains("\"babel\""));

    let logs = generator.take_exit_logs();
    assert!(logs.iter().any(|log| {
        log.id == "kiln"
            && log.severity == Severity::Warn
            && log.message.contains("babel.config.js")
    }));
}

#[test]
fn test_later_plugin_wins_a_path_collision() {
    let mut registry = PluginRegistry::new();
    registry.register_fn(SERVICE_ID, |api, _options, _root, _invoking| {
        api.render("README.md", "# {{ projectName }}\n\nservice readme\n");
        Ok(())
    });
    registry.register_fn(
        "@kiln/cli-plugin-docs",
        |api, _options, _root, _invoking| {
            api.render("./README.md", "# {{ projectName }}\n\ndocs readme\n");
            Ok(())
        },
    );

    let dir = TempDir::new().unwrap();
    let plugins = vec![
        PluginDescriptor::new(SERVICE_ID, json!({ "projectName": "demo" })),
        PluginDescriptor::bare("@kiln/cli-plugin-docs"),
    ];
    run(
        &dir,
        registry,
        base_manifest(),
        plugins,
        GenerateOptions::default(),
    );

    // The dot-prefixed path collapses onto the same normalized path and
    // the later write survives.
    assert_eq!(read(&dir, "README.md"), "# demo\n\ndocs readme\n");
}

#[test]
fn test_regeneration_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let plugins = vec![
        PluginDescriptor::new(SERVICE_ID, json!({ "projectName": "demo" })),
        PluginDescriptor::bare("@kiln/cli-plugin-router"),
    ];

    let make_registry = || {
        let mut registry = service_registry();
        registry.register_fn(
            "@kiln/cli-plugin-router",
            |api, _options, _root, _invoking| {
                api.inject_imports("src/main.js", ["import router from './router'"]);
                api.inject_root_options("src/main.js", [("router", "router")]);
                api.extend_manifest(json!({ "dependencies": { "kiln-router": "^4.0.0" } }))?;
                Ok(())
            },
        );
        registry
    };

    run(
        &dir,
        make_registry(),
        base_manifest(),
        plugins.clone(),
        GenerateOptions::default(),
    );
    let first_manifest = read(&dir, "package.json");
    let first_main = read(&dir, "src/main.js");

    run(
        &dir,
        make_registry(),
        Manifest::parse(&first_manifest).unwrap(),
        plugins,
        GenerateOptions::default(),
    );

    assert_eq!(read(&dir, "package.json"), first_manifest);
    assert_eq!(read(&dir, "src/main.js"), first_main);
}

#[test]
fn test_files_dropped_by_middleware_are_deleted_on_disk() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("src/legacy.js"), "old\n").unwrap();

    let mut registry = PluginRegistry::new();
    registry.register_fn(SERVICE_ID, |api, _options, _root, _invoking| {
        api.add_file_middleware(|files| {
            files.remove("src/legacy.js");
            Ok(())
        });
        Ok(())
    });

    let seeded: kiln_core::VirtualFileTree = [("src/legacy.js", "old\n")].into_iter().collect();

    let mut generator = Generator::new(
        dir.path(),
        registry,
        base_manifest(),
        vec![PluginDescriptor::new(
            SERVICE_ID,
            json!({ "projectName": "demo" }),
        )],
    )
    .unwrap()
    .with_files(seeded)
    .invoking(true);
    generator.generate(GenerateOptions::default()).unwrap();

    assert!(!dir.path().join("src/legacy.js").exists());
    assert!(dir.path().join("package.json").exists());
}

#[test]
fn test_failed_run_writes_nothing() {
    let mut registry = service_registry();
    registry.register_fn(
        "@kiln/cli-plugin-broken",
        |_api, _options, _root, _invoking| eyre::bail!("plugin blew up"),
    );

    let dir = TempDir::new().unwrap();
    let plugins = vec![
        PluginDescriptor::new(SERVICE_ID, json!({ "projectName": "demo" })),
        PluginDescriptor::bare("@kiln/cli-plugin-broken"),
    ];
    let mut generator = Generator::new(dir.path(), registry, base_manifest(), plugins).unwrap();
    let err = generator.generate(GenerateOptions::default()).unwrap_err();

    assert!(err.to_string().contains("@kiln/cli-plugin-broken"));
    assert!(!dir.path().join("package.json").exists());
    assert!(!dir.path().join("src").exists());
}

#[test]
fn test_unparseable_entry_file_aborts_before_any_write() {
    let mut registry = PluginRegistry::new();
    registry.register_fn(SERVICE_ID, |api, _options, _root, _invoking| {
        // The rendered file has no exported object for the injection below.
        api.render("src/main.js", "console.log('no export here')\n");
        api.inject_root_options("src/main.js", [("router", "router")]);
        Ok(())
    });

    let dir = TempDir::new().unwrap();
    let mut generator = Generator::new(
        dir.path(),
        registry,
        base_manifest(),
        vec![PluginDescriptor::new(
            SERVICE_ID,
            json!({ "projectName": "demo" }),
        )],
    )
    .unwrap();
    let err = generator.generate(GenerateOptions::default()).unwrap_err();

    assert!(err.to_string().contains("src/main.js"));
    assert!(!dir.path().join("package.json").exists());
    assert!(!dir.path().join("src").exists());
}

#[test]
fn test_exit_logs_capture_messages_and_dep_conflicts() {
    let mut registry = service_registry();
    registry.register_fn(
        "@kiln/cli-plugin-router",
        |api, _options, _root, _invoking| {
            api.extend_manifest(json!({ "dependencies": { "kiln-router": "^4.0.0" } }))?;
            api.exit_log(Severity::Info, "history mode needs server rewrites");
            Ok(())
        },
    );
    registry.register_fn(
        "@kiln/cli-plugin-other",
        |api, _options, _root, _invoking| {
            api.extend_manifest(json!({ "dependencies": { "kiln-router": "^3.0.0" } }))?;
            Ok(())
        },
    );

    let dir = TempDir::new().unwrap();
    let plugins = vec![
        PluginDescriptor::new(SERVICE_ID, json!({ "projectName": "demo" })),
        PluginDescriptor::bare("@kiln/cli-plugin-router"),
        PluginDescriptor::bare("@kiln/cli-plugin-other"),
    ];
    let mut generator = run(
        &dir,
        registry,
        base_manifest(),
        plugins,
        GenerateOptions::default(),
    );

    // The conflicting range wins and is recorded as a warning.
    assert!(read(&dir, "package.json").contains("\"kiln-router\": \"^3.0.0\""));

    let logs = generator.take_exit_logs();
    assert!(logs.iter().any(|log| {
        log.id == "@kiln/cli-plugin-router"
            && log.severity == Severity::Info
            && log.message.contains("history mode")
    }));
    assert!(logs.iter().any(|log| {
        log.id == "@kiln/cli-plugin-other"
            && log.severity == Severity::Warn
            && log.message.contains("kiln-router")
    }));
    assert!(generator.exit_logs().is_empty());
}

/// Generator with a hook, used to observe completion callback ordering.
struct HookedPlugin {
    label: &'static str,
    seen: Arc<Mutex<Vec<String>>>,
}

impl PluginGenerator for HookedPlugin {
    fn apply(
        &self,
        _api: &mut GeneratorApi<'_>,
        _options: &Value,
        _root_options: &Value,
        _invoking: bool,
    ) -> eyre::Result<()> {
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
        let seen = Arc::clone(&self.seen);
        let label = self.label;
        api.after_invoke(move || {
            seen.lock().unwrap().push(format!("invoke:{label}"));
            Ok(())
        });
        let seen = Arc::clone(&self.seen);
        api.after_any_invoke(move || {
            seen.lock().unwrap().push(format!("any:{label}"));
            Ok(())
        });
        Ok(())
    }
}

#[test]
fn test_completion_hooks_run_invoked_before_bystanders() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut registry = PluginRegistry::new();
    registry.register_fn(SERVICE_ID, |_api, _options, _root, _invoking| Ok(()));
    registry.register(
        "@kiln/cli-plugin-router",
        HookedPlugin {
            label: "router",
            seen: Arc::clone(&seen),
        },
    );
    registry.register(
        "@kiln/cli-plugin-pwa",
        HookedPlugin {
            label: "pwa",
            seen: Arc::clone(&seen),
        },
    );

    // pwa is only a declared dependency; router is actually invoked.
    let manifest = Manifest::from_value(json!({
        "name": "demo",
        "devDependencies": {
            "@kiln/cli-service": "^0.2.0",
            "@kiln/cli-plugin-router": "^0.2.0",
            "@kiln/cli-plugin-pwa": "^0.2.0",
        },
    }))
    .unwrap();

    let dir = TempDir::new().unwrap();
    let plugins = vec![
        PluginDescriptor::new(SERVICE_ID, json!({ "projectName": "demo" })),
        PluginDescriptor::bare("@kiln/cli-plugin-router"),
    ];
    let mut generator = Generator::new(dir.path(), registry, manifest, plugins).unwrap();
    generator.generate(GenerateOptions::default()).unwrap();
    generator.run_completion_hooks().unwrap();

    // router's own callback runs first; after-any callbacks come from the
    // dependency scan, so the bystander pwa still fires, and router's
    // second-pass after-any registration is dropped rather than doubled.
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["invoke:router", "any:router", "any:pwa"]
    );
}
