use std::path::{Path, PathBuf};

use clap::Args;
use eyre::{Context, Result, bail};
use kiln_core::{VirtualFileTree, is_plugin, matches_plugin_id};
use kiln_generator::{GenerateOptions, Generator, PluginDescriptor};
use kiln_manifest::Manifest;
use serde_json::Value;
use walkdir::WalkDir;

use super::UnwrapOrExit;
use crate::{
    output::{Output, TerminalOutput, print_exit_logs},
    plugins,
};

/// Directories never seeded into the virtual tree.
const IGNORED_DIRS: &[&str] = &["node_modules", ".git", "dist"];

#[derive(Args)]
pub struct InvokeCommand {
    /// Plugin to invoke, by full or short id
    pub plugin: String,

    /// Project directory (defaults to the current one)
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Plugin options as inline JSON
    #[arg(short, long)]
    pub options: Option<String>,
}

impl InvokeCommand {
    pub fn run(&self) -> Result<()> {
        let manifest = Manifest::load(&self.dir).unwrap_or_exit();

        let Some(id) = manifest
            .dep_names()
            .into_iter()
            .find(|dep| is_plugin(dep) && matches_plugin_id(&self.plugin, dep))
        else {
            bail!(
                "plugin '{}' is not declared in this project's package.json",
                self.plugin
            );
        };

        let options: Value = match &self.options {
            Some(src) => serde_json::from_str(src).wrap_err("--options is not valid JSON")?,
            None => Value::Object(Default::default()),
        };
        if !options.is_object() {
            bail!("--options must be a JSON object");
        }

        let seeded = read_project_files(&self.dir)?;
        let before = seeded.snapshot();

        let mut generator = Generator::new(
            &self.dir,
            plugins::builtin_registry(),
            manifest,
            vec![PluginDescriptor::new(&id, options)],
        )
        .unwrap_or_exit()
        .with_files(seeded)
        .invoking(true);

        generator
            .generate(GenerateOptions {
                extract_config_files: false,
                check_existing: true,
            })
            .unwrap_or_exit();
        generator.run_completion_hooks().unwrap_or_exit();

        let mut out = TerminalOutput::new();
        out.title(&format!("Invoked {id}"));
        out.newline();
        self.report_changes(&mut out, &before, generator.files());
        print_exit_logs(&mut out, generator.exit_logs());
        Ok(())
    }

    fn report_changes(
        &self,
        out: &mut dyn Output,
        before: &VirtualFileTree,
        after: &VirtualFileTree,
    ) {
        out.section("Changed files");
        for (path, content) in after.iter() {
            match before.get(path) {
                Some(previous) if previous == content => {}
                Some(_) => out.list_item(path),
                None => out.added_item(path),
            }
        }
        for path in before.paths() {
            if !after.contains(path) {
                out.removed_item(path);
            }
        }
    }
}

/// Seed the virtual tree with the project's current files so codemods and
/// middlewares see what is actually on disk.
fn read_project_files(dir: &Path) -> Result<VirtualFileTree> {
    let mut tree = VirtualFileTree::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !IGNORED_DIRS.contains(&entry.file_name().to_string_lossy().as_ref())
        });
    for entry in walker {
        let entry = entry.wrap_err("failed to scan the project directory")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(dir)
            .expect("walked entries live under the walk root")
            .to_string_lossy()
            .replace('\\', "/");
        let bytes = std::fs::read(entry.path())
            .wrap_err_with(|| format!("failed to read '{rel}'"))?;
        match String::from_utf8(bytes) {
            Ok(text) => tree.insert(rel, text),
            Err(raw) => tree.insert(rel, raw.into_bytes()),
        }
    }
    Ok(tree)
}
