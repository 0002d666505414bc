use std::path::PathBuf;

use clap::Args;
use eyre::{Context, Result, bail};
use kiln_core::SERVICE_ID;
use kiln_generator::{GenerateOptions, Generator, PluginDescriptor};
use kiln_manifest::Manifest;
use serde_json::{Value, json};

use super::UnwrapOrExit;
use crate::{
    output::{Output, TerminalOutput, print_exit_logs},
    plugins,
    preset::Preset,
    readme,
};

#[derive(Args)]
pub struct CreateCommand {
    /// Project name, also the directory created under the current one
    pub name: String,

    /// Apply the built-in default preset
    #[arg(short = 'd', long = "default")]
    pub use_default: bool,

    /// Path to a JSON preset file
    #[arg(short, long, conflicts_with = "use_default")]
    pub preset: Option<PathBuf>,

    /// Extract supported manifest fields into dedicated config files
    #[arg(long)]
    pub use_config_files: bool,

    /// Scaffold without the welcome content
    #[arg(long)]
    pub bare: bool,

    /// Create into an existing non-empty directory
    #[arg(short, long)]
    pub force: bool,
}

impl CreateCommand {
    pub fn run(&self) -> Result<()> {
        if self.name.is_empty() || self.name.contains(['/', '\\']) {
            bail!("'{}' is not a valid project name", self.name);
        }

        let context = std::env::current_dir()
            .wrap_err("cannot determine the current directory")?
            .join(&self.name);
        if context.exists() && context.read_dir().map(|mut d| d.next().is_some()).unwrap_or(true) {
            if !self.force {
                bail!(
                    "directory '{}' already exists and is not empty (use --force to create anyway)",
                    context.display()
                );
            }
        } else {
            std::fs::create_dir_all(&context)
                .wrap_err_with(|| format!("cannot create '{}'", context.display()))?;
        }

        let preset = match &self.preset {
            Some(path) => Preset::load(path)?,
            None => Preset::default_preset(),
        };

        let manifest = Manifest::from_value(json!({
            "name": self.name,
            "version": "0.1.0",
            "private": true,
        }))
        .unwrap_or_exit();

        let mut generator = Generator::new(
            &context,
            plugins::builtin_registry(),
            manifest,
            self.plugin_descriptors(&preset),
        )
        .unwrap_or_exit();

        generator
            .generate(GenerateOptions {
                extract_config_files: self.use_config_files || preset.use_config_files,
                check_existing: false,
            })
            .unwrap_or_exit();

        std::fs::write(
            context.join("README.md"),
            readme::generate_readme(generator.manifest()),
        )
        .wrap_err("failed to write README.md")?;

        generator.run_completion_hooks().unwrap_or_exit();

        let mut out = TerminalOutput::new();
        out.title(&format!("Created project {}", self.name));
        out.newline();
        out.section("Files");
        for path in generator.files().paths() {
            out.added_item(path);
        }
        print_exit_logs(&mut out, generator.exit_logs());
        out.newline();
        out.preformatted(&format!(
            "Next steps:\n  cd {}\n  npm install\n  npm run serve",
            self.name
        ));
        Ok(())
    }

    /// The service descriptor always leads; a service entry in the preset
    /// contributes extra root options.
    fn plugin_descriptors(&self, preset: &Preset) -> Vec<PluginDescriptor> {
        let mut root_options = json!({
            "projectName": self.name,
            "bare": self.bare,
        });
        if let Some(Value::Object(extra)) = preset.plugins.get(SERVICE_ID)
            && let Value::Object(options) = &mut root_options
        {
            for (key, value) in extra {
                options.insert(key.clone(), value.clone());
            }
        }

        let mut descriptors = vec![PluginDescriptor::new(SERVICE_ID, root_options)];
        for (id, options) in &preset.plugins {
            if id == SERVICE_ID {
                continue;
            }
            descriptors.push(PluginDescriptor::new(id, options.clone()));
        }
        descriptors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(name: &str) -> CreateCommand {
        CreateCommand {
            name: name.to_string(),
            use_default: true,
            preset: None,
            use_config_files: false,
            bare: false,
            force: false,
        }
    }

    #[test]
    fn test_service_descriptor_leads() {
        let descriptors = command("demo").plugin_descriptors(&Preset::default_preset());
        assert_eq!(descriptors[0].id, SERVICE_ID);
        assert_eq!(descriptors[0].options["projectName"], json!("demo"));
        assert!(descriptors.iter().skip(1).all(|d| d.id != SERVICE_ID));
    }

    #[test]
    fn test_preset_service_entry_feeds_root_options() {
        let preset: Preset = serde_json::from_str(
            r#"{ "plugins": { "@kiln/cli-service": { "pages": true }, "@kiln/cli-plugin-babel": {} } }"#,
        )
        .unwrap();
        let descriptors = command("demo").plugin_descriptors(&preset);
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].options["pages"], json!(true));
    }

    #[test]
    fn test_invalid_name_rejected() {
        assert!(command("nested/name").run().is_err());
    }
}
