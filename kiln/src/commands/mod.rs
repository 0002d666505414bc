mod completions;
mod create;
mod invoke;
mod list;

use clap::{Parser, Subcommand};
use completions::CompletionsCommand;
use create::CreateCommand;
use eyre::Result;
use invoke::InvokeCommand;
use list::ListCommand;

/// Extension trait for exiting on engine errors with pretty formatting
pub(crate) trait UnwrapOrExit<T> {
    fn unwrap_or_exit(self) -> T;
}

impl<T> UnwrapOrExit<T> for kiln_manifest::Result<T> {
    fn unwrap_or_exit(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => {
                eprintln!("{:?}", miette::Report::new(*e));
                std::process::exit(1);
            }
        }
    }
}

impl<T> UnwrapOrExit<T> for kiln_generator::Result<T> {
    fn unwrap_or_exit(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => {
                eprintln!("{:?}", miette::Report::new(*e));
                std::process::exit(1);
            }
        }
    }
}

#[derive(Parser)]
#[command(name = "kiln")]
#[command(version)]
#[command(about = "Scaffold plugin-composed projects from presets")]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Create(cmd) => cmd.run(),
            Commands::Invoke(cmd) => cmd.run(),
            Commands::List(cmd) => cmd.run(),
            Commands::Completions(cmd) => cmd.run(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new project from a preset
    Create(CreateCommand),

    /// Re-run a single plugin's generator against an existing project
    Invoke(InvokeCommand),

    /// List the built-in plugins
    List(ListCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}
