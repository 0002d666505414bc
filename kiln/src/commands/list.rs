use clap::Args;
use eyre::Result;
use kiln_core::{SERVICE_ID, to_short_id};

use crate::{
    output::{Output, TerminalOutput},
    plugins,
};

#[derive(Args)]
pub struct ListCommand {
    /// Print full plugin ids instead of short names
    #[arg(long)]
    pub full: bool,
}

impl ListCommand {
    pub fn run(&self) -> Result<()> {
        let registry = plugins::builtin_registry();
        let mut out = TerminalOutput::new();
        out.section("Built-in plugins");
        for id in registry.ids() {
            if id == SERVICE_ID {
                continue;
            }
            if self.full {
                out.list_item(id);
            } else {
                out.list_item(to_short_id(id));
            }
        }
        Ok(())
    }
}
