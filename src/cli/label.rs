use std::path::Path;

use anyhow::Context;
use tracing::instrument;

use crate::cli::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct Command {
    #[command(subcommand)]
    command: LabelCommand,
}

#[derive(Debug, clap::Parser)]
enum LabelCommand {
    /// Add a label to a requirement
    Add {
        /// The index of the requirement
        index: String,
        /// The label to add
        label: String,
    },

    /// Remove a label from a requirement
    Remove {
        /// The index of the requirement
        index: String,
        /// The label to remove
        label: String,
    },
}

impl Command {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut standard = super::load(root)?;

        let (index, label, adding) = match &self.command {
            LabelCommand::Add { index, label } => (index, label, true),
            LabelCommand::Remove { index, label } => (index, label, false),
        };

        let req = standard
            .requirement_mut(index)?
            .with_context(|| format!("Requirement {index} not found"))?;

        let changed = if adding {
            req.add_label(label)
        } else {
            req.remove_label(label)
        };

        if !changed {
            println!("{}", format!("No change to labels of {index}").heading());
            return Ok(());
        }

        super::save(&mut standard);
        let verb = if adding { "Added" } else { "Removed" };
        println!("{}", format!("{verb} label '{label}' on {index}").ok());
        Ok(())
    }
}
