use std::path::Path;

use tracing::instrument;

use crate::cli::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The index of the requirement to edit
    index: String,

    /// The index of the related requirement
    target: String,
}

impl Command {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut standard = super::load(root)?;

        if standard.get(&self.index)?.is_none() {
            anyhow::bail!("Requirement {} not found", self.index);
        }

        if standard
            .remove_relationship(&self.index, &self.target)?
            .is_none()
        {
            println!(
                "{}",
                format!("{} and {} are not related", self.index, self.target).heading()
            );
            return Ok(());
        }

        super::save(&mut standard);
        println!(
            "{}",
            format!("Unlinked {} from {}", self.index, self.target).ok()
        );
        Ok(())
    }
}
