use std::path::Path;

use reqfolio::Relationship;
use tracing::instrument;

use crate::cli::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The index of the requirement to edit
    index: String,

    /// The index of the requirement to relate it to
    target: String,

    /// What the target is to the requirement: parent, child or related
    #[arg(long, default_value = "child")]
    kind: Relationship,
}

impl Command {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut standard = super::load(root)?;

        if standard.get(&self.index)?.is_none() {
            anyhow::bail!("Requirement {} not found", self.index);
        }

        let Some((target, own)) = standard.add_relationship(&self.index, &self.target, self.kind)?
        else {
            anyhow::bail!(
                "Cannot link {} to {}: the target does not exist, is the same requirement, or is \
                 already related",
                self.index,
                self.target
            );
        };

        super::save(&mut standard);
        println!(
            "{}",
            format!("Linked {own} to {target} ({})", self.kind).ok()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use reqfolio::Standard;

    use super::*;

    fn project() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("project")).unwrap();
        fs::write(
            tmp.path().join("project/software.yaml"),
            "r00000001:\n  title: Parent\n\nr00000002:\n  title: Child\n",
        )
        .unwrap();
        tmp
    }

    #[test]
    fn link_persists_the_reference() {
        let tmp = project();
        Command {
            index: "r00000002".to_string(),
            target: "r00000001".to_string(),
            kind: Relationship::Parent,
        }
        .run(tmp.path())
        .unwrap();

        let mut standard = Standard::default();
        standard.read(tmp.path()).unwrap();
        let parent = standard.get("r00000001").unwrap().unwrap();
        let children: Vec<_> = standard
            .graph()
            .children(parent)
            .map(|req| req.index().to_string())
            .collect();
        assert_eq!(children, ["r00000002"]);
    }

    #[test]
    fn linking_to_itself_fails() {
        let tmp = project();
        let result = Command {
            index: "r00000001".to_string(),
            target: "r00000001".to_string(),
            kind: Relationship::Related,
        }
        .run(tmp.path());
        assert!(result.is_err());
    }
}
