use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Default, Parser)]
#[command(about = "Read the project, assign permanent indices, and report problems")]
pub struct Validate {
    /// Report only; leave folios and the saved report untouched
    #[arg(long)]
    dry_run: bool,

    /// Print the summary line only, not the full report
    #[arg(long, short)]
    quiet: bool,
}

impl Validate {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut standard = super::load(root)?;

        let written = if self.dry_run { 0 } else { standard.write() };

        let diagnostics = standard.diagnostics();
        if !self.dry_run {
            let directory = root.join("reports").join("verification");
            let path = diagnostics
                .save(&directory)
                .with_context(|| format!("failed to save report to {}", directory.display()))?;
            tracing::info!("Report saved to {}", path.display());
        }

        if !self.quiet {
            println!("{}\n", diagnostics.report());
        }

        let summary = format!(
            "{} requirements in {} folios, {} rewritten",
            standard.graph().len(),
            standard.file_count(),
            written
        );

        let problems = diagnostics.problem_count();
        if problems == 0 {
            println!("{} {summary}", "✓".ok());
            return Ok(());
        }

        println!("{} {summary}", format!("{problems} problems:").problem());
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn clean_project_is_renumbered_and_report_saved() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join("config.yaml"), "customers: [acme]\n").unwrap();
        fs::create_dir_all(root.join("project")).unwrap();
        fs::create_dir_all(root.join("customer")).unwrap();
        fs::write(root.join("project/software.yaml"), "new1:\n  title: Spin\n").unwrap();

        Validate::default().run(root).unwrap();

        assert_eq!(
            fs::read_to_string(root.join("project/software.yaml")).unwrap(),
            "r00000001:\n  title: Spin"
        );
        assert_eq!(
            fs::read_to_string(root.join("reports/verification/validation_report.txt")).unwrap(),
            "Validation Report\nProblems: 0"
        );
    }

    #[test]
    fn dry_run_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::write(root.join("config.yaml"), "").unwrap();
        fs::create_dir_all(root.join("project")).unwrap();
        fs::create_dir_all(root.join("customer")).unwrap();
        fs::write(root.join("project/software.yaml"), "new1:\n  title: Spin\n").unwrap();

        Validate {
            dry_run: true,
            quiet: true,
        }
        .run(root)
        .unwrap();

        assert_eq!(
            fs::read_to_string(root.join("project/software.yaml")).unwrap(),
            "new1:\n  title: Spin\n"
        );
        assert!(!root.join("reports").exists());
    }
}
