use std::{num::NonZeroUsize, path::Path};

use clap::Parser;
use reqfolio::{OutlineEntry, TreeFilter};
use tracing::instrument;

use super::terminal::Colorize;

/// Options shared by the outline views.
#[derive(Debug, clap::Args)]
pub struct ViewArgs {
    /// Include the requirements of this customer
    #[arg(long, default_value = "")]
    customer: String,

    /// Prefer children carrying this label (repeatable)
    #[arg(long = "label", value_name = "LABEL")]
    labels: Vec<String>,

    /// Labels that may not also be given to --label (repeatable). Only
    /// checked for overlap; they do not hide anything from the view
    #[arg(long = "not-label", value_name = "LABEL")]
    not_labels: Vec<String>,

    /// Maximum outline depth
    #[arg(long, default_value = "10")]
    depth: NonZeroUsize,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(about = "Print a numbered table of contents")]
pub struct Toc {
    #[command(flatten)]
    view: ViewArgs,
}

#[derive(Debug, Parser)]
#[command(about = "Print a numbered summary with requirement statements")]
pub struct Summary {
    #[command(flatten)]
    view: ViewArgs,
}

impl Toc {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        self.view.render(root, false)
    }
}

impl Summary {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        self.view.render(root, true)
    }
}

impl ViewArgs {
    fn filter(&self) -> anyhow::Result<TreeFilter> {
        Ok(TreeFilter::new(
            &self.customer,
            &self.labels,
            &self.not_labels,
        )?)
    }

    fn render(&self, root: &Path, with_statements: bool) -> anyhow::Result<()> {
        let standard = super::load(root)?;
        let filter = self.filter()?;
        if let Some(config) = standard.config() {
            filter.validate(config)?;
        }

        let entries = standard.tree(&filter).outline(self.depth);
        match self.output {
            OutputFormat::Text => {
                for line in text_lines(&entries, with_statements) {
                    println!("{line}");
                }
            }
            OutputFormat::Json => {
                let rows = json_rows(&entries, with_statements);
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
        }
        Ok(())
    }
}

fn text_lines(entries: &[OutlineEntry<'_>], with_statements: bool) -> Vec<String> {
    let mut lines = Vec::with_capacity(entries.len());
    for entry in entries {
        let indent = "  ".repeat(entry.depth - 1);
        let requirement = entry.requirement;
        lines.push(format!(
            "{indent}{} {} {}",
            entry.number,
            entry.index().to_string().key(),
            requirement.title()
        ));
        if with_statements && !requirement.statement().is_empty() {
            lines.push(format!("{indent}    {}", requirement.statement()));
        }
    }
    lines
}

fn json_rows(entries: &[OutlineEntry<'_>], with_statements: bool) -> serde_json::Value {
    use serde_json::json;

    entries
        .iter()
        .map(|entry| {
            let mut row = json!({
                "number": entry.number,
                "depth": entry.depth,
                "index": entry.index().to_string(),
                "title": entry.requirement.title(),
            });
            if with_statements {
                row["statement"] = json!(entry.requirement.statement());
            }
            row
        })
        .collect()
}
