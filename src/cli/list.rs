use std::path::Path;

use clap::Parser;
use reqfolio::{Requirement, Standard, TreeFilter};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "List requirements in registry order")]
pub struct List {
    /// Only requirements in this component, directly or through an ancestor
    #[arg(long)]
    component: Option<String>,

    /// Only requirements carrying this label
    #[arg(long)]
    label: Option<String>,

    /// Only requirements of this type
    #[arg(long = "type", value_name = "TYPE")]
    kind: Option<String>,

    /// Include disabled requirements
    #[arg(long)]
    all: bool,
}

impl List {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let standard = super::load(root)?;

        let filter = TreeFilter::default().with_component(self.component.clone().unwrap_or_default());
        if let Some(config) = standard.config() {
            filter.validate(config)?;
        }

        let rows = self.select(&standard, &filter);
        for req in &rows {
            let kind = if req.kind().is_empty() { "-" } else { req.kind() };
            println!(
                "{}  {kind:<10}  {}",
                req.index().to_string().key(),
                req.title()
            );
        }
        println!("{}", format!("{} requirements", rows.len()).heading());
        Ok(())
    }

    fn select<'a>(&self, standard: &'a Standard, filter: &TreeFilter) -> Vec<&'a Requirement> {
        let label = self.label.as_deref().map(str::to_lowercase);
        let kind = self.kind.as_deref().map(str::to_lowercase);

        standard
            .requirements()
            .filter(|req| self.all || req.enabled())
            .filter(|req| kind.as_deref().is_none_or(|kind| req.kind() == kind))
            .filter(|req| label.as_ref().is_none_or(|label| req.labels().contains(label)))
            .filter(|req| filter.in_component(standard.graph(), req))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn list(component: Option<&str>, label: Option<&str>) -> List {
        List {
            component: component.map(ToString::to_string),
            label: label.map(ToString::to_string),
            kind: None,
            all: false,
        }
    }

    #[test]
    fn select_applies_component_label_and_enabled_filters() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("project")).unwrap();
        fs::write(
            root.join("project/software.yaml"),
            "r00000001:\n  component: frontend\n  child_idx: [r00000002, r00000003]\n\n\
             r00000002:\n  label: [UI]\n\n\
             r00000003:\n  enabled: false\n\n\
             r00000004:\n  component: backend\n",
        )
        .unwrap();
        let mut standard = Standard::default();
        standard.read(root).unwrap();

        let indices = |command: &List| {
            let filter = TreeFilter::default()
                .with_component(command.component.clone().unwrap_or_default());
            command
                .select(&standard, &filter)
                .iter()
                .map(|req| req.index().to_string())
                .collect::<Vec<_>>()
        };

        assert_eq!(
            indices(&list(None, None)),
            ["r00000001", "r00000002", "r00000004"]
        );
        assert_eq!(indices(&list(Some("frontend"), None)), ["r00000001", "r00000002"]);
        assert_eq!(indices(&list(None, Some("ui"))), ["r00000002"]);

        let mut everything = list(Some("frontend"), None);
        everything.all = true;
        assert_eq!(
            indices(&everything),
            ["r00000001", "r00000002", "r00000003"]
        );
    }
}
