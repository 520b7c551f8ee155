use std::path::Path;

use clap::Parser;
use reqfolio::{storage::RequirementRecord, Graph, Relationship, Requirement, Standard};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Display a requirement and its relationships")]
pub struct Show {
    /// The index of the requirement, e.g. r00000045
    index: String,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
    Yaml,
}

impl Show {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let standard = super::load(root)?;

        let Some(req) = standard.get(&self.index)? else {
            eprintln!("Requirement {} not found", self.index);
            std::process::exit(1);
        };

        match self.output {
            OutputFormat::Pretty => output_pretty(&standard, req),
            OutputFormat::Json => output_json(standard.graph(), req)?,
            OutputFormat::Yaml => println!("{}", RequirementRecord::from(req).to_yaml(req.index())?),
        }

        Ok(())
    }
}

fn output_pretty(standard: &Standard, req: &Requirement) {
    println!("# {}", req.index().to_string().key());
    if !req.title().is_empty() {
        println!("{}", req.title());
    }
    if !req.enabled() {
        println!("{}", "(disabled)".problem());
    }

    println!("\n{}", "Metadata".heading());
    if !req.kind().is_empty() {
        println!("  Type:      {}", req.kind());
    }
    if let Some(customer) = req.customer_name() {
        println!("  Customer:  {customer}");
    }
    if !req.component().is_empty() {
        println!("  Component: {}", req.component());
    }
    let source = standard
        .root()
        .and_then(|root| req.source().strip_prefix(root).ok())
        .unwrap_or_else(|| req.source());
    println!("  File:      {}", source.display());

    if !req.labels().is_empty() {
        println!("\n{}", "Labels".heading());
        for label in req.labels() {
            println!("  • {label}");
        }
    }

    for (heading, text) in [
        ("Requirement", req.statement()),
        ("Description", req.description()),
        ("Assumptions", req.assumptions()),
    ] {
        if !text.is_empty() {
            println!("\n{}", heading.heading());
            println!("  {text}");
        }
    }

    for kind in Relationship::ALL {
        let linked: Vec<_> = standard.graph().linked(req, kind).collect();
        if linked.is_empty() {
            continue;
        }
        println!("\n{}", heading_for(kind).heading());
        for other in linked {
            println!("  • {} {}", other.index().to_string().key(), other.title());
        }
    }
}

const fn heading_for(kind: Relationship) -> &'static str {
    match kind {
        Relationship::Parent => "Parents",
        Relationship::Child => "Children",
        Relationship::Related => "Related",
    }
}

fn to_json(graph: &Graph, req: &Requirement) -> serde_json::Value {
    use serde_json::json;

    let indices = |kind| {
        graph
            .linked(req, kind)
            .map(|other| other.index().to_string())
            .collect::<Vec<_>>()
    };

    json!({
        "index": req.index().to_string(),
        "enabled": req.enabled(),
        "type": req.kind(),
        "title": req.title(),
        "requirement": req.statement(),
        "description": req.description(),
        "assumptions": req.assumptions(),
        "component": req.component(),
        "labels": req.labels(),
        "file": req.source().display().to_string(),
        "parents": indices(Relationship::Parent),
        "children": indices(Relationship::Child),
        "related": indices(Relationship::Related),
    })
}

fn output_json(graph: &Graph, req: &Requirement) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&to_json(graph, req))?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn json_lists_resolved_relationships() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("project")).unwrap();
        fs::write(
            root.join("project/software.yaml"),
            "r00000001:\n  title: Root\n  related_idx: [r00000003]\n\n\
             r00000002:\n  title: Leaf\n  parent_idx: [r00000001]\n  label: [Critical]\n\n\
             r00000003:\n  title: Peer\n",
        )
        .unwrap();

        let mut standard = Standard::default();
        standard.read(root).unwrap();
        let graph = standard.graph();

        let root_json = to_json(graph, standard.get("r00000001").unwrap().unwrap());
        assert_eq!(root_json["children"], serde_json::json!(["r00000002"]));
        assert_eq!(root_json["related"], serde_json::json!(["r00000003"]));

        let leaf_json = to_json(graph, standard.get("r00000002").unwrap().unwrap());
        assert_eq!(leaf_json["parents"], serde_json::json!(["r00000001"]));
        assert_eq!(leaf_json["labels"], serde_json::json!(["critical"]));
    }
}
