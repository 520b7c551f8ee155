use std::path::{Path, PathBuf};

mod label;
mod link;
mod list;
mod outline;
mod show;
mod terminal;
mod unlink;
mod validate;

use anyhow::Context;
use clap::ArgAction;
use list::List;
use outline::{Summary, Toc};
use reqfolio::Standard;
use show::Show;
use validate::Validate;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The project root, holding config.yaml, project/ and customer/
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Validate(Validate::default()))
            .run(&self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Read, renumber and link the project, write it back, and save the
    /// validation report (default)
    Validate(Validate),

    /// Print a numbered table of contents
    Toc(Toc),

    /// Print a numbered summary including requirement statements
    Summary(Summary),

    /// Show a single requirement and its relationships
    Show(Show),

    /// List requirements, optionally scoped to a component or label
    List(List),

    /// Add or remove labels
    Label(label::Command),

    /// Relate two requirements
    Link(link::Command),

    /// Remove any relationship between two requirements
    Unlink(unlink::Command),
}

impl Command {
    fn run(self, root: &Path) -> anyhow::Result<()> {
        match self {
            Self::Validate(command) => command.run(root)?,
            Self::Toc(command) => command.run(root)?,
            Self::Summary(command) => command.run(root)?,
            Self::Show(command) => command.run(root)?,
            Self::List(command) => command.run(root)?,
            Self::Label(command) => command.run(root)?,
            Self::Link(command) => command.run(root)?,
            Self::Unlink(command) => command.run(root)?,
        }
        Ok(())
    }
}

/// Read the project at `root`.
fn load(root: &Path) -> anyhow::Result<Standard> {
    let mut standard = Standard::default();
    standard
        .read(root)
        .with_context(|| format!("failed to read requirements from {}", root.display()))?;
    tracing::info!(
        "Loaded {} requirements from {} folios",
        standard.graph().len(),
        standard.file_count()
    );
    Ok(standard)
}

/// Write edits back, warning if anything went wrong along the way.
fn save(standard: &mut Standard) {
    let written = standard.write();
    tracing::info!("Rewrote {written} folios");
    let problems = standard.diagnostics().problem_count();
    if problems > 0 {
        tracing::warn!("{problems} problems found; run `reqfolio validate` for the report");
    }
}
