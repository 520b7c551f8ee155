//! Command line interface for reqfolio.
//!
//! Reads a project of YAML requirement folios, validates and renumbers it,
//! and prints filtered views.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
