//! pdconf — compile router configuration sections into dnsmasq configs.
//!
//! # Usage
//!
//! ```text
//! pdconf sections <source> [--json]
//! pdconf apply <source> [--write-dir <dir>] [--dnsmasq-bin <bin>] [--execute] [--json]
//! pdconf revert <source> [--write-dir <dir>] [--execute] [--json]
//! ```
//!
//! `<source>` is a YAML file or a directory of YAML files. Set `RUST_LOG`
//! to adjust log verbosity (default `info`, written to stderr).

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{apply::ApplyArgs, revert::RevertArgs, sections::SectionsArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "pdconf",
    version,
    about = "Compile router configuration sections into dnsmasq configs and lifecycle actions",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load and validate sections, then list them.
    Sections(SectionsArgs),

    /// Render and write dnsmasq configs and print the start plan.
    Apply(ApplyArgs),

    /// Plan teardown of previously applied dnsmasq instances.
    Revert(RevertArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Sections(args) => args.run(),
        Commands::Apply(args) => args.run(),
        Commands::Revert(args) => args.run(),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
