//! # upd CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use upd_cli::check::{run_check, CheckArgs};
use upd_cli::digest::{run_digest, DigestArgs};
use upd_cli::manifest::{run_manifest, ManifestArgs};

/// Update server operator tools.
///
/// Computes artifact digests, renders update manifests offline, and checks
/// release directories against the installer naming policy.
#[derive(Parser, Debug)]
#[command(name = "upd", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the SHA-512 digest and size of a file.
    Digest(DigestArgs),

    /// Print the update manifest for a release (json or latest.yml).
    Manifest(ManifestArgs),

    /// Report which platform/arch installers of a release are present.
    Check(CheckArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Digest(args) => run_digest(&args),
        Commands::Manifest(args) => run_manifest(&args),
        Commands::Check(args) => run_check(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
