//! # Check Subcommand
//!
//! Reports which platform/arch installers of a release are present in the
//! updates directory, using the same naming policy as the server.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Args;

use upd_core::{Arch, ArtifactIdentity, Platform};

/// Arguments for the `upd check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Directory holding the installers.
    #[arg(long, value_name = "DIR")]
    pub dir: PathBuf,

    #[arg(long)]
    pub product: String,

    #[arg(long)]
    pub version: String,
}

/// Presence of one expected artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetStatus {
    pub platform: Platform,
    pub arch: Arch,
    pub file_name: String,
    pub present: bool,
}

/// Execute the check subcommand. Fails when no artifact is present.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let report = scan(&args.dir, &args.product, &args.version)?;
    for status in &report {
        let mark = if status.present { "FOUND  " } else { "missing" };
        println!("{mark} {}", status.file_name);
    }

    let found = report.iter().filter(|s| s.present).count();
    if found == 0 {
        tracing::error!(dir = %args.dir.display(), "no artifacts for {} {}", args.product, args.version);
        return Ok(1);
    }
    println!("OK: {found} of {} targets available", report.len());
    Ok(0)
}

/// Check every known platform/arch pair under `dir`.
pub fn scan(dir: &Path, product: &str, version: &str) -> Result<Vec<TargetStatus>> {
    if !dir.is_dir() {
        bail!("updates directory not found: {}", dir.display());
    }
    let mut report = Vec::with_capacity(Platform::ALL.len() * Arch::ALL.len());
    for platform in Platform::ALL {
        for arch in Arch::ALL {
            let file_name = ArtifactIdentity::new(product, version, platform, arch).file_name();
            let present = dir.join(&file_name).is_file();
            report.push(TargetStatus {
                platform,
                arch,
                file_name,
                present,
            });
        }
    }
    Ok(report)
}
