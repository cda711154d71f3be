//! # Manifest Subcommand
//!
//! Resolves, digests and renders one release the same way the server does,
//! and prints the body to stdout. Useful for hosting `latest.yml` from a
//! static file server or CDN.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;

use upd_core::{
    render, ArtifactResolver, DigestCache, ManifestBuilder, ReleaseMetadata, ResponseFormat,
    TargetDefaults, UpdateManifest,
};

/// Base URL the server advertises when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/updates";

/// Arguments for the `upd manifest` subcommand.
#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// Directory holding the installers.
    #[arg(long, value_name = "DIR")]
    pub dir: PathBuf,

    /// Product name used in artifact file names.
    #[arg(long)]
    pub product: String,

    /// Release version.
    #[arg(long)]
    pub version: String,

    /// Target platform (win32, darwin, linux). Defaults to win32.
    #[arg(long)]
    pub platform: Option<String>,

    /// Target architecture (x64, arm64, ia32, armv7l, universal). Defaults to x64.
    #[arg(long)]
    pub arch: Option<String>,

    /// Output format: json or yaml.
    #[arg(long, default_value = "json")]
    pub format: ResponseFormat,

    /// Public URL under which DIR is served.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Release name. Defaults to "<product> v<version>".
    #[arg(long)]
    pub release_name: Option<String>,

    #[arg(long, default_value = "")]
    pub release_notes: String,

    /// Fixed release date (RFC 3339). Defaults to now.
    #[arg(long)]
    pub release_date: Option<DateTime<Utc>>,
}

/// Execute the manifest subcommand.
pub fn run_manifest(args: &ManifestArgs) -> Result<u8> {
    let manifest = build_manifest(args)?;
    let rendered = render(&manifest, args.format)?;
    let body = String::from_utf8(rendered.body).context("rendered manifest is not UTF-8")?;
    println!("{body}");
    Ok(0)
}

/// Resolve and digest the artifact named by `args` and build its manifest.
pub fn build_manifest(args: &ManifestArgs) -> Result<UpdateManifest> {
    let resolver = ArtifactResolver::new(&args.dir, &args.product, TargetDefaults::default());
    let located = resolver
        .resolve(&args.version, args.platform.as_deref(), args.arch.as_deref())
        .with_context(|| format!("no artifact in {}", args.dir.display()))?;

    tracing::info!(file = %located.file_name, "digesting artifact");
    let record = DigestCache::new().attest(located)?;

    let release = ReleaseMetadata {
        name: args
            .release_name
            .clone()
            .unwrap_or_else(|| format!("{} v{}", args.product, args.version)),
        notes: args.release_notes.clone(),
        date: args.release_date,
    };
    Ok(ManifestBuilder::new(&args.base_url, release).build(&record))
}
