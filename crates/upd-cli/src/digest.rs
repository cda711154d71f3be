//! # Digest Subcommand
//!
//! Streams a file through SHA-512 and prints `<hex>  <size>  <path>`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use upd_core::{sha512_file, Sha512Digest};

/// Arguments for the `upd digest` subcommand.
#[derive(Args, Debug)]
pub struct DigestArgs {
    /// File to hash.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Execute the digest subcommand.
pub fn run_digest(args: &DigestArgs) -> Result<u8> {
    let (digest, size) = digest_file(&args.file)?;
    println!("{}  {}  {}", digest, size, args.file.display());
    Ok(0)
}

/// Digest and size of a regular file.
pub fn digest_file(path: &Path) -> Result<(Sha512Digest, u64)> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("failed to stat file: {}", path.display()))?;
    if !meta.is_file() {
        bail!("not a regular file: {}", path.display());
    }
    let digest = sha512_file(path, None)?;
    tracing::debug!(path = %path.display(), size = meta.len(), "digest computed");
    Ok((digest, meta.len()))
}
