//! # upd-core — Artifact Resolution and Integrity Attestation
//!
//! The domain core of the update distribution service. Every request is a
//! stateless pipeline:
//!
//! ```text
//! ArtifactResolver::resolve → DigestCache::attest → ManifestBuilder::build → render
//! ```
//!
//! - [`identity`] — `(product, version, platform, arch)` and the file naming policy.
//! - [`resolver`] — maps a request onto a file in the flat updates directory.
//! - [`digest`] — streaming SHA-512 with a fingerprint-validated, single-flight cache.
//! - [`manifest`] — builds the format-agnostic [`UpdateManifest`].
//! - [`render`] — JSON and the fixed `latest.yml` text template.
//!
//! ## Crate Policy
//!
//! - No HTTP types. The transport lives in `upd-api`.
//! - The filesystem is the source of truth; the digest cache is the only
//!   shared mutable state.
//! - No `.unwrap()` outside tests.

pub mod digest;
pub mod error;
pub mod identity;
pub mod manifest;
pub mod render;
pub mod resolver;

pub use digest::{sha512_file, CacheStats, DigestBudget, DigestCache, Sha512Digest};
pub use error::UpdateError;
pub use identity::{Arch, ArtifactIdentity, Platform, TargetDefaults, UnknownToken};
pub use manifest::{FileEntry, ManifestBuilder, ReleaseMetadata, UpdateManifest};
pub use render::{render, render_yaml_like, Rendered, ResponseFormat};
pub use resolver::{ArtifactRecord, ArtifactResolver, Fingerprint, LocatedArtifact};
