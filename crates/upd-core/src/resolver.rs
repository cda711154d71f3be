//! # Artifact Resolver
//!
//! Maps a logical request `(version, platform, arch)` onto a concrete file in
//! the flat updates directory. The directory contents are the only source of
//! truth: there is no registry, and a missing file is a definitive not-found
//! outcome. No alternate locations are searched and versions are never
//! fuzzy-matched.

use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use crate::digest::Sha512Digest;
use crate::error::UpdateError;
use crate::identity::{ArtifactIdentity, TargetDefaults};

/// Size and modification time of a file, used to validate cached digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub size: u64,
    pub modified: SystemTime,
}

impl Fingerprint {
    /// Stat `path` and capture its fingerprint.
    pub fn of(path: &Path) -> Result<Self, UpdateError> {
        let meta = std::fs::metadata(path).map_err(|e| UpdateError::io(path, e))?;
        Self::from_metadata(path, &meta)
    }

    fn from_metadata(path: &Path, meta: &std::fs::Metadata) -> Result<Self, UpdateError> {
        let modified = meta.modified().map_err(|e| UpdateError::io(path, e))?;
        Ok(Self {
            size: meta.len(),
            modified,
        })
    }
}

/// An artifact whose file exists but whose digest has not been attached yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedArtifact {
    pub identity: ArtifactIdentity,
    /// Bare file name, relative to the updates root.
    pub file_name: String,
    /// Absolute (root-joined) storage path.
    pub path: PathBuf,
    pub fingerprint: Fingerprint,
}

impl LocatedArtifact {
    /// Attach a digest, producing the full record.
    pub fn attest(self, digest: Sha512Digest) -> ArtifactRecord {
        ArtifactRecord {
            size: self.fingerprint.size,
            identity: self.identity,
            file_name: self.file_name,
            path: self.path,
            digest,
            verified_at: Utc::now(),
        }
    }
}

/// A resolved artifact with its integrity metadata.
///
/// Rebuilt per request from filesystem state; never shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub identity: ArtifactIdentity,
    pub file_name: String,
    pub path: PathBuf,
    pub size: u64,
    pub digest: Sha512Digest,
    /// When the digest was last confirmed against the file's fingerprint.
    pub verified_at: DateTime<Utc>,
}

/// Resolves artifact requests against one updates root.
#[derive(Debug, Clone)]
pub struct ArtifactResolver {
    root: PathBuf,
    product: String,
    defaults: TargetDefaults,
}

impl ArtifactResolver {
    pub fn new(root: impl Into<PathBuf>, product: impl Into<String>, defaults: TargetDefaults) -> Self {
        Self {
            root: root.into(),
            product: product.into(),
            defaults,
        }
    }

    /// The updates root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn defaults(&self) -> TargetDefaults {
        self.defaults
    }

    /// Resolve `version` for the requested target.
    ///
    /// Missing or unrecognised `platform`/`arch` tokens are replaced by the
    /// configured defaults before the file name is derived.
    pub fn resolve(
        &self,
        version: &str,
        platform: Option<&str>,
        arch: Option<&str>,
    ) -> Result<LocatedArtifact, UpdateError> {
        let (platform, arch) = self.defaults.select(platform, arch);
        let identity = ArtifactIdentity::new(self.product.clone(), version, platform, arch);
        self.resolve_identity(identity)
    }

    /// Resolve a fully specified identity.
    pub fn resolve_identity(&self, identity: ArtifactIdentity) -> Result<LocatedArtifact, UpdateError> {
        let file_name = identity.file_name();
        let path = self.root.join(&file_name);

        let meta = match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => {
                tracing::info!(file = %file_name, "expected artifact path is not a regular file");
                return Err(UpdateError::NotFound { file_name });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(file = %file_name, "update artifact does not exist");
                return Err(UpdateError::NotFound { file_name });
            }
            Err(e) => return Err(UpdateError::io(path, e)),
        };

        let fingerprint = Fingerprint::from_metadata(&path, &meta)?;
        tracing::debug!(
            file = %file_name,
            size = fingerprint.size,
            "resolved update artifact"
        );

        Ok(LocatedArtifact {
            identity,
            file_name,
            path,
            fingerprint,
        })
    }

    /// Map a download name onto a file directly under the root.
    ///
    /// The name must be one plain path component that does not start with a
    /// dot; anything else cannot name a file in the flat layout.
    pub fn locate_file(&self, file_name: &str) -> Result<PathBuf, UpdateError> {
        if !is_plain_file_name(file_name) {
            return Err(UpdateError::InvalidFileName(file_name.to_string()));
        }
        let path = self.root.join(file_name);
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(UpdateError::NotFound {
                file_name: file_name.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(UpdateError::NotFound {
                file_name: file_name.to_string(),
            }),
            Err(e) => Err(UpdateError::io(path, e)),
        }
    }
}

fn is_plain_file_name(name: &str) -> bool {
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
