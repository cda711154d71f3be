//! # Manifest Builder
//!
//! Turns an [`ArtifactRecord`] plus static release metadata into the
//! format-agnostic [`UpdateManifest`] value. Pure: no I/O, no shared state.
//!
//! Each [`FileEntry::url`] is absolute (public base URL + file name) while
//! [`UpdateManifest::path`] is the bare file name. The text renderer emits
//! only the bare name, the JSON renderer emits both, and clients depend on
//! that difference.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::resolver::ArtifactRecord;

/// Release fields taken from configuration, not derived from the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseMetadata {
    pub name: String,
    pub notes: String,
    /// Fixed release date. When absent the manifest is stamped with the
    /// time it is built.
    pub date: Option<DateTime<Utc>>,
}

/// One downloadable file of a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute download URL.
    pub url: String,
    pub sha512: String,
    pub size: u64,
}

/// Normalized update manifest, constructed fresh per response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManifest {
    pub version: String,
    pub files: Vec<FileEntry>,
    /// Primary artifact file name, relative to the updates root.
    pub path: String,
    pub sha512: String,
    /// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
    pub release_date: String,
    pub release_name: String,
    pub release_notes: String,
}

impl UpdateManifest {
    /// Size of the primary file, if the files list is populated.
    pub fn primary_size(&self) -> Option<u64> {
        self.files.first().map(|f| f.size)
    }
}

/// Format a timestamp the way update clients expect it.
pub fn format_release_date(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Join a public base URL and a file name with exactly one `/`.
pub fn download_url(base_url: &str, file_name: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), file_name)
}

/// Builds manifests for one public base URL and release.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    base_url: String,
    release: ReleaseMetadata,
}

impl ManifestBuilder {
    pub fn new(base_url: impl Into<String>, release: ReleaseMetadata) -> Self {
        Self {
            base_url: base_url.into(),
            release,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn release(&self) -> &ReleaseMetadata {
        &self.release
    }

    /// Build a manifest, stamping it with the current time when the release
    /// has no fixed date.
    pub fn build(&self, record: &ArtifactRecord) -> UpdateManifest {
        self.build_at(record, Utc::now())
    }

    /// Build a manifest as of `now`.
    pub fn build_at(&self, record: &ArtifactRecord, now: DateTime<Utc>) -> UpdateManifest {
        let sha512 = record.digest.to_hex();
        UpdateManifest {
            version: record.identity.version.clone(),
            files: vec![FileEntry {
                url: download_url(&self.base_url, &record.file_name),
                sha512: sha512.clone(),
                size: record.size,
            }],
            path: record.file_name.clone(),
            sha512,
            release_date: format_release_date(self.release.date.unwrap_or(now)),
            release_name: self.release.name.clone(),
            release_notes: self.release.notes.clone(),
        }
    }
}
