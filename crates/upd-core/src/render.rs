//! # Response Renderer
//!
//! Serializes an [`UpdateManifest`] into one of the wire formats update
//! clients consume:
//!
//! | Format     | Content type       | URL form        |
//! |------------|--------------------|-----------------|
//! | `json`     | `application/json` | absolute        |
//! | `yaml_like`| `text/yaml`        | bare file name  |
//!
//! The text format is filled from a literal template rather than produced by
//! a YAML serializer: legacy clients parse it by fixed structure, so key
//! order, indentation and quoting must be byte-exact. Values are inserted as
//! given, with no validation or escaping.

use std::fmt;
use std::str::FromStr;

use crate::error::UpdateError;
use crate::manifest::UpdateManifest;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const YAML_CONTENT_TYPE: &str = "text/yaml";

/// Supported manifest encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseFormat {
    Json,
    YamlLike,
}

impl ResponseFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => JSON_CONTENT_TYPE,
            Self::YamlLike => YAML_CONTENT_TYPE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::YamlLike => "yaml",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" | "yaml_like" => Ok(Self::YamlLike),
            other => Err(format!("unknown manifest format: {other:?} (expected json or yaml)")),
        }
    }
}

/// A rendered response body and its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub body: Vec<u8>,
    pub content_type: &'static str,
}

/// Serialize `manifest` as `format`.
pub fn render(manifest: &UpdateManifest, format: ResponseFormat) -> Result<Rendered, UpdateError> {
    let body = match format {
        ResponseFormat::Json => serde_json::to_vec(manifest)?,
        ResponseFormat::YamlLike => render_yaml_like(manifest).into_bytes(),
    };
    Ok(Rendered {
        body,
        content_type: format.content_type(),
    })
}

/// Fill the legacy `latest.yml` template.
///
/// Only the first file entry is emitted, and its `url` is the bare file name
/// from [`UpdateManifest::path`]. There is no trailing newline.
pub fn render_yaml_like(manifest: &UpdateManifest) -> String {
    let size = manifest
        .primary_size()
        .map(|s| s.to_string())
        .unwrap_or_default();
    let file_sha = manifest
        .files
        .first()
        .map(|f| f.sha512.as_str())
        .unwrap_or(manifest.sha512.as_str());

    format!(
        "version: {version}\n\
         files:\n  \
         - url: {path}\n    \
         sha512: {file_sha}\n    \
         size: {size}\n\
         path: {path}\n\
         sha512: {sha512}\n\
         releaseDate: '{release_date}'\n\
         releaseName: '{release_name}'\n\
         releaseNotes: '{release_notes}'",
        version = manifest.version,
        path = manifest.path,
        file_sha = file_sha,
        size = size,
        sha512 = manifest.sha512,
        release_date = manifest.release_date,
        release_name = manifest.release_name,
        release_notes = manifest.release_notes,
    )
}
