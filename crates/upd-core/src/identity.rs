//! # Artifact Identity — Naming Policy
//!
//! An artifact is identified by `(product, version, platform, arch)` and that
//! tuple maps to exactly one file name:
//!
//! ```text
//! <product>-<version>-<platform>-<arch>.<ext>
//! ```
//!
//! The extension follows the installer convention of the platform and is not
//! stored separately.
//!
//! ## Unknown tokens
//!
//! Query tokens that are absent or not recognised fall back to the configured
//! defaults instead of being rejected. This keeps old clients working but can
//! hide a misconfigured client, so every substitution of a supplied token is
//! logged at `warn`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Target operating system of an installer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Windows (NSIS `.exe` installers).
    Win32,
    /// macOS (`.dmg` images).
    Darwin,
    /// Linux (`.AppImage` bundles).
    Linux,
}

impl Platform {
    /// Every supported platform, in display order.
    pub const ALL: [Platform; 3] = [Platform::Win32, Platform::Darwin, Platform::Linux];

    /// Token used in query strings and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Win32 => "win32",
            Self::Darwin => "darwin",
            Self::Linux => "linux",
        }
    }

    /// Installer file extension for this platform, without the dot.
    pub fn installer_extension(&self) -> &'static str {
        match self {
            Self::Win32 => "exe",
            Self::Darwin => "dmg",
            Self::Linux => "AppImage",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = UnknownToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "win32" => Ok(Self::Win32),
            "darwin" => Ok(Self::Darwin),
            "linux" => Ok(Self::Linux),
            _ => Err(UnknownToken(s.to_string())),
        }
    }
}

/// CPU architecture of an installer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X64,
    Arm64,
    Ia32,
    Armv7l,
    Universal,
}

impl Arch {
    /// Every supported architecture, in display order.
    pub const ALL: [Arch; 5] = [
        Arch::X64,
        Arch::Arm64,
        Arch::Ia32,
        Arch::Armv7l,
        Arch::Universal,
    ];

    /// Token used in query strings and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X64 => "x64",
            Self::Arm64 => "arm64",
            Self::Ia32 => "ia32",
            Self::Armv7l => "armv7l",
            Self::Universal => "universal",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = UnknownToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x64" => Ok(Self::X64),
            "arm64" => Ok(Self::Arm64),
            "ia32" => Ok(Self::Ia32),
            "armv7l" => Ok(Self::Armv7l),
            "universal" => Ok(Self::Universal),
            _ => Err(UnknownToken(s.to_string())),
        }
    }
}

/// A platform or architecture token outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown target token: {0:?}")]
pub struct UnknownToken(pub String);

/// Platform/arch used when a request omits them or sends unknown tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDefaults {
    pub platform: Platform,
    pub arch: Arch,
}

impl Default for TargetDefaults {
    fn default() -> Self {
        Self {
            platform: Platform::Win32,
            arch: Arch::X64,
        }
    }
}

impl TargetDefaults {
    /// Pick the target for a request, substituting defaults for missing or
    /// unrecognised tokens.
    pub fn select(&self, platform: Option<&str>, arch: Option<&str>) -> (Platform, Arch) {
        let platform = match platform.filter(|p| !p.trim().is_empty()) {
            None => self.platform,
            Some(token) => token.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    token,
                    fallback = %self.platform,
                    "unrecognised platform token, using default"
                );
                self.platform
            }),
        };
        let arch = match arch.filter(|a| !a.trim().is_empty()) {
            None => self.arch,
            Some(token) => token.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    token,
                    fallback = %self.arch,
                    "unrecognised arch token, using default"
                );
                self.arch
            }),
        };
        (platform, arch)
    }
}

/// Logical identity of one installer artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactIdentity {
    pub product: String,
    /// Semantic version string, e.g. `"1.2.0"`.
    pub version: String,
    pub platform: Platform,
    pub arch: Arch,
}

impl ArtifactIdentity {
    pub fn new(
        product: impl Into<String>,
        version: impl Into<String>,
        platform: Platform,
        arch: Arch,
    ) -> Self {
        Self {
            product: product.into(),
            version: version.into(),
            platform,
            arch,
        }
    }

    /// The file name this identity maps to on storage.
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}-{}-{}.{}",
            self.product,
            self.version,
            self.platform,
            self.arch,
            self.platform.installer_extension()
        )
    }
}

impl fmt::Display for ArtifactIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}/{})",
            self.product, self.version, self.platform, self.arch
        )
    }
}
