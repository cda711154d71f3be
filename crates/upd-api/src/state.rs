//! # Application State
//!
//! Configuration and the explicitly constructed context shared by all route
//! handlers via the `State` extractor. Nothing here is global: tests build an
//! [`AppState`] over a temporary directory with an isolated digest cache.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use upd_core::{
    Arch, ArtifactResolver, DigestBudget, DigestCache, ManifestBuilder, Platform,
    ReleaseMetadata, TargetDefaults,
};

/// Digest deadline settings as they appear in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DigestTimeoutConfig {
    /// When false, digests run to completion regardless of duration.
    pub enabled: bool,
    pub base_secs: u64,
    pub per_mib_millis: u64,
}

impl Default for DigestTimeoutConfig {
    fn default() -> Self {
        let budget = DigestBudget::default();
        Self {
            enabled: true,
            base_secs: budget.base.as_secs(),
            per_mib_millis: budget.per_mib.as_millis() as u64,
        }
    }
}

impl DigestTimeoutConfig {
    pub fn budget(&self) -> Option<DigestBudget> {
        self.enabled.then(|| DigestBudget {
            base: Duration::from_secs(self.base_secs),
            per_mib: Duration::from_millis(self.per_mib_millis),
        })
    }
}

/// Server configuration. Every field has a default so a partial YAML file
/// (or none at all) is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address to bind, e.g. `0.0.0.0`.
    pub host: String,
    pub port: u16,
    /// Flat directory holding the installer artifacts.
    pub updates_dir: PathBuf,
    /// Public URL under which `updates_dir` is served. Defaults to
    /// `http://localhost:<port>/updates`.
    pub public_base_url: Option<String>,
    /// Product name used in artifact file names.
    pub product: String,
    /// Version currently offered to clients.
    pub version: String,
    pub default_platform: Platform,
    pub default_arch: Arch,
    pub release: ReleaseMetadata,
    /// Reported by `/health`.
    pub server_name: String,
    pub server_version: String,
    pub digest_timeout: DigestTimeoutConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let defaults = TargetDefaults::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            updates_dir: PathBuf::from("updates"),
            public_base_url: None,
            product: "App".to_string(),
            version: "1.0.0".to_string(),
            default_platform: defaults.platform,
            default_arch: defaults.arch,
            release: ReleaseMetadata::default(),
            server_name: "Update Server".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            digest_timeout: DigestTimeoutConfig::default(),
        }
    }
}

impl AppConfig {
    /// Base URL embedded in JSON manifests.
    pub fn public_base_url(&self) -> String {
        self.public_base_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}/updates", self.port))
    }

    pub fn target_defaults(&self) -> TargetDefaults {
        TargetDefaults {
            platform: self.default_platform,
            arch: self.default_arch,
        }
    }

    /// Release metadata with the name derived from product and version when
    /// none is configured.
    pub fn release_metadata(&self) -> ReleaseMetadata {
        let mut release = self.release.clone();
        if release.name.is_empty() {
            release.name = format!("{} v{}", self.product, self.version);
        }
        release
    }
}

/// Shared application state passed to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub resolver: Arc<ArtifactResolver>,
    /// Process-lifetime digest cache; the only shared mutable state.
    pub digests: Arc<DigestCache>,
    pub manifests: Arc<ManifestBuilder>,
}

impl AppState {
    /// Build the state for `config` with an empty digest cache.
    pub fn new(config: AppConfig) -> Self {
        let digests = match config.digest_timeout.budget() {
            Some(budget) => DigestCache::with_budget(budget),
            None => DigestCache::new(),
        };
        Self::with_cache(config, Arc::new(digests))
    }

    /// Build the state around an existing digest cache.
    pub fn with_cache(config: AppConfig, digests: Arc<DigestCache>) -> Self {
        let resolver = ArtifactResolver::new(
            config.updates_dir.clone(),
            config.product.clone(),
            config.target_defaults(),
        );
        let manifests = ManifestBuilder::new(config.public_base_url(), config.release_metadata());
        Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            digests,
            manifests: Arc::new(manifests),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = AppConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.default_platform, Platform::Win32);
        assert_eq!(config.default_arch, Arch::X64);
        assert_eq!(config.public_base_url(), "http://localhost:3000/updates");
    }

    #[test]
    fn explicit_base_url_wins() {
        let config = AppConfig {
            public_base_url: Some("https://cdn.example.com/app".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(config.public_base_url(), "https://cdn.example.com/app");
    }

    #[test]
    fn release_name_derived_when_empty() {
        let config = AppConfig {
            product: "Editor".to_string(),
            version: "1.2.0".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.release_metadata().name, "Editor v1.2.0");
    }

    #[test]
    fn digest_timeout_can_be_disabled() {
        let disabled = DigestTimeoutConfig {
            enabled: false,
            ..DigestTimeoutConfig::default()
        };
        assert!(disabled.budget().is_none());

        let config = AppConfig {
            digest_timeout: disabled,
            ..AppConfig::default()
        };
        assert!(AppState::new(config).digests.budget().is_none());
    }

    #[test]
    fn state_wires_resolver_from_config() {
        let config = AppConfig {
            updates_dir: PathBuf::from("/srv/updates"),
            product: "Editor".to_string(),
            default_platform: Platform::Linux,
            ..AppConfig::default()
        };
        let state = AppState::new(config);
        assert_eq!(state.resolver.root(), std::path::Path::new("/srv/updates"));
        assert_eq!(state.resolver.product(), "Editor");
        assert_eq!(state.resolver.defaults().platform, Platform::Linux);
        assert!(state.digests.budget().is_some());
    }
}
