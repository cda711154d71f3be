//! # Server Bootstrap
//!
//! Loads configuration and prepares the filesystem before the listener is
//! bound.
//!
//! ## Bootstrap Sequence
//!
//! 1. **Load Configuration** — defaults, then the YAML file named by
//!    `UPD_CONFIG` (if set), then environment overrides.
//! 2. **Prepare Updates Directory** — create it (recursively) if missing.
//! 3. **Build State** — resolver, digest cache and manifest builder.
//! 4. **Log Banner** — endpoints, directory and expected file names.
//!
//! ## Environment Overrides
//!
//! | Variable              | Field             |
//! |-----------------------|-------------------|
//! | `PORT`                | `port`            |
//! | `UPD_HOST`            | `host`            |
//! | `UPD_UPDATES_DIR`     | `updates_dir`     |
//! | `UPD_PUBLIC_BASE_URL` | `public_base_url` |
//! | `UPD_PRODUCT`         | `product`         |
//! | `UPD_VERSION`         | `version`         |
//! | `UPD_DEFAULT_PLATFORM`| `default_platform`|
//! | `UPD_DEFAULT_ARCH`    | `default_arch`    |
//! | `UPD_RELEASE_NAME`    | `release.name`    |
//! | `UPD_RELEASE_NOTES`   | `release.notes`   |

use std::path::{Path, PathBuf};

use upd_core::{ArtifactIdentity, Platform};

use crate::state::{AppConfig, AppState};

/// Environment variable naming the optional YAML configuration file.
pub const CONFIG_PATH_VAR: &str = "UPD_CONFIG";

/// Errors while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid YAML for [`AppConfig`].
    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors during server bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The updates directory could not be created.
    #[error("cannot create updates directory {}: {source}", path.display())]
    UpdatesDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Load configuration from `UPD_CONFIG` and the process environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let mut config = match std::env::var_os(CONFIG_PATH_VAR) {
        Some(path) => load_config_file(Path::new(&path))?,
        None => AppConfig::default(),
    };
    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    Ok(config)
}

/// Parse a YAML configuration file. Missing keys take their defaults.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse YAML configuration text. An empty document yields the defaults.
pub fn parse_config(text: &str) -> Result<AppConfig, serde_yaml::Error> {
    if text.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    serde_yaml::from_str(text)
}

/// Apply environment overrides using `lookup` to read variables.
///
/// Empty values are ignored.
pub fn apply_env_overrides(
    config: &mut AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

    if let Some(value) = get("PORT") {
        config.port = value.trim().parse().map_err(|e: std::num::ParseIntError| {
            ConfigError::InvalidEnv {
                var: "PORT",
                value: value.clone(),
                reason: e.to_string(),
            }
        })?;
    }
    if let Some(value) = get("UPD_HOST") {
        config.host = value;
    }
    if let Some(value) = get("UPD_UPDATES_DIR") {
        config.updates_dir = PathBuf::from(value);
    }
    if let Some(value) = get("UPD_PUBLIC_BASE_URL") {
        config.public_base_url = Some(value);
    }
    if let Some(value) = get("UPD_PRODUCT") {
        config.product = value;
    }
    if let Some(value) = get("UPD_VERSION") {
        config.version = value;
    }
    if let Some(value) = get("UPD_DEFAULT_PLATFORM") {
        config.default_platform = value.parse().map_err(|e: upd_core::UnknownToken| {
            ConfigError::InvalidEnv {
                var: "UPD_DEFAULT_PLATFORM",
                value: value.clone(),
                reason: e.to_string(),
            }
        })?;
    }
    if let Some(value) = get("UPD_DEFAULT_ARCH") {
        config.default_arch = value.parse().map_err(|e: upd_core::UnknownToken| {
            ConfigError::InvalidEnv {
                var: "UPD_DEFAULT_ARCH",
                value: value.clone(),
                reason: e.to_string(),
            }
        })?;
    }
    if let Some(value) = get("UPD_RELEASE_NAME") {
        config.release.name = value;
    }
    if let Some(value) = get("UPD_RELEASE_NOTES") {
        config.release.notes = value;
    }
    Ok(())
}

/// Create the updates directory if it does not exist.
pub fn prepare_updates_dir(dir: &Path) -> Result<(), BootstrapError> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|source| BootstrapError::UpdatesDir {
        path: dir.to_path_buf(),
        source,
    })?;
    tracing::info!(dir = %dir.display(), "created updates directory");
    Ok(())
}

/// Prepare the filesystem and build the application state.
pub fn bootstrap(config: AppConfig) -> Result<AppState, BootstrapError> {
    prepare_updates_dir(&config.updates_dir)?;
    let state = AppState::new(config);
    log_banner(&state.config);
    Ok(state)
}

/// Example file names for each platform, for the startup banner.
pub fn expected_file_names(config: &AppConfig) -> Vec<String> {
    Platform::ALL
        .iter()
        .map(|platform| {
            ArtifactIdentity::new(
                config.product.clone(),
                config.version.clone(),
                *platform,
                config.default_arch,
            )
            .file_name()
        })
        .collect()
}

fn log_banner(config: &AppConfig) {
    let base = format!("http://localhost:{}", config.port);
    tracing::info!(
        server = %config.server_name,
        version = %config.server_version,
        "update server starting"
    );
    tracing::info!(url = %format!("{base}/updates/latest"), "update check endpoint (json)");
    tracing::info!(url = %format!("{base}/updates/latest.yml"), "update check endpoint (yaml)");
    tracing::info!(url = %format!("{base}/health"), "health endpoint");
    tracing::info!(
        dir = %config.updates_dir.display(),
        public_base_url = %config.public_base_url(),
        "serving artifacts"
    );
    for name in expected_file_names(config) {
        tracing::info!(file = %name, "expected artifact name");
    }
}
