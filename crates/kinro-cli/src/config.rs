//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory)
//! and applying the base URL overrides from the environment and the
//! command line.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use kinro::{KinroError, config::AppConfig};

/// Environment variable that overrides the configured base URL.
pub const API_URL_ENV: &str = "KINRO_API_URL";

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for KinroError {
    fn from(err: ConfigError) -> Self {
        KinroError::Config(err.to_string())
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (kinro/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, KinroError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("kinro/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "kinro", "kinro") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(
                path = system_config.display().to_string();
                "Loading configuration from system path"
            );
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Applies the base URL overrides. The command-line flag wins over the
/// environment, which wins over the configuration file.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] if the resulting URL is not an
/// `http` or `https` URL.
pub fn apply_overrides(
    config: AppConfig,
    env_url: Option<String>,
    flag_url: Option<&str>,
) -> Result<AppConfig, KinroError> {
    let config = match (flag_url, env_url) {
        (Some(url), _) => {
            debug!(url; "Base URL from command line");
            config.with_base_url(url)
        }
        (None, Some(url)) => {
            debug!(url = url.as_str(), variable = API_URL_ENV; "Base URL from environment");
            config.with_base_url(url)
        }
        (None, None) => config,
    };

    let base_url = config.backend().base_url();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::Validation(format!(
            "base URL `{base_url}` must start with http:// or https://"
        ))
        .into());
    }
    Ok(config)
}

fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, KinroError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;

    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[backend]\nbase_url = \"http://schemas.local:9000\"\n\n[layout]\nnode_width = 300\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();

        assert_eq!(config.backend().base_url(), "http://schemas.local:9000");
        assert_eq!(config.layout().node_width(), 300.0);
        assert_eq!(config.layout().vertical_spacing(), 80.0);
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempdir().unwrap();
        let result = load_config(Some(dir.path().join("absent.toml")));
        assert!(matches!(result, Err(KinroError::Config(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[layout\nnode_width = ").unwrap();

        let result = load_config(Some(&path));
        assert!(matches!(result, Err(KinroError::Config(message)) if message.contains("TOML")));
    }

    #[test]
    fn test_flag_wins_over_environment() {
        let config = apply_overrides(
            AppConfig::default(),
            Some("http://from-env:1".to_string()),
            Some("http://from-flag:2"),
        )
        .unwrap();
        assert_eq!(config.backend().base_url(), "http://from-flag:2");

        let config =
            apply_overrides(AppConfig::default(), Some("https://from-env".to_string()), None)
                .unwrap();
        assert_eq!(config.backend().base_url(), "https://from-env");
    }

    #[test]
    fn test_rejects_non_http_url() {
        let result = apply_overrides(AppConfig::default(), None, Some("ftp://server"));
        assert!(matches!(result, Err(KinroError::Config(_))));
    }
}
