//! Configuration file loading for the CLI
//!
//! Configuration is read from the first TOML file found: an explicit path,
//! the local project directory, then the platform config directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use cartograph::{CartographError, config::AppConfig};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration `{}`: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Missing configuration file: {}", .0.display())]
    MissingFile(PathBuf),
}

impl From<ConfigError> for CartographError {
    fn from(err: ConfigError) -> Self {
        CartographError::Io(std::io::Error::other(err.to_string()))
    }
}

/// Find and load configuration
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (`cartograph/config.toml`)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, CartographError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("cartograph/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("rs", "cartograph", "cartograph") {
        let system_config = proj_dirs.config_dir().join("config.toml");
        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }
        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, CartographError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use cartograph::ast::{Direction, LayoutAlgorithm};
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_explicit_config_is_loaded() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
                [layout]
                direction = "LR"
                algorithm = "circular"
                spacing = 80.0

                [layout.circular]
                min_radius = 250.0

                [validation]
                max_depth = 3
                warnings_as_errors = true

                [metrics]
                enabled = true
            "#,
        )
        .expect("Failed to write config");

        let config = load_config(Some(&path)).expect("Config should load");
        assert_eq!(config.layout.direction, Some(Direction::LR));
        assert_eq!(config.layout.algorithm, Some(LayoutAlgorithm::Circular));
        assert_eq!(config.layout.spacing, 80.0);
        assert_eq!(config.layout.circular.min_radius, 250.0);
        assert_eq!(config.validation.max_depth, 3);
        assert!(config.validation.warnings_as_errors);
        assert!(config.metrics.enabled);
        assert!(!config.metrics.weighted);
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let dir = tempdir().expect("Failed to create temp directory");
        let result = load_config(Some(dir.path().join("absent.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_config_fails() {
        let dir = tempdir().expect("Failed to create temp directory");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[layout\nspacing = ").expect("Failed to write config");

        let err = load_config(Some(&path)).expect_err("Malformed TOML should fail");
        assert!(err.to_string().contains("Failed to parse TOML"));
    }
}
