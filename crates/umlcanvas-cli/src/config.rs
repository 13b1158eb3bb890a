//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory),
//! and applies the environment overrides.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info, warn};
use thiserror::Error;

use umlcanvas::{UmlCanvasError, config::AppConfig};

/// Environment variable holding the language model API key.
pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";
/// Environment variable overriding the HTTP port.
pub const PORT_VAR: &str = "PORT";

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

impl From<ConfigError> for UmlCanvasError {
    fn from(err: ConfigError) -> Self {
        UmlCanvasError::Config(err.to_string())
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (umlcanvas/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed or names an invalid color
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, UmlCanvasError> {
    // 1. Try the explicitly provided path first if available
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    // 2. Try the local project directory
    let local_config = Path::new("umlcanvas/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    // 3. Try the platform-specific config directory
    if let Some(proj_dirs) = ProjectDirs::from("com", "umlcanvas", "umlcanvas") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    // 4. If no config is found, return default config
    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Apply the API key and port from the process environment.
pub fn apply_env_overrides(config: &mut AppConfig) {
    apply_overrides(
        config,
        env::var(API_KEY_VAR).ok(),
        env::var(PORT_VAR).ok(),
    );
}

fn apply_overrides(config: &mut AppConfig, api_key: Option<String>, port: Option<String>) {
    if let Some(api_key) = api_key.filter(|key| !key.trim().is_empty()) {
        debug!("Using API key from environment");
        config.llm_mut().set_api_key(api_key.trim());
    }

    if let Some(port) = port {
        match port.trim().parse::<u16>() {
            Ok(port) => config.server_mut().set_port(port),
            Err(_) => warn!(value = port.as_str(); "Ignoring invalid PORT"),
        }
    }
}

/// Load configuration from a TOML file
///
/// # Errors
///
/// Returns error if:
/// - File doesn't exist
/// - File cannot be read
/// - TOML parsing fails
/// - A configured color cannot be parsed
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, UmlCanvasError> {
    let path = path.as_ref();

    // Check if file exists
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    // Read file content
    let content = fs::read_to_string(path)?;

    // Parse TOML content
    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    config.style().background_color().map_err(ConfigError::Validation)?;
    config.style().stroke_color().map_err(ConfigError::Validation)?;

    Ok(config)
}
