//! Agent configuration.
//!
//! Resolution priority for the API endpoint:
//! 1. CLI flag (applied by the caller)
//! 2. Environment variable (STOCKTAKE_API_URL)
//! 3. Config file (~/.config/stocktake/config.toml)
//! 4. Default value
//!
//! Management credentials are only ever read from the environment or the
//! config file; they have no flag and no source-embedded default.

use crate::scanner::ManagementCredentials;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Default inventory API root
const DEFAULT_API_URL: &str = "http://localhost:4000";

/// Environment variable overrides
const ENV_API_URL: &str = "STOCKTAKE_API_URL";
const ENV_MANAGEMENT_USER: &str = "STOCKTAKE_MGMT_USER";
const ENV_MANAGEMENT_PASSWORD: &str = "STOCKTAKE_MGMT_PASSWORD";

/// Configuration file structure
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    inventory: Option<InventorySection>,
    management: Option<ManagementSection>,
}

#[derive(Debug, Deserialize, Default)]
struct InventorySection {
    /// API root URL, no trailing slash (e.g. "http://inventory:4000")
    api_url: Option<String>,
    /// Bearer token presented on every API call
    bearer: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ManagementSection {
    username: Option<String>,
    password: Option<String>,
}

/// Where the effective API URL came from (for the `config` display).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Default,
    Environment,
    ConfigFile,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::ConfigFile => write!(f, "config file"),
        }
    }
}

/// Resolved agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub api_url: String,
    pub source: ConfigSource,
    pub bearer: Option<String>,
    pub management: Option<ManagementCredentials>,
}

/// Get the path to the configuration file
fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .map(|p| p.join("stocktake").join("config.toml"))
}

/// Load configuration from the config file
fn load_config_file() -> Option<ConfigFile> {
    let path = config_file_path()?;

    if !path.exists() {
        return None;
    }

    match fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::debug!("Loaded config from {:?}", path);
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file {:?}: {}", path, e);
                None
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read config file {:?}: {}", path, e);
            None
        }
    }
}

/// Resolve the agent configuration from environment, file, and defaults.
pub fn load_config() -> AgentConfig {
    let file = load_config_file().unwrap_or_default();
    let inventory = file.inventory.unwrap_or_default();
    let management_section = file.management.unwrap_or_default();

    let bearer = inventory.bearer.filter(|t| !t.trim().is_empty());

    let (api_url, source) = resolve_api_url(inventory.api_url);

    let management = resolve_management(management_section);

    AgentConfig {
        api_url,
        source,
        bearer,
        management,
    }
}

fn resolve_api_url(from_file: Option<String>) -> (String, ConfigSource) {
    if let Ok(url) = std::env::var(ENV_API_URL) {
        let url = url.trim().trim_end_matches('/');
        if !url.is_empty() {
            tracing::info!("Using inventory API URL from environment variable: {}", url);
            return (url.to_string(), ConfigSource::Environment);
        }
    }

    if let Some(url) = from_file {
        let url = url.trim().trim_end_matches('/').to_string();
        if !url.is_empty() {
            tracing::info!("Using inventory API URL from config file: {}", url);
            return (url, ConfigSource::ConfigFile);
        }
    }

    tracing::debug!("Using default inventory API URL: {}", DEFAULT_API_URL);
    (DEFAULT_API_URL.to_string(), ConfigSource::Default)
}

fn resolve_management(section: ManagementSection) -> Option<ManagementCredentials> {
    let username = std::env::var(ENV_MANAGEMENT_USER)
        .ok()
        .filter(|v| !v.is_empty())
        .or(section.username)
        .filter(|v| !v.trim().is_empty())?;
    let password = std::env::var(ENV_MANAGEMENT_PASSWORD)
        .ok()
        .filter(|v| !v.is_empty())
        .or(section.password)
        .filter(|v| !v.is_empty())?;

    Some(ManagementCredentials { username, password })
}

/// Get the path to the config file for documentation purposes
pub fn config_file_path_string() -> String {
    config_file_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "~/.config/stocktake/config.toml".to_string())
}

/// Generate example config file content
pub fn example_config() -> String {
    r#"# Stocktake Agent Configuration
# Place this file at: ~/.config/stocktake/config.toml

[inventory]
# Inventory API root, no trailing slash
# api_url = "http://inventory.corp.lan:4000"

# Bearer token presented on every API call (or use --bearer / --basic-user)
# bearer = "..."

[management]
# Remote management (Windows CIM) credentials. Leave unset to disable
# management queries. Can also come from STOCKTAKE_MGMT_USER /
# STOCKTAKE_MGMT_PASSWORD.
# username = "os-admin"
# password = "..."
"#
    .to_string()
}
