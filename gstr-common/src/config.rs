//! Configuration loading and root folder resolution
//!
//! Bootstrap settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or malformed TOML file is never fatal: a warning is logged and
//! the remaining sources are used.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const ENV_ROOT_FOLDER: &str = "GSTR_ROOT_FOLDER";
pub const ENV_DATABASE: &str = "GSTR_DATABASE";
pub const ENV_PORT: &str = "GSTR_PORT";
pub const ENV_LLM_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_LLM_MODEL: &str = "GSTR_LLM_MODEL";
pub const ENV_LLM_BASE_URL: &str = "GSTR_LLM_BASE_URL";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DATABASE_FILE: &str = "gstr.db";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// Bootstrap configuration as written in the TOML file
///
/// Every field is optional; absent values fall through to environment
/// variables and compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the database and any working files
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Explicit database file (overrides `<root_folder>/gstr.db`)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    /// Seed demonstration vendors/invoices/users/alerts into empty tables
    #[serde(default)]
    pub seed_demo_data: Option<bool>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub llm: TomlLlmConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[llm]` table of the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlLlmConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_base_url: Option<String>,
    pub temperature: Option<f32>,
}

/// Resolved settings for the explanation layer's language model
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    /// No key means explanations are produced from templates only
    pub api_key: Option<String>,
    pub model: String,
    pub api_base_url: String,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_LLM_MODEL.to_string(),
            api_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            temperature: 0.0,
        }
    }
}

/// Values supplied on the command line (highest priority)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_file: Option<PathBuf>,
    pub root_folder: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved bootstrap configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub root_folder: PathBuf,
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub seed_demo_data: bool,
    pub log_level: String,
    pub llm: LlmSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI overrides, environment, TOML and defaults
    pub fn resolve(overrides: &CliOverrides) -> Self {
        let toml_path = overrides.config_file.clone().or_else(default_config_path);
        let toml = match toml_path {
            Some(path) => load_toml_config(&path),
            None => TomlConfig::default(),
        };
        Self::from_sources(overrides, &toml)
    }

    /// Resolve against an already-loaded TOML config
    pub fn from_sources(overrides: &CliOverrides, toml: &TomlConfig) -> Self {
        let root_folder = overrides
            .root_folder
            .clone()
            .or_else(|| env_path(ENV_ROOT_FOLDER))
            .or_else(|| toml.root_folder.clone())
            .unwrap_or_else(default_root_folder);

        let database_path = overrides
            .database
            .clone()
            .or_else(|| env_path(ENV_DATABASE))
            .or_else(|| toml.database_path.clone())
            .unwrap_or_else(|| root_folder.join(DEFAULT_DATABASE_FILE));

        let host = overrides
            .host
            .clone()
            .or_else(|| toml.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = overrides
            .port
            .or_else(env_port)
            .or(toml.port)
            .unwrap_or(DEFAULT_PORT);

        let llm = LlmSettings {
            api_key: env_string(ENV_LLM_API_KEY).or_else(|| toml.llm.api_key.clone()),
            model: env_string(ENV_LLM_MODEL)
                .or_else(|| toml.llm.model.clone())
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            api_base_url: env_string(ENV_LLM_BASE_URL)
                .or_else(|| toml.llm.api_base_url.clone())
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            temperature: toml.llm.temperature.unwrap_or(0.0),
        };

        Self {
            root_folder,
            database_path,
            host,
            port,
            seed_demo_data: toml.seed_demo_data.unwrap_or(true),
            log_level: toml.logging.level.clone(),
            llm,
        }
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Load a TOML config file, degrading to defaults on any failure
pub fn load_toml_config(path: &Path) -> TomlConfig {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Config file {} not readable ({}), using defaults", path.display(), e);
            return TomlConfig::default();
        }
    };

    match toml::from_str::<TomlConfig>(&content) {
        Ok(config) => {
            info!("Loaded configuration from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Config file {} is invalid ({}), using defaults", path.display(), e);
            TomlConfig::default()
        }
    }
}

/// First existing config file for the platform, if any
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("gstr").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/gstr/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("gstr"))
        .unwrap_or_else(|| PathBuf::from("./gstr_data"))
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_path(name: &str) -> Option<PathBuf> {
    env_string(name).map(PathBuf::from)
}

fn env_port() -> Option<u16> {
    let raw = env_string(ENV_PORT)?;
    match raw.parse::<u16>() {
        Ok(port) => Some(port),
        Err(_) => {
            warn!("Ignoring {}={}: not a valid port", ENV_PORT, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_parses_partial_file() {
        let toml: TomlConfig = toml::from_str(
            r#"
            port = 9100
            [llm]
            model = "gpt-4o-mini"
            "#,
        )
        .unwrap();

        assert_eq!(toml.port, Some(9100));
        assert_eq!(toml.logging.level, "info");
        assert_eq!(toml.llm.model.as_deref(), Some("gpt-4o-mini"));
        assert!(toml.root_folder.is_none());
    }

    #[test]
    fn test_cli_database_beats_toml() {
        let toml = TomlConfig {
            database_path: Some(PathBuf::from("/from/toml.db")),
            ..Default::default()
        };
        let overrides = CliOverrides {
            database: Some(PathBuf::from("/from/cli.db")),
            ..Default::default()
        };

        let config = AppConfig::from_sources(&overrides, &toml);
        assert_eq!(config.database_path, PathBuf::from("/from/cli.db"));
    }

    #[test]
    fn test_bind_address() {
        let overrides = CliOverrides {
            host: Some("0.0.0.0".to_string()),
            port: Some(8123),
            ..Default::default()
        };
        let config = AppConfig::from_sources(&overrides, &TomlConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:8123");
    }
}
