use std::{path::PathBuf, time::Duration};

use config::{Config, FileFormat};
use serde::{Deserialize, Serialize};
use tracelogs_common::types::{ValidationError, time::WindowCapacity};
use tracelogs_sdk::config::ClientConfig;

use crate::error::{CliConfigError, CliError};

const USER_AGENT: &str = concat!("tracelogs-cli/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub auth_base_url: Option<String>,
    pub logs_base_url: Option<String>,
    pub window_capacity: Option<String>,
    pub request_timeout: Option<String>,
    pub output_dir: Option<PathBuf>,
}

#[cfg(target_os = "windows")]
pub fn config_dir() -> Result<PathBuf, CliConfigError> {
    let mut path = dirs::config_dir().ok_or(CliConfigError::DirNotFound)?;
    path.push("tracelogs");
    Ok(path)
}

#[cfg(not(target_os = "windows"))]
pub fn config_dir() -> Result<PathBuf, CliConfigError> {
    let mut path = dirs::home_dir().ok_or(CliConfigError::DirNotFound)?;
    path.push(".config");
    path.push("tracelogs");
    Ok(path)
}

fn config_path() -> Result<PathBuf, CliConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

fn file_source(path: &std::path::Path) -> config::File<config::FileSourceFile, FileFormat> {
    config::File::from(path).format(FileFormat::Toml)
}

pub fn load_config_file() -> Result<CliConfig, CliConfigError> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(CliConfig::default());
    }
    let builder = Config::builder().add_source(file_source(&path));
    Ok(builder.build()?.try_deserialize::<CliConfig>()?)
}

pub fn load_cli_config() -> Result<CliConfig, CliConfigError> {
    let path = config_path()?;
    let mut builder = Config::builder();
    if path.exists() {
        builder = builder.add_source(file_source(&path));
    }
    builder = builder.add_source(config::Environment::with_prefix("TRACELOGS"));
    Ok(builder.build()?.try_deserialize::<CliConfig>()?)
}

#[derive(
    Debug, Clone, Copy, clap::ValueEnum, strum::Display, strum::EnumString, strum::VariantNames,
)]
#[clap(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConfigKey {
    AuthBaseUrl,
    LogsBaseUrl,
    WindowCapacity,
    RequestTimeout,
    OutputDir,
}

impl CliConfig {
    pub fn get(&self, key: ConfigKey) -> Option<String> {
        match key {
            ConfigKey::AuthBaseUrl => self.auth_base_url.clone(),
            ConfigKey::LogsBaseUrl => self.logs_base_url.clone(),
            ConfigKey::WindowCapacity => self.window_capacity.clone(),
            ConfigKey::RequestTimeout => self.request_timeout.clone(),
            ConfigKey::OutputDir => self.output_dir.as_ref().map(|p| p.display().to_string()),
        }
    }

    pub fn set(&mut self, key: ConfigKey, value: String) -> Result<(), CliConfigError> {
        let invalid =
            |reason: String| CliConfigError::InvalidValue(key.to_string(), value.clone(), reason);
        match key {
            ConfigKey::AuthBaseUrl | ConfigKey::LogsBaseUrl => {
                ClientConfig::new(&value, &value).map_err(|e| invalid(e.to_string()))?;
                if matches!(key, ConfigKey::AuthBaseUrl) {
                    self.auth_base_url = Some(value);
                } else {
                    self.logs_base_url = Some(value);
                }
            }
            ConfigKey::WindowCapacity => {
                value
                    .parse::<WindowCapacity>()
                    .map_err(|e| invalid(e.to_string()))?;
                self.window_capacity = Some(value);
            }
            ConfigKey::RequestTimeout => {
                parse_timeout(&value).map_err(invalid)?;
                self.request_timeout = Some(value);
            }
            ConfigKey::OutputDir => self.output_dir = Some(PathBuf::from(value)),
        }
        Ok(())
    }

    pub fn unset(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::AuthBaseUrl => self.auth_base_url = None,
            ConfigKey::LogsBaseUrl => self.logs_base_url = None,
            ConfigKey::WindowCapacity => self.window_capacity = None,
            ConfigKey::RequestTimeout => self.request_timeout = None,
            ConfigKey::OutputDir => self.output_dir = None,
        }
    }
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    let timeout = humantime::parse_duration(value.trim()).map_err(|e| e.to_string())?;
    if timeout.is_zero() {
        return Err("timeout must be greater than zero".to_owned());
    }
    Ok(timeout)
}

pub fn save_cli_config(config: &CliConfig) -> Result<PathBuf, CliConfigError> {
    let path = config_path()?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(CliConfigError::Write)?;
    }

    let toml = toml::to_string(config).map_err(CliConfigError::Serialize)?;
    std::fs::write(&path, toml).map_err(CliConfigError::Write)?;

    Ok(path)
}

pub fn set_config_value(key: ConfigKey, value: String) -> Result<PathBuf, CliConfigError> {
    let mut config = load_config_file().unwrap_or_default();
    config.set(key, value)?;
    save_cli_config(&config)
}

pub fn unset_config_value(key: ConfigKey) -> Result<PathBuf, CliConfigError> {
    let mut config = load_config_file().unwrap_or_default();
    config.unset(key);
    save_cli_config(&config)
}

/// Configured window capacity, or the 90 minute default.
pub fn window_capacity(config: &CliConfig) -> Result<WindowCapacity, CliConfigError> {
    match &config.window_capacity {
        Some(raw) => raw.parse().map_err(|e: ValidationError| {
            CliConfigError::InvalidValue(
                ConfigKey::WindowCapacity.to_string(),
                raw.clone(),
                e.to_string(),
            )
        }),
        None => Ok(WindowCapacity::default()),
    }
}

pub fn client_config(config: &CliConfig) -> Result<ClientConfig, CliError> {
    let auth_base_url = config
        .auth_base_url
        .as_deref()
        .ok_or(CliConfigError::MissingAuthBaseUrl)?;
    let logs_base_url = config
        .logs_base_url
        .as_deref()
        .ok_or(CliConfigError::MissingLogsBaseUrl)?;

    let mut client_config = ClientConfig::new(auth_base_url, logs_base_url)
        .map_err(CliError::SdkInit)?
        .with_user_agent(USER_AGENT)
        .map_err(|e| CliError::InvalidArgs(miette::miette!("{e}")))?;

    if config.window_capacity.is_some() {
        client_config = client_config.with_window_capacity(window_capacity(config)?);
    }

    if let Some(timeout) = &config.request_timeout {
        let parsed = parse_timeout(timeout).map_err(|reason| {
            CliConfigError::InvalidValue(
                ConfigKey::RequestTimeout.to_string(),
                timeout.clone(),
                reason,
            )
        })?;
        client_config = client_config.with_request_timeout(parsed);
    }

    Ok(client_config)
}
