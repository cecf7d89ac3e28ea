//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{DEFAULT_ADDR, DEFAULT_SANDBOX_TIMEOUT_SECS, DEFAULT_SANDBOX_URL};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },
}

#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Program used for every toolchain step.
    pub cargo_path: PathBuf,
    /// Shared temp-root; each build gets its own subdirectory.
    pub build_root: PathBuf,
    /// Remote fallback endpoint; an empty value disables the fallback.
    pub sandbox_url: Option<String>,
    pub sandbox_timeout: Duration,
    pub addr: String,
    /// Use the in-process stub toolchain instead of `cargo`.
    pub offline: bool,
}

impl BuilderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cargo_path = lookup("CONTRACT_BUILDER_CARGO")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("cargo"));
        let build_root = lookup("CONTRACT_BUILDER_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("contract-builder"));
        let sandbox_url = match lookup("CONTRACT_BUILDER_SANDBOX_URL") {
            Some(url) if url.trim().is_empty() => None,
            Some(url) => Some(url),
            None => Some(DEFAULT_SANDBOX_URL.to_string()),
        };
        let addr = lookup("CONTRACT_BUILDER_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());

        let sandbox_timeout = match lookup("CONTRACT_BUILDER_SANDBOX_TIMEOUT_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    key: "CONTRACT_BUILDER_SANDBOX_TIMEOUT_SECS".to_string(),
                    value,
                })?,
            None => Duration::from_secs(DEFAULT_SANDBOX_TIMEOUT_SECS),
        };

        let offline = match lookup("CONTRACT_BUILDER_OFFLINE") {
            Some(value) => parse_flag(&value).ok_or_else(|| ConfigError::Invalid {
                key: "CONTRACT_BUILDER_OFFLINE".to_string(),
                value,
            })?,
            None => false,
        };

        Ok(Self {
            cargo_path,
            build_root,
            sandbox_url,
            sandbox_timeout,
            addr,
            offline,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
