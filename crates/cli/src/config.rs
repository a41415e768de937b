use anyhow::{Context, Result};
use labbook_assets::{HandlerId, HandlerPipeline, DEFAULT_HIDDEN};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "labbook";
const CONFIG_FILE: &str = "config.toml";
const UNKNOWN_USER: &str = "unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    pub user: UserConfig,
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct UserConfig {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ScanConfig {
    /// Handler names in pipeline order
    pub handlers: Option<Vec<String>>,
    /// Glob patterns for file names excluded from the tree
    pub hidden: Option<Vec<String>>,
}

impl Config {
    /// Load `explicit` if given (it must exist), else the per-user config
    /// file when present, else defaults.
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.is_file() => path,
                _ => {
                    log::debug!("No config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_toml(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub(crate) fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.handler_ids()?;
        Ok(config)
    }

    /// Author recorded on notes created from this process
    pub(crate) fn user_name(&self) -> String {
        self.user
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or_else(|| std::env::var("USER").ok().filter(|name| !name.trim().is_empty()))
            .unwrap_or_else(|| UNKNOWN_USER.to_string())
    }

    pub(crate) fn handler_ids(&self) -> Result<Vec<HandlerId>> {
        let Some(names) = &self.scan.handlers else {
            return Ok(HandlerId::ALL.to_vec());
        };
        names
            .iter()
            .map(|name| {
                HandlerId::from_name(name)
                    .with_context(|| format!("Unknown scan handler {name:?}"))
            })
            .collect()
    }

    pub(crate) fn hidden_patterns(&self) -> Vec<String> {
        match &self.scan.hidden {
            Some(patterns) => patterns.clone(),
            None => DEFAULT_HIDDEN.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub(crate) fn pipeline(&self) -> Result<HandlerPipeline> {
        let pipeline = HandlerPipeline::from_ids(&self.handler_ids()?, &self.hidden_patterns())
            .context("Invalid hidden file pattern")?;
        Ok(pipeline)
    }
}

pub(crate) fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Per-user data directory handed to scan requests
pub(crate) fn user_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR))
}
