//! User preferences and the on-disk layout they point at.

use std::{
    env,
    path::{Path, PathBuf},
};

use dirs::home_dir;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    errors::{LedgerError, Result},
    ledger::Category,
    utils::persistence::{load_json, save_json_atomic},
};

const HOME_ENV: &str = "FINANCE_LEDGER_HOME";
const DEFAULT_DIR_NAME: &str = ".finance_ledger";
const CONFIG_FILE: &str = "config.json";

/// How record dates are rendered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DateStyle {
    /// `January 1, 2023`
    #[default]
    Long,
    /// `2023-01-01`
    Iso,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Where user record files live; defaults to the application directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "Config::default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default)]
    pub default_category: Category,
    #[serde(default)]
    pub date_style: DateStyle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            currency_symbol: Self::default_currency_symbol(),
            default_category: Category::Income,
            date_style: DateStyle::Long,
        }
    }
}

impl Config {
    fn default_currency_symbol() -> String {
        "$".into()
    }
}

/// Returns the application directory: `$FINANCE_LEDGER_HOME` or `~/.finance_ledger`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Loads and saves [`Config`] under a base directory.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&base)?;
        let path = base.join(CONFIG_FILE);
        Ok(Self { base, path })
    }

    /// Missing file means defaults; a malformed one is an error rather than silently reset.
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no config file; using defaults");
            return Ok(Config::default());
        }
        load_json(&self.path).map_err(|err| match err {
            LedgerError::Serde(inner) => {
                LedgerError::Config(format!("{}: {inner}", self.path.display()))
            }
            other => other,
        })
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        save_json_atomic(config, &self.path)
    }

    /// Root directory handed to the file-backed record store.
    pub fn data_root(&self, config: &Config) -> PathBuf {
        config.data_dir.clone().unwrap_or_else(|| self.base.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
