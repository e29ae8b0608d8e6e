//! Configuration: a TOML file for the run settings, environment for secrets.

use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::Area;
use crate::scrapers::SearchParams;
use crate::warehouse::TableRef;

/// Environment variable holding the RapidAPI key.
pub const API_KEY_VAR: &str = "RAPIDAPI_KEY";
/// Environment variable holding the path of the warehouse credential file.
pub const WAREHOUSE_CREDENTIALS_VAR: &str = "WAREHOUSE_CREDENTIALS";

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "scout.toml";

/// Listings API settings (`[api]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL; `/listhomes` is appended.
    pub base_url: String,
    /// Value of the `x-rapidapi-host` header.
    pub host: String,
    /// Request timeout in seconds. Unset keeps the HTTP client default.
    pub request_timeout_secs: Option<u64>,
    #[serde(flatten)]
    pub search: SearchParams,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://idealista7.p.rapidapi.com".to_string(),
            host: "idealista7.p.rapidapi.com".to_string(),
            request_timeout_secs: None,
            search: SearchParams::default(),
        }
    }
}

/// Destination table settings (`[warehouse]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WarehouseConfig {
    /// Table name, optionally schema-qualified (`pisos.pisos_particular`).
    pub table: String,
    /// Natural key column.
    pub key_column: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            table: "pisos_particular".to_string(),
            key_column: "propertyCode".to_string(),
        }
    }
}

impl WarehouseConfig {
    pub fn table_ref(&self) -> TableRef {
        TableRef::new(&self.table, &self.key_column)
    }
}

/// Batch shaping settings (`[pipeline]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Only records with this `userType` are loaded.
    pub seller_type: String,
    /// Value written to the `category` column.
    pub category: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seller_type: "private".to_string(),
            category: "raw".to_string(),
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Areas to fetch, processed in this order.
    #[serde(default)]
    pub areas: Vec<Area>,
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        if config.areas.is_empty() {
            return Err(ConfigError::NoAreas);
        }
        Ok(config)
    }
}

/// Secrets supplied out of band.
#[derive(Debug)]
pub struct Secrets {
    pub api_key: SecretString,
    pub warehouse_credentials: PathBuf,
}

impl Secrets {
    /// Read both secrets from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read both secrets through `lookup`. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingSecret(key))
        };

        Ok(Self {
            api_key: SecretString::from(get(API_KEY_VAR)?),
            warehouse_credentials: PathBuf::from(get(WAREHOUSE_CREDENTIALS_VAR)?),
        })
    }
}
