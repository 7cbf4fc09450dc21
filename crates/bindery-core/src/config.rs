//! Database configuration
//!
//! `DatabaseConfig` is what `initialize`/`init_app` hand to the engine
//! cache: a primary URI, optional named binds and pool settings.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core_types::mask_uri;
use crate::errors::{BinderyError, Result};
use crate::model::naming::is_valid_identifier;
use crate::settings::{
    Settings, BINDS_KEY, DATABASE_URI_KEY, ECHO_KEY, POOL_SIZE_KEY, POOL_TIMEOUT_KEY,
};

const DEFAULT_POOL_SIZE: usize = 5;
const DEFAULT_POOL_TIMEOUT_MS: u64 = 30_000;

fn default_pool_size() -> usize {
    DEFAULT_POOL_SIZE
}

fn default_pool_timeout_ms() -> u64 {
    DEFAULT_POOL_TIMEOUT_MS
}

/// Connection pool settings applied to every engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum open connections for file-backed stores (in-memory stores always use one)
    #[serde(default = "default_pool_size")]
    pub size: usize,
    /// How long a checkout waits before failing
    #[serde(default = "default_pool_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_POOL_SIZE,
            timeout_ms: DEFAULT_POOL_TIMEOUT_MS,
        }
    }
}

/// Primary URI plus named binds
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    #[serde(default)]
    pub binds: BTreeMap<String, String>,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub echo: bool,
}

impl DatabaseConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            binds: BTreeMap::new(),
            pool: PoolConfig::default(),
            echo: false,
        }
    }

    pub fn with_bind(mut self, name: impl Into<String>, uri: impl Into<String>) -> Self {
        self.binds.insert(name.into(), uri.into());
        self
    }

    pub fn with_binds<I, K, V>(mut self, binds: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, uri) in binds {
            self.binds.insert(name.into(), uri.into());
        }
        self
    }

    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// URI for a bind (`None` = primary)
    pub fn bind_uri(&self, bind: Option<&str>) -> Result<&str> {
        match bind {
            None => Ok(&self.uri),
            Some(name) => self
                .binds
                .get(name)
                .map(String::as_str)
                .ok_or_else(|| BinderyError::UnknownBind {
                    bind: name.to_string(),
                }),
        }
    }

    pub fn has_bind(&self, name: &str) -> bool {
        self.binds.contains_key(name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.uri.trim().is_empty() {
            return Err(BinderyError::InvalidSetting {
                key: DATABASE_URI_KEY.to_string(),
                reason: "URI is empty".to_string(),
            });
        }
        for name in self.binds.keys() {
            if !is_valid_identifier(name) {
                return Err(BinderyError::InvalidSetting {
                    key: BINDS_KEY.to_string(),
                    reason: format!("bind name '{}' is not a valid identifier", name),
                });
            }
        }
        if self.pool.size == 0 {
            return Err(BinderyError::InvalidSetting {
                key: POOL_SIZE_KEY.to_string(),
                reason: "pool size must be at least 1".to_string(),
            });
        }
        if self.pool.timeout_ms == 0 {
            return Err(BinderyError::InvalidSetting {
                key: POOL_TIMEOUT_KEY.to_string(),
                reason: "pool timeout must be at least 1 ms".to_string(),
            });
        }
        Ok(())
    }

    /// Build from a host settings object
    ///
    /// `BINDERY_DATABASE_URI` is required; every other key is optional.
    pub fn from_settings<S: Settings + ?Sized>(settings: &S) -> Result<Self> {
        let uri = match settings.get(DATABASE_URI_KEY) {
            Some(Value::String(uri)) => uri,
            Some(_) => return Err(invalid(DATABASE_URI_KEY, "expected a string")),
            None => {
                return Err(BinderyError::MissingSetting {
                    key: DATABASE_URI_KEY.to_string(),
                })
            }
        };
        let mut config = DatabaseConfig::new(uri);

        match settings.get(BINDS_KEY) {
            None | Some(Value::Null) => {}
            Some(Value::Object(binds)) => {
                for (name, uri) in binds {
                    match uri {
                        Value::String(uri) => config.binds.insert(name, uri),
                        _ => return Err(invalid(BINDS_KEY, "bind URIs must be strings")),
                    };
                }
            }
            Some(_) => return Err(invalid(BINDS_KEY, "expected a table of bind name to URI")),
        }

        if let Some(size) = settings.get(POOL_SIZE_KEY) {
            let size = size
                .as_u64()
                .ok_or_else(|| invalid(POOL_SIZE_KEY, "expected a positive integer"))?;
            config.pool.size = usize::try_from(size)
                .map_err(|_| invalid(POOL_SIZE_KEY, "value is too large"))?;
        }

        if let Some(timeout) = settings.get(POOL_TIMEOUT_KEY) {
            config.pool.timeout_ms = timeout
                .as_u64()
                .ok_or_else(|| invalid(POOL_TIMEOUT_KEY, "expected milliseconds"))?;
        }

        if let Some(echo) = settings.get(ECHO_KEY) {
            config.echo = echo
                .as_bool()
                .ok_or_else(|| invalid(ECHO_KEY, "expected a boolean"))?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn invalid(key: &str, reason: &str) -> BinderyError {
    BinderyError::InvalidSetting {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let binds: BTreeMap<&str, String> = self
            .binds
            .iter()
            .map(|(k, v)| (k.as_str(), mask_uri(v)))
            .collect();
        f.debug_struct("DatabaseConfig")
            .field("uri", &mask_uri(&self.uri))
            .field("binds", &binds)
            .field("pool", &self.pool)
            .field("echo", &self.echo)
            .finish()
    }
}
