//! Host application settings
//!
//! The framework adapter reads its configuration from whatever settings
//! object the host application keeps. Anything implementing [`Settings`]
//! works; [`AppSettings`] is a ready-made key/value store that loads from
//! TOML and `BINDERY_*` environment variables.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};

use crate::errors::{BinderyError, Result};

/// Primary database URI
pub const DATABASE_URI_KEY: &str = "BINDERY_DATABASE_URI";
/// Table of bind name → URI
pub const BINDS_KEY: &str = "BINDERY_BINDS";
/// Maximum connections per file-backed engine
pub const POOL_SIZE_KEY: &str = "BINDERY_POOL_SIZE";
/// Milliseconds to wait for a pooled connection
pub const POOL_TIMEOUT_KEY: &str = "BINDERY_POOL_TIMEOUT_MS";
/// Log every statement at debug level
pub const ECHO_KEY: &str = "BINDERY_ECHO";

const ENV_PREFIX: &str = "BINDERY_";

/// Read access to a host settings object
pub trait Settings {
    fn get(&self, key: &str) -> Option<Value>;
}

impl Settings for HashMap<String, Value> {
    fn get(&self, key: &str) -> Option<Value> {
        HashMap::get(self, key).cloned()
    }
}

impl Settings for Map<String, Value> {
    fn get(&self, key: &str) -> Option<Value> {
        Map::get(self, key).cloned()
    }
}

/// Application settings as a flat key → JSON value map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppSettings {
    values: Map<String, Value>,
}

impl AppSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.values.get(key).and_then(Value::as_u64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    /// Parse settings from a TOML document (top-level keys only)
    ///
    /// ```
    /// use bindery_core::settings::{AppSettings, Settings, DATABASE_URI_KEY};
    ///
    /// let settings = AppSettings::from_toml_str(r#"
    ///     BINDERY_DATABASE_URI = "sqlite://"
    ///     [BINDERY_BINDS]
    ///     reports = "sqlite:///reports.db"
    /// "#).unwrap();
    /// assert_eq!(settings.get(DATABASE_URI_KEY).unwrap(), "sqlite://");
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(source)?;
        match serde_json::to_value(table)? {
            Value::Object(values) => Ok(Self { values }),
            _ => Err(BinderyError::Serialization {
                message: "settings document is not a table".to_string(),
            }),
        }
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| BinderyError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    /// Overlay `BINDERY_*` variables from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(std::env::vars())
    }

    /// Overlay `BINDERY_*` pairs from any source
    ///
    /// Values that parse as JSON keep their JSON type (`{"one": "sqlite://"}`,
    /// `5`, `true`); anything else is taken as a string.
    pub fn with_overrides_from<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, raw) in vars {
            let key = key.into();
            if !key.starts_with(ENV_PREFIX) {
                continue;
            }
            let raw = raw.into();
            let value = serde_json::from_str::<Value>(&raw).unwrap_or(Value::String(raw));
            self.values.insert(key, value);
        }
        self
    }
}

impl Settings for AppSettings {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }
}
