//! Connection URI parsing
//!
//! Accepted forms:
//! - `sqlite://` and `sqlite:///:memory:`: a private in-memory store
//! - `sqlite:///relative/path.db`: a file relative to the working directory
//! - `sqlite:////absolute/path.db`: an absolute file path
//!
//! Query strings (`?mode=ro`) are ignored.

use std::fmt;
use std::path::{Path, PathBuf};

use bindery_core::errors::BinderyError;

const SCHEME: &str = "sqlite://";

/// Parsed location of a SQLite store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseUrl {
    Memory,
    File(PathBuf),
}

impl DatabaseUrl {
    pub fn parse(uri: &str) -> Result<Self, BinderyError> {
        let unsupported = || BinderyError::UnsupportedUri {
            uri: uri.to_string(),
        };

        let rest = uri.trim().strip_prefix(SCHEME).ok_or_else(unsupported)?;
        let rest = rest.split('?').next().unwrap_or("");

        if rest.is_empty() {
            return Ok(DatabaseUrl::Memory);
        }
        // Anything before the third slash would be a host, which SQLite has no use for
        let path = rest.strip_prefix('/').ok_or_else(unsupported)?;
        match path {
            "" | ":memory:" => Ok(DatabaseUrl::Memory),
            _ => Ok(DatabaseUrl::File(PathBuf::from(path))),
        }
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, DatabaseUrl::Memory)
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            DatabaseUrl::Memory => None,
            DatabaseUrl::File(path) => Some(path),
        }
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseUrl::Memory => write!(f, "{}", SCHEME),
            DatabaseUrl::File(path) => write!(f, "{}/{}", SCHEME, path.display()),
        }
    }
}
