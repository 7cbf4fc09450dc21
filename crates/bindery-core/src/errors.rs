use bindery_core_types::SessionId;
use thiserror::Error;

/// Result type alias using BinderyError
pub type Result<T> = std::result::Result<T, BinderyError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code usable for programmatic handling
/// and in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Configuration
    Config,
    UnknownBind,
    UnsupportedUri,
    NotInitialized,

    // Declaration
    InvalidInput,
    AlreadyExists,
    UnmappedModel,
    NotFound,

    // Session lifecycle
    SessionClosed,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    Timeout,
    Concurrency,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::UnknownBind => "ERR_UNKNOWN_BIND",
            ExErrorKind::UnsupportedUri => "ERR_UNSUPPORTED_URI",
            ExErrorKind::NotInitialized => "ERR_NOT_INITIALIZED",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::UnmappedModel => "ERR_UNMAPPED_MODEL",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::SessionClosed => "ERR_SESSION_CLOSED",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Timeout => "ERR_TIMEOUT",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether this kind describes a configuration problem
    ///
    /// Unconfigured binds, bad URIs and use before initialization all
    /// surface as configuration errors to callers.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            ExErrorKind::Config
                | ExErrorKind::UnknownBind
                | ExErrorKind::UnsupportedUri
                | ExErrorKind::NotInitialized
        )
    }
}

/// Canonical structured error type
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    bind: Option<String>,
    table: Option<String>,
    entity_id: Option<String>,
    session_id: Option<SessionId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            bind: None,
            table: None,
            entity_id: None,
            session_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add bind context
    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = Some(bind.into());
        self
    }

    /// Add table context
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add entity ID context (type name, setting key, ...)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn bind(&self) -> Option<&str> {
        self.bind.as_deref()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(bind) = &self.bind {
            write!(f, " (bind: {})", bind)?;
        }
        if let Some(table) = &self.table {
            write!(f, " (table: {})", table)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain failures raised while declaring models and reading configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BinderyError {
    /// A bind name was referenced that has no configured URI
    #[error("Bind '{bind}' is not configured")]
    UnknownBind { bind: String },

    /// The database was used before `initialize`/`init_app`
    #[error("Database is not initialized: call initialize() or init_app() first")]
    NotInitialized,

    /// The connection URI uses a scheme this layer cannot open
    #[error("Unsupported database URI: {uri}")]
    UnsupportedUri { uri: String },

    /// A required setting is absent
    #[error("Missing setting: {key}")]
    MissingSetting { key: String },

    /// A setting is present but has the wrong shape
    #[error("Invalid setting {key}: {reason}")]
    InvalidSetting { key: String, reason: String },

    /// Two different model types claim the same table in one partition
    #[error("Table '{table}' is already registered in bind {bind}")]
    DuplicateTable { bind: String, table: String },

    /// A model type was used without being registered first
    #[error("Model {type_name} is not registered")]
    UnmappedModel { type_name: String },

    /// A table declaration is unusable (no columns, bad identifiers)
    #[error("Invalid table '{table}': {reason}")]
    InvalidTable { table: String, reason: String },

    /// Serialization error (settings decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Settings file could not be read
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },
}

impl From<BinderyError> for ExError {
    fn from(err: BinderyError) -> Self {
        match err {
            BinderyError::UnknownBind { bind } => ExError::new(ExErrorKind::UnknownBind)
                .with_bind(bind.clone())
                .with_entity_id(bind)
                .with_message("Bind is not configured"),

            BinderyError::NotInitialized => ExError::new(ExErrorKind::NotInitialized)
                .with_message("Database is not initialized"),

            BinderyError::UnsupportedUri { uri } => ExError::new(ExErrorKind::UnsupportedUri)
                .with_entity_id(bindery_core_types::mask_uri(&uri))
                .with_message("Unsupported database URI"),

            BinderyError::MissingSetting { key } => ExError::new(ExErrorKind::Config)
                .with_entity_id(key)
                .with_message("Missing setting"),

            BinderyError::InvalidSetting { key, reason } => ExError::new(ExErrorKind::Config)
                .with_entity_id(key)
                .with_message(format!("Invalid setting: {}", reason)),

            BinderyError::DuplicateTable { bind, table } => {
                ExError::new(ExErrorKind::AlreadyExists)
                    .with_bind(bind)
                    .with_table(table)
                    .with_message("Table is already registered in this bind")
            }

            BinderyError::UnmappedModel { type_name } => ExError::new(ExErrorKind::UnmappedModel)
                .with_entity_id(type_name)
                .with_message("Model is not registered"),

            BinderyError::InvalidTable { table, reason } => {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_table(table)
                    .with_message(reason)
            }

            BinderyError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            BinderyError::Io { path, message } => ExError::new(ExErrorKind::Io)
                .with_entity_id(path)
                .with_message(message),
        }
    }
}

impl From<serde_json::Error> for BinderyError {
    fn from(err: serde_json::Error) -> Self {
        BinderyError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for BinderyError {
    fn from(err: toml::de::Error) -> Self {
        BinderyError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_kinds_are_flagged() {
        assert!(ExErrorKind::UnknownBind.is_config());
        assert!(ExErrorKind::NotInitialized.is_config());
        assert!(!ExErrorKind::Persistence.is_config());
    }

    #[test]
    fn test_display_includes_code_and_bind() {
        let err: ExError = BinderyError::UnknownBind {
            bind: "reports".to_string(),
        }
        .into();
        let rendered = err.to_string();
        assert!(rendered.starts_with("[ERR_UNKNOWN_BIND]"));
        assert!(rendered.contains("(bind: reports)"));
    }

    #[test]
    fn test_source_chain_is_exposed() {
        let inner = ExError::new(ExErrorKind::Persistence).with_message("disk I/O error");
        let outer = ExError::new(ExErrorKind::Internal).with_source(inner);
        let source = std::error::Error::source(&outer).unwrap();
        assert!(source.to_string().contains("disk I/O error"));
    }
}
