//! Server configuration.
//!
//! Loaded from YAML, for example:
//!
//! ```yaml
//! listen: 127.0.0.1:7001
//! data_dir: /var/lib/disttag
//! storage: file
//! tokens:
//!   - token: s3cr3t
//!     user: publisher
//!   - token: ci-token
//!     user: publisher
//!     automation: true
//! audit:
//!   enabled: true
//!   min_severity: info
//!   path: /var/log/disttag/audit.jsonl
//! ```

use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use disttag_audit::{AuditLogger, EventSeverity, FileBackend, TracingBackend};
use disttag_core::{Validate, ValidationError, ValidationErrors};
use disttag_registry::{default_data_dir, FileStore, InMemoryStore, PackageStore};
use serde::{Deserialize, Serialize};

use crate::error::ServerError;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 7001;

/// Where packages are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// One JSON document per package under `data_dir`.
    #[default]
    File,
    /// Process memory; lost on restart.
    Memory,
}

/// A static API token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    /// Bearer token value.
    pub token: String,
    /// Principal the token authenticates as.
    pub user: String,
    /// Token may only read.
    #[serde(default)]
    pub readonly: bool,
    /// Token was issued for CI.
    #[serde(default)]
    pub automation: bool,
}

impl TokenEntry {
    /// Creates a standard token for `user`.
    #[must_use]
    pub fn new(token: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: user.into(),
            readonly: false,
            automation: false,
        }
    }

    /// Marks the token read-only.
    #[must_use]
    pub const fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Marks the token as an automation token.
    #[must_use]
    pub const fn automation(mut self) -> Self {
        self.automation = true;
        self
    }
}

/// Audit log settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Whether audit events are recorded at all.
    pub enabled: bool,
    /// Events below this severity are dropped.
    pub min_severity: EventSeverity,
    /// Optional JSON-lines file; events always go to tracing.
    pub path: Option<PathBuf>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_severity: EventSeverity::Info,
            path: None,
        }
    }
}

impl AuditConfig {
    /// Builds the audit logger these settings describe.
    ///
    /// # Errors
    ///
    /// Returns an error if the audit file cannot be opened.
    pub fn build_logger(&self) -> Result<AuditLogger, ServerError> {
        let mut builder = AuditLogger::builder()
            .enabled(self.enabled)
            .min_severity(self.min_severity)
            .with_backend(Arc::new(TracingBackend::new()));

        if let Some(path) = &self.path {
            builder = builder.with_backend(Arc::new(FileBackend::open(path)?));
        }

        Ok(builder.build())
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub listen: SocketAddr,
    /// Root directory of the file store.
    pub data_dir: PathBuf,
    /// Store backend.
    pub storage: StorageKind,
    /// Static token table.
    pub tokens: Vec<TokenEntry>,
    /// Audit settings.
    pub audit: AuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            data_dir: default_data_dir(),
            storage: StorageKind::default(),
            tokens: Vec::new(),
            audit: AuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parses a YAML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or the configuration is
    /// invalid.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ServerError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ServerError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Sets the listen address.
    #[must_use]
    pub const fn with_listen(mut self, listen: SocketAddr) -> Self {
        self.listen = listen;
        self
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Sets the store backend.
    #[must_use]
    pub const fn with_storage(mut self, storage: StorageKind) -> Self {
        self.storage = storage;
        self
    }

    /// Adds a token to the table.
    #[must_use]
    pub fn with_token(mut self, token: TokenEntry) -> Self {
        self.tokens.push(token);
        self
    }

    /// Replaces the audit settings.
    #[must_use]
    pub fn with_audit(mut self, audit: AuditConfig) -> Self {
        self.audit = audit;
        self
    }

    /// Opens the configured store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file store cannot create its directories.
    pub fn open_store(&self) -> Result<Arc<dyn PackageStore>, ServerError> {
        Ok(match self.storage {
            StorageKind::File => Arc::new(FileStore::open(&self.data_dir)?),
            StorageKind::Memory => Arc::new(InMemoryStore::new()),
        })
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut seen = HashSet::new();

        for (index, entry) in self.tokens.iter().enumerate() {
            if entry.token.trim().is_empty() {
                errors.add(ValidationError::required(format!("tokens[{index}].token")));
            } else if !seen.insert(entry.token.as_str()) {
                errors.add(ValidationError::constraint(
                    format!("tokens[{index}].token"),
                    "token is listed more than once",
                ));
            }
            if entry.user.trim().is_empty() {
                errors.add(ValidationError::required(format!("tokens[{index}].user")));
            }
        }

        errors.into_result()
    }
}
