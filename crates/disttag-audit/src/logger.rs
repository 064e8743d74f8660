//! Audit logger implementation.

use std::fmt::Debug;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::event::{AuditEvent, EventSeverity};

/// Backend trait for audit log storage.
pub trait LoggerBackend: Send + Sync + Debug {
    /// Logs an audit event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be logged.
    fn log(&self, event_json: &str) -> Result<(), LoggerError>;

    /// Flushes any buffered events.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&self) -> Result<(), LoggerError>;

    /// Returns the backend name for identification.
    fn name(&self) -> &'static str;
}

/// Errors that can occur during audit logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Serialization error
    #[error("Failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific error
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Audit logger that sends events to configured backends.
#[derive(Debug)]
pub struct AuditLogger {
    backends: Vec<Arc<dyn LoggerBackend>>,
    enabled: bool,
    /// Events below this severity are dropped.
    min_severity: EventSeverity,
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLogger {
    /// Creates a new audit logger with no backends.
    #[must_use]
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
            enabled: true,
            min_severity: EventSeverity::Info,
        }
    }

    /// Creates a builder for configuring the logger.
    #[must_use]
    pub fn builder() -> AuditLoggerBuilder {
        AuditLoggerBuilder::new()
    }

    /// Adds a backend to the logger.
    pub fn add_backend(&mut self, backend: Arc<dyn LoggerBackend>) {
        self.backends.push(backend);
    }

    /// Enables or disables the logger.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Sets the minimum severity level for logging.
    pub fn set_min_severity(&mut self, severity: EventSeverity) {
        self.min_severity = severity;
    }

    /// Logs an audit event to all configured backends.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be serialized.
    /// Backend errors are logged but do not cause this method to fail.
    pub fn log<E: AuditEvent>(&self, event: &E) -> Result<(), LoggerError> {
        if !self.enabled {
            debug!("Audit logging disabled, skipping event");
            return Ok(());
        }

        if event.severity() < self.min_severity {
            debug!(
                "Event severity {:?} below threshold {:?}, skipping",
                event.severity(),
                self.min_severity
            );
            return Ok(());
        }

        let json = serde_json::to_string(event)?;

        for backend in &self.backends {
            if let Err(e) = backend.log(&json) {
                error!(
                    "Failed to log event to backend {}: {}",
                    backend.name(),
                    e
                );
            }
        }

        Ok(())
    }

    /// Flushes all backends.
    ///
    /// # Errors
    ///
    /// Returns an error if any backend fails to flush.
    pub fn flush(&self) -> Result<(), LoggerError> {
        for backend in &self.backends {
            backend.flush()?;
        }
        Ok(())
    }

    /// Returns the number of configured backends.
    #[must_use]
    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    /// Returns whether the logger is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Builder for configuring an audit logger.
#[derive(Debug)]
pub struct AuditLoggerBuilder {
    backends: Vec<Arc<dyn LoggerBackend>>,
    enabled: bool,
    min_severity: EventSeverity,
}

impl Default for AuditLoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLoggerBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
            enabled: true,
            min_severity: EventSeverity::Info,
        }
    }

    /// Adds a backend to the logger.
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn LoggerBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    /// Enables or disables the logger.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the minimum severity level.
    #[must_use]
    pub const fn min_severity(mut self, severity: EventSeverity) -> Self {
        self.min_severity = severity;
        self
    }

    /// Builds the audit logger.
    #[must_use]
    pub fn build(self) -> AuditLogger {
        AuditLogger {
            backends: self.backends,
            enabled: self.enabled,
            min_severity: self.min_severity,
        }
    }
}

/// Tracing-based backend that logs events via tracing macros.
#[derive(Debug, Default)]
pub struct TracingBackend;

impl TracingBackend {
    /// Creates a new tracing backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LoggerBackend for TracingBackend {
    fn log(&self, event_json: &str) -> Result<(), LoggerError> {
        let value: serde_json::Value = serde_json::from_str(event_json)?;

        let outcome = value
            .get("outcome")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");

        match outcome {
            "failure" | "denied" => warn!(audit_event = %event_json, "Audit event"),
            _ => info!(audit_event = %event_json, "Audit event"),
        }

        Ok(())
    }

    fn flush(&self) -> Result<(), LoggerError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "tracing"
    }
}

/// Appends events to a file, one JSON document per line.
///
/// Every line is flushed to the file as soon as it is logged.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileBackend {
    /// Opens (or creates) `path` for appending.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its parent directory cannot be
    /// created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LoggerError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Returns the file events are appended to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LoggerBackend for FileBackend {
    fn log(&self, event_json: &str) -> Result<(), LoggerError> {
        let mut writer = self.writer.lock();
        writer.write_all(event_json.as_bytes())?;
        writer.write_all(b"\n")?;
        // Each event reaches the file before the request returns.
        writer.flush()?;
        Ok(())
    }

    fn flush(&self) -> Result<(), LoggerError> {
        self.writer.lock().flush()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// In-memory backend for testing.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    events: Mutex<Vec<String>>,
}

impl InMemoryBackend {
    /// Creates a new in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all logged events.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// Clears all logged events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl LoggerBackend for InMemoryBackend {
    fn log(&self, event_json: &str) -> Result<(), LoggerError> {
        self.events.lock().push(event_json.to_string());
        Ok(())
    }

    fn flush(&self) -> Result<(), LoggerError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}
