//! Audit logging for the disttag distribution-tag registry.
//!
//! This crate records who changed which dist-tag, and who was turned away:
//! - Tag events (a tag was saved or removed)
//! - Authorization events (a mutation was denied)
//!
//! Events carry a UUID v7 id, a UTC timestamp, an outcome and a severity,
//! and are fanned out by an [`AuditLogger`] to any number of backends
//! ([`TracingBackend`], [`FileBackend`] for JSON lines, [`InMemoryBackend`]
//! for tests).
//!
//! # Example
//!
//! ```rust
//! use disttag_audit::{AuditLogger, InMemoryBackend, TagEvent};
//! use std::sync::Arc;
//!
//! let backend = Arc::new(InMemoryBackend::new());
//! let logger = AuditLogger::builder()
//!     .with_backend(backend.clone())
//!     .build();
//!
//! let event = TagEvent::saved("@cnpm/koa", "beta", "1.0.0", "publisher");
//! logger.log(&event).unwrap();
//! assert_eq!(backend.events().len(), 1);
//! ```

mod event;
mod logger;

pub use event::{
    AuditEvent, AuthorizationEvent, EventOutcome, EventSeverity, TagEvent, TagEventType,
};
pub use logger::{
    AuditLogger, AuditLoggerBuilder, FileBackend, InMemoryBackend, LoggerBackend, LoggerError,
    TracingBackend,
};
