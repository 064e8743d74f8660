//! Audit event definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::{Timestamp, Uuid};

/// Generates a new v7 UUID for audit events.
fn new_event_id() -> Uuid {
    let ts = Timestamp::now(uuid::NoContext);
    Uuid::new_v7(ts)
}

/// Severity level for audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    /// Informational event
    #[default]
    Info,
    /// Warning event
    Warning,
    /// Error event
    Error,
    /// Critical event requiring immediate attention
    Critical,
}

/// Outcome of an audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded
    Success,
    /// Operation failed
    Failure,
    /// Operation was denied
    Denied,
}

/// Base trait for all audit events.
pub trait AuditEvent: Serialize {
    /// Returns the event type identifier.
    fn event_type(&self) -> &'static str;

    /// Returns the event severity.
    fn severity(&self) -> EventSeverity;

    /// Returns the event timestamp.
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Dist-tag mutation events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagEvent {
    /// Unique event ID
    pub id: Uuid,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,

    /// Type of tag event
    pub event_type: TagEventType,

    /// Fully-qualified package name
    pub package: String,

    /// Tag name (trimmed)
    pub tag: String,

    /// Version the tag points at after the event (or pointed at before removal)
    pub version: String,

    /// Version the tag pointed at before an overwrite
    pub previous_version: Option<String>,

    /// Principal who triggered the event
    pub actor: String,

    /// Kind of token used (`standard`, `automation`)
    pub token_kind: Option<String>,

    /// Event outcome
    pub outcome: EventOutcome,
}

/// Types of tag events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagEventType {
    /// Tag was created or moved
    Saved,
    /// Tag was removed
    Removed,
}

impl TagEvent {
    /// Creates a new tag saved event.
    #[must_use]
    pub fn saved(package: &str, tag: &str, version: &str, actor: &str) -> Self {
        Self::new(TagEventType::Saved, package, tag, version, actor)
    }

    /// Creates a new tag removed event.
    #[must_use]
    pub fn removed(package: &str, tag: &str, version: &str, actor: &str) -> Self {
        Self::new(TagEventType::Removed, package, tag, version, actor)
    }

    fn new(event_type: TagEventType, package: &str, tag: &str, version: &str, actor: &str) -> Self {
        Self {
            id: new_event_id(),
            timestamp: Utc::now(),
            event_type,
            package: package.to_string(),
            tag: tag.to_string(),
            version: version.to_string(),
            previous_version: None,
            actor: actor.to_string(),
            token_kind: None,
            outcome: EventOutcome::Success,
        }
    }

    /// Sets the version the tag pointed at before.
    #[must_use]
    pub fn with_previous_version(mut self, previous: &str) -> Self {
        self.previous_version = Some(previous.to_string());
        self
    }

    /// Sets the token kind.
    #[must_use]
    pub fn with_token_kind(mut self, kind: &str) -> Self {
        self.token_kind = Some(kind.to_string());
        self
    }
}

impl AuditEvent for TagEvent {
    fn event_type(&self) -> &'static str {
        match self.event_type {
            TagEventType::Saved => "tag.saved",
            TagEventType::Removed => "tag.removed",
        }
    }

    fn severity(&self) -> EventSeverity {
        match self.outcome {
            EventOutcome::Success => EventSeverity::Info,
            EventOutcome::Failure | EventOutcome::Denied => EventSeverity::Warning,
        }
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Authorization decision events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationEvent {
    /// Unique event ID
    pub id: Uuid,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,

    /// Fully-qualified package name
    pub package: String,

    /// Operation being authorized (`save_tag`, `remove_tag`, `publish`)
    pub operation: String,

    /// Principal that made the request
    pub principal: String,

    /// Kind of token used
    pub token_kind: String,

    /// Authorization decision
    pub allowed: bool,

    /// Machine-readable denial code
    pub code: Option<String>,

    /// Human-readable reason
    pub reason: Option<String>,

    /// Event outcome
    pub outcome: EventOutcome,
}

impl AuthorizationEvent {
    /// Creates a new authorization denied event.
    #[must_use]
    pub fn denied(
        package: &str,
        operation: &str,
        principal: &str,
        token_kind: &str,
        code: &str,
        reason: &str,
    ) -> Self {
        Self {
            id: new_event_id(),
            timestamp: Utc::now(),
            package: package.to_string(),
            operation: operation.to_string(),
            principal: principal.to_string(),
            token_kind: token_kind.to_string(),
            allowed: false,
            code: Some(code.to_string()),
            reason: Some(reason.to_string()),
            outcome: EventOutcome::Denied,
        }
    }
}

impl AuditEvent for AuthorizationEvent {
    fn event_type(&self) -> &'static str {
        if self.allowed {
            "authorization.allowed"
        } else {
            "authorization.denied"
        }
    }

    fn severity(&self) -> EventSeverity {
        if self.allowed {
            EventSeverity::Info
        } else {
            EventSeverity::Warning
        }
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_event_saved() {
        let event = TagEvent::saved("@cnpm/koa", "beta", "1.0.0", "publisher")
            .with_previous_version("0.9.0")
            .with_token_kind("automation");

        assert_eq!(event.event_type, TagEventType::Saved);
        assert_eq!(event.package, "@cnpm/koa");
        assert_eq!(event.tag, "beta");
        assert_eq!(event.previous_version.as_deref(), Some("0.9.0"));
        assert_eq!(event.token_kind.as_deref(), Some("automation"));
        assert_eq!(event.outcome, EventOutcome::Success);
        assert_eq!(AuditEvent::event_type(&event), "tag.saved");
        assert_eq!(event.severity(), EventSeverity::Info);
    }

    #[test]
    fn test_tag_event_removed() {
        let event = TagEvent::removed("@cnpm/koa", "beta", "1.0.0", "publisher");

        assert_eq!(AuditEvent::event_type(&event), "tag.removed");
        assert_eq!(event.version, "1.0.0");
        assert!(event.previous_version.is_none());
    }

    #[test]
    fn test_authorization_event_denied() {
        let event = AuthorizationEvent::denied(
            "@cnpm/koa",
            "save_tag",
            "other",
            "standard",
            "NOT_MAINTAINER",
            "\"other\" not authorized to modify @cnpm/koa",
        );

        assert!(!event.allowed);
        assert_eq!(event.outcome, EventOutcome::Denied);
        assert_eq!(event.code.as_deref(), Some("NOT_MAINTAINER"));
        assert_eq!(AuditEvent::event_type(&event), "authorization.denied");
        assert_eq!(event.severity(), EventSeverity::Warning);
    }

    #[test]
    fn test_event_ids_are_unique() {
        let a = TagEvent::saved("koa", "beta", "1.0.0", "publisher");
        let b = TagEvent::saved("koa", "beta", "1.0.0", "publisher");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_event_serialization() {
        let event = TagEvent::saved("@cnpm/koa", "beta", "1.0.0", "publisher");
        let json = serde_json::to_string(&event).unwrap();

        assert!(json.contains("\"event_type\":\"saved\""));
        assert!(json.contains("\"package\":\"@cnpm/koa\""));
        assert!(json.contains("\"outcome\":\"success\""));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(EventSeverity::Info < EventSeverity::Warning);
        assert!(EventSeverity::Error < EventSeverity::Critical);
    }
}
