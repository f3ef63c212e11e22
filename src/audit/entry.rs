//! Audit log entry types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::actor::Actor;

/// The mutating operation an audit entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditOperation {
    Create,
    Update,
    Delete,
    Restore,
    Verify,
    Unverify,
}

impl AuditOperation {
    /// Returns the operation string
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOperation::Create => "CREATE",
            AuditOperation::Update => "UPDATE",
            AuditOperation::Delete => "DELETE",
            AuditOperation::Restore => "RESTORE",
            AuditOperation::Verify => "VERIFY",
            AuditOperation::Unverify => "UNVERIFY",
        }
    }
}

impl fmt::Display for AuditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single audit record; immutable once appended.
///
/// `old_values`/`new_values` are full row snapshots around the mutation;
/// `changed_fields` names the fields that actually differed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub document_id: Uuid,
    pub operation: AuditOperation,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub changed_fields: Vec<String>,
    pub user_id: String,
    pub user_role: Option<String>,
    pub session_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditLogEntry {
    /// Create an entry for an operation performed by an actor
    pub fn new(document_id: Uuid, operation: AuditOperation, actor: &Actor) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            operation,
            old_values: None,
            new_values: None,
            changed_fields: Vec::new(),
            user_id: actor.user_id.clone(),
            user_role: actor.user_role.clone(),
            session_id: actor.session_id.clone(),
            ip_address: actor.ip_address.clone(),
            user_agent: actor.user_agent.clone(),
            reason: None,
            timestamp: Utc::now(),
        }
    }

    /// Set the pre-mutation snapshot
    pub fn with_old_values(mut self, snapshot: Value) -> Self {
        self.old_values = Some(snapshot);
        self
    }

    /// Set the post-mutation snapshot
    pub fn with_new_values(mut self, snapshot: Value) -> Self {
        self.new_values = Some(snapshot);
        self
    }

    /// Set the changed field names
    pub fn with_changed_fields(mut self, fields: Vec<String>) -> Self {
        self.changed_fields = fields;
        self
    }

    /// Set the caller-supplied reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let actor = Actor::new("ops-3").with_role("admin").with_session("s-9");
        let entry = AuditLogEntry::new(Uuid::new_v4(), AuditOperation::Verify, &actor)
            .with_old_values(json!({"is_verified": false}))
            .with_new_values(json!({"is_verified": true}))
            .with_changed_fields(vec!["is_verified".into(), "verified_at".into()]);

        assert_eq!(entry.operation, AuditOperation::Verify);
        assert_eq!(entry.user_id, "ops-3");
        assert_eq!(entry.user_role.as_deref(), Some("admin"));
        assert_eq!(entry.changed_fields.len(), 2);
        assert!(entry.reason.is_none());
    }

    #[test]
    fn test_operation_serialized_uppercase() {
        let json = serde_json::to_string(&AuditOperation::Unverify).unwrap();
        assert_eq!(json, "\"UNVERIFY\"");
    }
}
