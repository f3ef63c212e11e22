//! Access log entry types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actor::Actor;

/// The kind of touch recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    View,
    Download,
    Upload,
    Update,
    Delete,
}

impl AccessType {
    /// Returns the access type string
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::View => "view",
            AccessType::Download => "download",
            AccessType::Upload => "upload",
            AccessType::Update => "update",
            AccessType::Delete => "delete",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single access log record; immutable once appended
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessLogEntry {
    pub id: Uuid,
    pub document_id: Uuid,
    pub access_type: AccessType,
    pub accessed_by: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AccessLogEntry {
    /// Create a successful entry for an actor's touch
    pub fn new(document_id: Uuid, access_type: AccessType, actor: &Actor) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            access_type,
            accessed_by: actor.user_id.clone(),
            ip_address: actor.ip_address.clone(),
            user_agent: actor.user_agent.clone(),
            success: true,
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    /// Mark the entry failed with an error message
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.success = false;
        self.error_message = Some(message.into());
        self
    }
}
