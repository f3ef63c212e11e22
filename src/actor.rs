//! Actor identity
//!
//! The identity attached to every document operation, carried into access
//! and audit log entries.

use serde::{Deserialize, Serialize};

/// Who performed an operation, and from where
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub user_role: Option<String>,
    pub session_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Actor {
    /// Create an actor with just a user id
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_role: None,
            session_id: None,
            ip_address: None,
            user_agent: None,
        }
    }

    /// Create a batch/system identity, e.g. "migration-script"
    pub fn system(name: impl Into<String>) -> Self {
        Self {
            user_id: name.into(),
            user_role: Some("system".to_string()),
            session_id: None,
            ip_address: None,
            user_agent: None,
        }
    }

    /// Set the user role
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.user_role = Some(role.into());
        self
    }

    /// Set the session id
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Set the source IP address
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let actor = Actor::new("ops-17")
            .with_role("admin")
            .with_session("sess-1")
            .with_ip("10.0.0.9");

        assert_eq!(actor.user_id, "ops-17");
        assert_eq!(actor.user_role.as_deref(), Some("admin"));
        assert_eq!(actor.session_id.as_deref(), Some("sess-1"));
        assert_eq!(actor.ip_address.as_deref(), Some("10.0.0.9"));
        assert!(actor.user_agent.is_none());
    }

    #[test]
    fn test_system_actor() {
        let actor = Actor::system("migration-script");
        assert_eq!(actor.user_id, "migration-script");
        assert_eq!(actor.user_role.as_deref(), Some("system"));
    }
}
