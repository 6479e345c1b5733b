//! Session Entity
//!
//! Server-side session record referenced by a signed cookie token.

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, SessionId};
use std::time::Duration;

/// Session entity
///
/// At most one active session should exist per account; creating a new
/// session invalidates the prior ones (best-effort, see SessionManager).
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque, unguessable id (UUID v4)
    pub session_id: SessionId,
    pub account_id: AccountId,
    /// Absolute expiry (Unix timestamp ms)
    pub expires_at_ms: i64,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session
    ///
    /// TTL is provided by the application layer (config), not hard-coded
    /// here.
    pub fn new(account_id: AccountId, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            session_id: SessionId::new(),
            account_id,
            expires_at_ms: now.timestamp_millis() + ttl.as_millis() as i64,
            created_at: now,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::id::Id;

    #[test]
    fn test_fresh_session_not_expired() {
        let session = Session::new(Id::new(), Duration::from_secs(8 * 3600));
        assert!(!session.is_expired());
    }

    #[test]
    fn test_expired_session() {
        let mut session = Session::new(Id::new(), Duration::from_secs(1));
        session.expires_at_ms = Utc::now().timestamp_millis() - 1;
        assert!(session.is_expired());
    }
}
