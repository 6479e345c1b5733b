//! Invite Token Entity
//!
//! One-time, time-bound secret enabling a deferred credential-setup
//! step. Only the digest of the raw token is ever persisted.

use chrono::{DateTime, Duration, Utc};
use kernel::id::InviteId;

use crate::domain::value_object::Email;

/// Raw token length in bytes (before URL-safe base64 encoding)
const RAW_TOKEN_BYTES: usize = 32;

/// What the invite is for; determines its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteKind {
    /// Onboarding invite for a freshly provisioned account (24h)
    Onboarding,
    /// Credential reset for an existing account (1h)
    CredentialReset,
}

/// Invite token record
///
/// Consumable at most once; a token past its expiry is invalid and is
/// deleted the next time it is looked up.
#[derive(Debug, Clone)]
pub struct InviteToken {
    pub invite_id: InviteId,
    /// Target mailbox
    pub email: Email,
    /// Display-name hint carried into the setup flow
    pub name_hint: String,
    /// SHA-256 hex digest of the raw token (never the raw token)
    pub token_digest: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl InviteToken {
    /// Issue a new invite token
    ///
    /// Returns the record to persist and the raw token to hand to the
    /// notification collaborator. The raw token never touches the store.
    pub fn issue(email: Email, name_hint: impl Into<String>, ttl: Duration) -> (Self, String) {
        let raw = platform::crypto::to_base64_url(&platform::crypto::random_bytes(RAW_TOKEN_BYTES));
        let now = Utc::now();

        let token = Self {
            invite_id: InviteId::new(),
            email,
            name_hint: name_hint.into(),
            token_digest: Self::digest_of(&raw),
            created_at: now,
            expires_at: now + ttl,
            used: false,
        };

        (token, raw)
    }

    /// Digest of a presented raw token, for lookup
    pub fn digest_of(raw: &str) -> String {
        platform::crypto::sha256_hex(raw.as_bytes())
    }

    /// Check if the token is past its expiry
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Check if the token is stale (expired or already consumed) and
    /// eligible for opportunistic deletion
    pub fn is_stale(&self) -> bool {
        self.used || self.is_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email::new("manager@example.com").unwrap()
    }

    #[test]
    fn test_issue_stores_digest_only() {
        let (token, raw) = InviteToken::issue(email(), "Nadia", Duration::hours(24));
        assert_ne!(token.token_digest, raw);
        assert_eq!(token.token_digest, InviteToken::digest_of(&raw));
        assert!(!token.used);
        assert!(!token.is_expired());
    }

    #[test]
    fn test_raw_tokens_unique() {
        let (_, raw_a) = InviteToken::issue(email(), "A", Duration::hours(1));
        let (_, raw_b) = InviteToken::issue(email(), "B", Duration::hours(1));
        assert_ne!(raw_a, raw_b);
    }

    #[test]
    fn test_expiry() {
        let (mut token, _) = InviteToken::issue(email(), "Nadia", Duration::hours(1));
        assert!(!token.is_expired());
        assert!(!token.is_stale());

        token.expires_at = Utc::now() - Duration::seconds(1);
        assert!(token.is_expired());
        assert!(token.is_stale());
    }

    #[test]
    fn test_used_is_stale() {
        let (mut token, _) = InviteToken::issue(email(), "Nadia", Duration::hours(24));
        token.used = true;
        assert!(token.is_stale());
        assert!(!token.is_expired());
    }
}
