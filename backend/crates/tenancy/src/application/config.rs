//! Application Configuration
//!
//! Configuration for the tenancy application layer.

use std::time::Duration;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

use crate::domain::value_object::Role;

/// Tenancy application configuration
#[derive(Debug, Clone)]
pub struct TenancyConfig {
    /// Secret key for HMAC-signing session tokens (32 bytes)
    pub session_secret: [u8; 32],
    /// Absolute session lifetime (8 hours)
    pub session_ttl: Duration,
    /// Onboarding invite lifetime (24 hours)
    pub invite_ttl: Duration,
    /// Credential-reset invite lifetime (1 hour)
    pub reset_ttl: Duration,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Prefix for the per-role session cookie names (pass-through config)
    pub cookie_prefix: String,
    /// Credential pepper (server-side secret, appended before hashing)
    pub pepper: Option<Vec<u8>>,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            session_secret: [0u8; 32],
            session_ttl: Duration::from_secs(8 * 3600), // 8 hours
            invite_ttl: Duration::from_secs(24 * 3600), // 24 hours
            reset_ttl: Duration::from_secs(3600),       // 1 hour
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            cookie_prefix: String::new(),
            pepper: None,
        }
    }
}

impl TenancyConfig {
    /// Create config with a random session secret (for development)
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self {
            session_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    /// Session cookie name for a role
    ///
    /// Each gateway role gets its own cookie so a shared terminal can
    /// hold, say, a cashier and a manager session side by side.
    pub fn cookie_name(&self, role: Role) -> String {
        format!("{}{}_session", self.cookie_prefix, role.code())
    }

    /// Session TTL in whole seconds (cookie Max-Age)
    pub fn session_ttl_secs(&self) -> u64 {
        self.session_ttl.as_secs()
    }

    /// Invite TTL for an invite kind
    pub fn invite_ttl_for(&self, kind: crate::domain::entity::invite::InviteKind) -> Duration {
        use crate::domain::entity::invite::InviteKind;
        match kind {
            InviteKind::Onboarding => self.invite_ttl,
            InviteKind::CredentialReset => self.reset_ttl,
        }
    }

    /// Get the credential pepper as a slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.pepper.as_deref()
    }
}
