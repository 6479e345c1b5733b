//! Session Manager
//!
//! Issues, validates, and revokes session tokens with
//! single-active-session semantics per account.

use std::sync::Arc;

use kernel::id::{AccountId, SessionId};

use crate::application::config::TenancyConfig;
use crate::domain::entity::session::Session;
use crate::domain::repository::SessionRepository;
use crate::error::{TenancyError, TenancyResult};

/// Session manager
pub struct SessionManager<S>
where
    S: SessionRepository,
{
    session_repo: Arc<S>,
    config: Arc<TenancyConfig>,
}

impl<S> SessionManager<S>
where
    S: SessionRepository,
{
    pub fn new(session_repo: Arc<S>, config: Arc<TenancyConfig>) -> Self {
        Self {
            session_repo,
            config,
        }
    }

    /// Create a session for an account, invalidating prior ones
    ///
    /// Prior-session deletion is best-effort and not atomic with the
    /// insert: a brief window with zero or two valid sessions can exist.
    /// Single-active-session is a soft guarantee, not a hard invariant.
    pub async fn create_session(&self, account_id: &AccountId) -> TenancyResult<String> {
        match self.session_repo.delete_all_for_account(account_id).await {
            Ok(n) if n > 0 => {
                tracing::debug!(account_id = %account_id, invalidated = n, "Prior sessions invalidated");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, account_id = %account_id, "Failed to clear prior sessions; continuing");
            }
        }

        let session = Session::new(*account_id, self.config.session_ttl);
        self.session_repo.create(&session).await?;

        Ok(self.sign_token(&session.session_id))
    }

    /// Validate a session token and return the subject account
    ///
    /// A missing or past-expiry record is Invalid; expired records are
    /// not deleted here - lazy cleanup reaps them separately.
    pub async fn validate(&self, token: &str) -> TenancyResult<AccountId> {
        let session_id = self.parse_token(token)?;

        let session = self
            .session_repo
            .find_by_id(session_id)
            .await?
            .ok_or(TenancyError::SessionInvalid)?;

        if session.is_expired() {
            return Err(TenancyError::SessionInvalid);
        }

        Ok(session.account_id)
    }

    /// Destroy the session behind a token; idempotent
    pub async fn destroy(&self, token: &str) -> TenancyResult<()> {
        let session_id = self.parse_token(token)?;
        self.session_repo.delete(session_id).await?;

        tracing::info!(session_id = %session_id, "Session destroyed");
        Ok(())
    }

    /// Generate signed session token
    fn sign_token(&self, session_id: &SessionId) -> String {
        use base64::Engine;
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        let id_str = session_id.to_string();

        let mut mac = Hmac::<Sha256>::new_from_slice(&self.config.session_secret)
            .expect("HMAC can take key of any size");
        mac.update(id_str.as_bytes());
        let signature = mac.finalize().into_bytes();

        format!(
            "{}.{}",
            id_str,
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(signature)
        )
    }

    /// Parse and verify a session token
    fn parse_token(&self, token: &str) -> TenancyResult<SessionId> {
        use base64::Engine;
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 2 {
            return Err(TenancyError::SessionInvalid);
        }

        let session_id_str = parts[0];
        let signature_b64 = parts[1];

        // Verify signature
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.config.session_secret)
            .expect("HMAC can take key of any size");
        mac.update(session_id_str.as_bytes());

        let signature = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TenancyError::SessionInvalid)?;

        mac.verify_slice(&signature)
            .map_err(|_| TenancyError::SessionInvalid)?;

        SessionId::parse_str(session_id_str).map_err(|_| TenancyError::SessionInvalid)
    }
}
