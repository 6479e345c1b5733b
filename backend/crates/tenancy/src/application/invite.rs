//! Invite Token Manager
//!
//! Issues, validates, and consumes one-time tokens for out-of-band
//! credential setup.

use std::sync::Arc;

use chrono::Duration;

use crate::application::config::TenancyConfig;
use crate::domain::entity::invite::{InviteKind, InviteToken};
use crate::domain::repository::InviteRepository;
use crate::domain::value_object::Email;
use crate::error::{TenancyError, TenancyResult};

/// Metadata returned by a successful consumption
#[derive(Debug, Clone)]
pub struct ConsumedInvite {
    pub email: Email,
    pub name_hint: String,
}

/// Invite token manager
pub struct InviteTokenManager<I>
where
    I: InviteRepository,
{
    invite_repo: Arc<I>,
    config: Arc<TenancyConfig>,
}

impl<I> InviteTokenManager<I>
where
    I: InviteRepository,
{
    pub fn new(invite_repo: Arc<I>, config: Arc<TenancyConfig>) -> Self {
        Self {
            invite_repo,
            config,
        }
    }

    /// Issue a new invite token for an email
    ///
    /// Prior tokens for the same email that are expired or already used
    /// are deleted opportunistically first. Only the digest of the raw
    /// token is persisted; the raw token is returned for delivery.
    pub async fn issue(
        &self,
        email: &Email,
        name_hint: &str,
        kind: InviteKind,
    ) -> TenancyResult<String> {
        let removed = self.invite_repo.delete_stale_for_email(email).await?;
        if removed > 0 {
            tracing::debug!(email = %email, removed, "Cleaned up stale invites");
        }

        let ttl = self.config.invite_ttl_for(kind);
        let ttl = Duration::from_std(ttl)
            .map_err(|e| TenancyError::Internal(format!("Invalid invite TTL: {e}")))?;

        let (invite, raw_token) = InviteToken::issue(email.clone(), name_hint, ttl);
        self.invite_repo.create(&invite).await?;

        tracing::info!(
            invite_id = %invite.invite_id,
            email = %email,
            kind = ?kind,
            "Invite issued"
        );

        Ok(raw_token)
    }

    /// Consume a presented raw token
    ///
    /// Exactly one of any number of concurrent attempts succeeds; the
    /// others observe AlreadyUsed (or NotFound once the record is gone).
    /// An expired token is deleted on sight and reported as Expired.
    pub async fn consume(&self, raw_token: &str) -> TenancyResult<ConsumedInvite> {
        let digest = InviteToken::digest_of(raw_token);

        let invite = self
            .invite_repo
            .find_by_digest(&digest)
            .await?
            .ok_or(TenancyError::InviteNotFound)?;

        if invite.used {
            return Err(TenancyError::InviteAlreadyUsed);
        }

        if invite.is_expired() {
            self.invite_repo.delete(&invite.invite_id).await?;
            tracing::debug!(invite_id = %invite.invite_id, "Expired invite deleted on lookup");
            return Err(TenancyError::InviteExpired);
        }

        // The used-flag check and set happen in one atomic store
        // operation; the credential mutation that follows belongs to the
        // single winner.
        let won = self.invite_repo.mark_used(&invite.invite_id).await?;
        if !won {
            return Err(TenancyError::InviteAlreadyUsed);
        }

        tracing::info!(invite_id = %invite.invite_id, email = %invite.email, "Invite consumed");

        Ok(ConsumedInvite {
            email: invite.email,
            name_hint: invite.name_hint,
        })
    }
}
