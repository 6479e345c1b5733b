//! Reset Credential Use Case
//!
//! Issues a fresh short-lived invite token and triggers notification.
//! Structured to avoid confirming account existence to unauthenticated
//! callers: an unknown account still reports success.

use std::sync::Arc;

use crate::application::config::TenancyConfig;
use crate::application::invite::InviteTokenManager;
use crate::domain::entity::invite::InviteKind;
use crate::domain::repository::{AccountRepository, InviteRepository, Notifier};
use crate::domain::value_object::{Email, Role};
use crate::error::TenancyResult;

/// Reset credential input
pub struct ResetCredentialInput {
    pub role: Role,
    pub email: String,
}

/// Reset credential use case
pub struct ResetCredentialUseCase<A, I, N>
where
    A: AccountRepository,
    I: InviteRepository,
    N: Notifier,
{
    account_repo: Arc<A>,
    invites: InviteTokenManager<I>,
    notifier: Arc<N>,
}

impl<A, I, N> ResetCredentialUseCase<A, I, N>
where
    A: AccountRepository,
    I: InviteRepository,
    N: Notifier,
{
    pub fn new(
        account_repo: Arc<A>,
        invite_repo: Arc<I>,
        notifier: Arc<N>,
        config: Arc<TenancyConfig>,
    ) -> Self {
        Self {
            account_repo,
            invites: InviteTokenManager::new(invite_repo, config),
            notifier,
        }
    }

    pub async fn execute(&self, input: ResetCredentialInput) -> TenancyResult<()> {
        let email = Email::new(input.email)?;

        let profile = self.account_repo.find_by_login_email(&email).await?;

        // Virtual identities have no mailbox to deliver to
        let eligible =
            profile.as_ref().is_some_and(|p| p.role == input.role && !p.login_email.is_virtual());

        let Some(profile) = profile.filter(|_| eligible) else {
            // Report success regardless; detail stays in the server log
            tracing::info!(
                email = %email,
                role = %input.role,
                "Credential reset requested for unknown or ineligible account"
            );
            return Ok(());
        };

        let raw_token = self
            .invites
            .issue(&email, &profile.display_name, InviteKind::CredentialReset)
            .await?;

        if let Err(e) = self.notifier.send_reset(&email, &raw_token).await {
            tracing::warn!(
                error = %e,
                email = %email,
                "Reset delivery failed; invite remains valid"
            );
        }

        Ok(())
    }
}
