//! Check Session Use Case
//!
//! Verifies a session token and resolves the authenticated actor.

use std::sync::Arc;

use crate::application::actor::Actor;
use crate::application::config::TenancyConfig;
use crate::application::session::SessionManager;
use crate::domain::repository::{AccountRepository, SessionRepository};
use crate::error::{TenancyError, TenancyResult};

/// Session info output
pub struct SessionInfoOutput {
    pub actor: Actor,
    pub display_name: String,
}

/// Check session use case
pub struct CheckSessionUseCase<A, S>
where
    A: AccountRepository,
    S: SessionRepository,
{
    account_repo: Arc<A>,
    sessions: SessionManager<S>,
}

impl<A, S> CheckSessionUseCase<A, S>
where
    A: AccountRepository,
    S: SessionRepository,
{
    pub fn new(account_repo: Arc<A>, session_repo: Arc<S>, config: Arc<TenancyConfig>) -> Self {
        Self {
            account_repo,
            sessions: SessionManager::new(session_repo, config),
        }
    }

    /// Validate the token and load the actor behind it
    pub async fn execute(&self, session_token: &str) -> TenancyResult<SessionInfoOutput> {
        let account_id = self.sessions.validate(session_token).await?;

        let profile = self
            .account_repo
            .find_by_id(&account_id)
            .await?
            .ok_or(TenancyError::SessionInvalid)?;

        if !profile.can_sign_in() {
            // Disabled after the session was issued
            return Err(TenancyError::SessionInvalid);
        }

        Ok(SessionInfoOutput {
            actor: Actor {
                account_id: profile.account_id,
                role: profile.role,
                org_id: profile.org_id,
                branch_id: profile.branch_id,
            },
            display_name: profile.display_name,
        })
    }

    /// Just check whether the token is valid
    pub async fn is_valid(&self, session_token: &str) -> bool {
        self.execute(session_token).await.is_ok()
    }
}
