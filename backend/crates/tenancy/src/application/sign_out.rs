//! Sign Out Use Case
//!
//! Invalidates the caller's session.

use std::sync::Arc;

use crate::application::config::TenancyConfig;
use crate::application::session::SessionManager;
use crate::domain::repository::SessionRepository;
use crate::error::TenancyResult;

/// Sign out use case
pub struct SignOutUseCase<S>
where
    S: SessionRepository,
{
    sessions: SessionManager<S>,
}

impl<S> SignOutUseCase<S>
where
    S: SessionRepository,
{
    pub fn new(session_repo: Arc<S>, config: Arc<TenancyConfig>) -> Self {
        Self {
            sessions: SessionManager::new(session_repo, config),
        }
    }

    /// Destroy the session behind the token; idempotent
    pub async fn execute(&self, session_token: &str) -> TenancyResult<()> {
        self.sessions.destroy(session_token).await
    }
}
