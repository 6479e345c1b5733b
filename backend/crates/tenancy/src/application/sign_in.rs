//! Sign In Use Case
//!
//! Authenticates a PIN/password account and creates a session. A legacy
//! stored digest that matches is upgraded to the modern hash scheme
//! opportunistically, as part of the successful login.

use std::sync::Arc;

use platform::pin::{ClearTextPin, PinHash, verify_legacy};

use crate::application::config::TenancyConfig;
use crate::application::session::SessionManager;
use crate::domain::entity::account::{AccountProfile, CredentialAlgorithm, StoredCredential};
use crate::domain::repository::{AccountRepository, SessionRepository};
use crate::domain::value_object::{AccountStatus, Email, Role};
use crate::error::{TenancyError, TenancyResult};
use kernel::id::{AccountId, BranchId, OrgId};

/// Sign in input
pub struct SignInInput {
    pub role: Role,
    /// Email address, or a derived username for virtual identities
    pub identifier: String,
    /// PIN or password
    pub secret: String,
}

/// Sign in output
pub struct SignInOutput {
    /// Signed session token for the cookie
    pub session_token: String,
    pub account_id: AccountId,
    pub role: Role,
    pub display_name: String,
    pub org_id: Option<OrgId>,
    pub branch_id: Option<BranchId>,
}

/// Sign in use case
pub struct SignInUseCase<A, S>
where
    A: AccountRepository,
    S: SessionRepository,
{
    account_repo: Arc<A>,
    sessions: SessionManager<S>,
    config: Arc<TenancyConfig>,
}

impl<A, S> SignInUseCase<A, S>
where
    A: AccountRepository,
    S: SessionRepository,
{
    pub fn new(account_repo: Arc<A>, session_repo: Arc<S>, config: Arc<TenancyConfig>) -> Self {
        let sessions = SessionManager::new(session_repo, config.clone());
        Self {
            account_repo,
            sessions,
            config,
        }
    }

    pub async fn execute(&self, input: SignInInput) -> TenancyResult<SignInOutput> {
        // Resolve the identifier to a login key. Identifier problems are
        // reported as bad credentials - no account oracle.
        let login_email = if input.identifier.contains('@') {
            Email::new(&input.identifier).map_err(|_| TenancyError::InvalidCredentials)?
        } else {
            let username = input.identifier.trim().to_lowercase();
            if username.is_empty() {
                return Err(TenancyError::InvalidCredentials);
            }
            Email::virtual_for(&username)
        };

        let profile = self
            .account_repo
            .find_by_login_email(&login_email)
            .await?
            .ok_or(TenancyError::InvalidCredentials)?;

        // Each role signs in against its own cookie surface
        if profile.role != input.role {
            return Err(TenancyError::InvalidCredentials);
        }

        if profile.status == AccountStatus::Disabled {
            return Err(TenancyError::AccountDisabled);
        }
        if !profile.can_sign_in() {
            // Pending: credential was never set
            return Err(TenancyError::InvalidCredentials);
        }

        let credential = profile
            .credential
            .clone()
            .ok_or(TenancyError::InvalidCredentials)?;

        let secret = ClearTextPin::for_verification(input.secret);
        if !self.verify_and_migrate(&profile, &credential, &secret).await? {
            return Err(TenancyError::InvalidCredentials);
        }

        let session_token = self.sessions.create_session(&profile.account_id).await?;

        tracing::info!(
            account_id = %profile.account_id,
            role = %profile.role,
            "Account signed in"
        );

        Ok(SignInOutput {
            session_token,
            account_id: profile.account_id,
            role: profile.role,
            display_name: profile.display_name,
            org_id: profile.org_id,
            branch_id: profile.branch_id,
        })
    }

    /// Verify the secret; on a matching legacy digest, re-hash under the
    /// modern scheme and persist the upgrade before reporting success
    async fn verify_and_migrate(
        &self,
        profile: &AccountProfile,
        credential: &StoredCredential,
        secret: &ClearTextPin,
    ) -> TenancyResult<bool> {
        match credential.algorithm {
            CredentialAlgorithm::Argon2id => {
                // A malformed stored hash is a failed match, never an error
                Ok(PinHash::from_phc_string(credential.hash.as_str())
                    .map(|hash| hash.verify(secret, self.config.pepper()))
                    .unwrap_or(false))
            }
            CredentialAlgorithm::LegacySha256 => {
                if !verify_legacy(secret, &credential.hash) {
                    return Ok(false);
                }

                // Matched under the legacy scheme: upgrade now, on this
                // successful login. A failed persist must not lock the
                // account out - the next login retries the upgrade.
                match PinHash::from_clear(secret, self.config.pepper()) {
                    Ok(new_hash) => {
                        let mut upgraded = profile.clone();
                        upgraded.replace_credential(StoredCredential::upgraded(
                            new_hash.as_phc_string(),
                        ));
                        match self.account_repo.update(&upgraded).await {
                            Ok(()) => {
                                tracing::info!(
                                    account_id = %profile.account_id,
                                    "Legacy credential upgraded to modern hash"
                                );
                            }
                            Err(e) => {
                                tracing::warn!(
                                    error = %e,
                                    account_id = %profile.account_id,
                                    "Failed to persist credential upgrade"
                                );
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            account_id = %profile.account_id,
                            "Failed to re-hash legacy credential"
                        );
                    }
                }

                Ok(true)
            }
        }
    }
}
