//! Identity Provisioner
//!
//! Creates and updates the dual identity record (profile record plus
//! auth-provider directory record) for any role. All mutations of either
//! side of the record go through this service so the two never drift.

use std::sync::Arc;

use platform::pin::{ClearTextPin, PinHash};

use crate::application::config::TenancyConfig;
use crate::application::invite::InviteTokenManager;
use crate::domain::entity::account::{
    AccountProfile, DirectoryAccount, DirectoryClaims, NewIdentity, StoredCredential,
};
use crate::domain::entity::invite::InviteKind;
use crate::domain::repository::{
    AccountRepository, BranchRepository, DirectoryProvider, InviteRepository, Notifier,
};
use crate::domain::value_object::{AccountStatus, Role};
use crate::error::{TenancyError, TenancyResult};
use kernel::id::AccountId;

/// Identity provisioner
pub struct IdentityProvisioner<A, B, D, I, N>
where
    A: AccountRepository,
    B: BranchRepository,
    D: DirectoryProvider,
    I: InviteRepository,
    N: Notifier,
{
    account_repo: Arc<A>,
    branch_repo: Arc<B>,
    directory: Arc<D>,
    invites: InviteTokenManager<I>,
    notifier: Arc<N>,
    config: Arc<TenancyConfig>,
}

impl<A, B, D, I, N> IdentityProvisioner<A, B, D, I, N>
where
    A: AccountRepository,
    B: BranchRepository,
    D: DirectoryProvider,
    I: InviteRepository,
    N: Notifier,
{
    pub fn new(
        account_repo: Arc<A>,
        branch_repo: Arc<B>,
        directory: Arc<D>,
        invite_repo: Arc<I>,
        notifier: Arc<N>,
        config: Arc<TenancyConfig>,
    ) -> Self {
        let invites = InviteTokenManager::new(invite_repo, config.clone());
        Self {
            account_repo,
            branch_repo,
            directory,
            invites,
            notifier,
            config,
        }
    }

    /// Provision an identity with an inline credential
    ///
    /// Hashes the secret first (never inside a store transaction), then
    /// writes the profile as Active and the directory record enabled
    /// with the role's claims.
    pub async fn provision_with_credential(
        &self,
        identity: NewIdentity,
        secret: ClearTextPin,
    ) -> TenancyResult<AccountProfile> {
        let hash = PinHash::from_clear(&secret, self.config.pepper())?;

        let profile = AccountProfile::from_identity(
            identity,
            AccountStatus::Active,
            Some(StoredCredential::modern(hash.as_phc_string())),
        );
        let directory_record = DirectoryAccount::for_profile(&profile);

        self.account_repo.create(&profile).await?;
        self.directory.upsert(&directory_record).await?;

        tracing::info!(
            account_id = %profile.account_id,
            role = %profile.role,
            "Identity provisioned with inline credential"
        );

        Ok(profile)
    }

    /// Provision an identity with a deferred credential-setup flow
    ///
    /// Writes the profile as Pending with a null credential, creates a
    /// disabled directory record, issues an invite token, and attempts
    /// best-effort delivery of the setup link. Delivery failure is
    /// logged, never fatal - the invite stays valid and can be resent.
    pub async fn provision_deferred(&self, identity: NewIdentity) -> TenancyResult<AccountProfile> {
        let contact = identity.contact_email.clone().ok_or_else(|| {
            TenancyError::Validation(
                "A deliverable email is required for deferred credential setup".to_string(),
            )
        })?;

        let profile = AccountProfile::from_identity(identity, AccountStatus::Pending, None);
        let directory_record = DirectoryAccount::for_profile(&profile);

        self.account_repo.create(&profile).await?;
        self.directory.upsert(&directory_record).await?;

        let raw_token = self
            .invites
            .issue(&contact, &profile.display_name, InviteKind::Onboarding)
            .await?;

        if let Err(e) = self
            .notifier
            .send_invite(&contact, &profile.display_name, &raw_token)
            .await
        {
            tracing::warn!(
                error = %e,
                email = %contact,
                "Invite delivery failed; invite remains valid and can be resent"
            );
        }

        tracing::info!(
            account_id = %profile.account_id,
            role = %profile.role,
            "Identity provisioned pending credential setup"
        );

        Ok(profile)
    }

    /// Activate a pending identity from an invite token
    ///
    /// Consumes the invite, sets the hashed credential, flips the
    /// profile to Active and enables the directory record.
    pub async fn activate_from_invite(
        &self,
        raw_token: &str,
        secret: ClearTextPin,
        expected_role: Option<Role>,
    ) -> TenancyResult<AccountProfile> {
        // Hash before consuming so no store mutation waits on Argon2.
        let hash = PinHash::from_clear(&secret, self.config.pepper())?;

        let consumed = self.invites.consume(raw_token).await?;

        let mut profile = self
            .account_repo
            .find_by_login_email(&consumed.email)
            .await?
            .ok_or(TenancyError::AccountNotFound)?;

        if let Some(role) = expected_role {
            if profile.role != role {
                return Err(TenancyError::Validation(
                    "Invite does not match this role".to_string(),
                ));
            }
        }

        profile.activate_with_credential(StoredCredential::modern(hash.as_phc_string()));
        self.account_repo.update(&profile).await?;

        self.directory.set_enabled(&profile.account_id, true).await?;
        // Tenant refs may have changed since the invite went out;
        // re-derive and re-apply the claims.
        self.directory
            .set_claims(&profile.account_id, &DirectoryClaims::for_profile(&profile))
            .await?;

        tracing::info!(
            account_id = %profile.account_id,
            role = %profile.role,
            "Identity activated from invite"
        );

        Ok(profile)
    }

    /// Tear down an identity; idempotent on missing records
    ///
    /// Clears tenant-relationship back-references on the parent (the
    /// branch manager slot), then deletes the profile record and the
    /// directory record.
    pub async fn disable(&self, account_id: &AccountId) -> TenancyResult<()> {
        if let Some(profile) = self.account_repo.find_by_id(account_id).await? {
            if profile.role == Role::Manager {
                if let (Some(org_id), Some(branch_id)) = (profile.org_id, profile.branch_id) {
                    if let Some(branch) = self.branch_repo.find_by_id(&org_id, &branch_id).await? {
                        if branch.manager_account_id.as_ref() == Some(account_id) {
                            self.branch_repo
                                .set_manager(&org_id, &branch_id, None)
                                .await?;
                        }
                    }
                }
            }
            self.account_repo.delete(account_id).await?;
        }

        let existed = self.directory.delete(account_id).await?;

        tracing::info!(
            account_id = %account_id,
            directory_existed = existed,
            "Identity disabled"
        );

        Ok(())
    }
}
