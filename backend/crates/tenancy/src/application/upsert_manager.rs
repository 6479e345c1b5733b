//! Upsert Branch Manager Use Case
//!
//! Provisions or replaces the manager identity for a branch. One
//! identity per branch: reassignment re-provisions the fixed slot
//! instead of adding a second identity.

use std::sync::Arc;

use platform::pin::ClearTextPin;

use crate::application::provisioner::IdentityProvisioner;
use crate::domain::entity::account::{AccountProfile, NewIdentity};
use crate::domain::repository::{
    AccountRepository, BranchRepository, DirectoryProvider, InviteRepository, Notifier,
    OrganizationRepository,
};
use crate::domain::value_object::slug::manager_username;
use crate::domain::value_object::{Email, Role};
use crate::error::{TenancyError, TenancyResult};
use kernel::id::{AccountId, BranchId, OrgId};

/// Upsert branch manager input
pub struct UpsertManagerInput {
    pub org_id: OrgId,
    pub branch_id: BranchId,
    pub actor_id: AccountId,
    pub display_name: String,
    /// Real mailbox; required when no PIN is supplied
    pub email: Option<String>,
    /// Inline PIN; absent triggers the deferred invite flow
    pub pin: Option<String>,
}

/// Upsert branch manager use case
pub struct UpsertManagerUseCase<O, B, A, D, I, N>
where
    O: OrganizationRepository,
    B: BranchRepository,
    A: AccountRepository,
    D: DirectoryProvider,
    I: InviteRepository,
    N: Notifier,
{
    org_repo: Arc<O>,
    branch_repo: Arc<B>,
    provisioner: IdentityProvisioner<A, B, D, I, N>,
}

impl<O, B, A, D, I, N> UpsertManagerUseCase<O, B, A, D, I, N>
where
    O: OrganizationRepository,
    B: BranchRepository,
    A: AccountRepository,
    D: DirectoryProvider,
    I: InviteRepository,
    N: Notifier,
{
    pub fn new(
        org_repo: Arc<O>,
        branch_repo: Arc<B>,
        provisioner: IdentityProvisioner<A, B, D, I, N>,
    ) -> Self {
        Self {
            org_repo,
            branch_repo,
            provisioner,
        }
    }

    pub async fn execute(&self, input: UpsertManagerInput) -> TenancyResult<AccountProfile> {
        let org = self
            .org_repo
            .find_by_id(&input.org_id)
            .await?
            .ok_or(TenancyError::OrganizationNotFound)?;

        if !org.is_owner(&input.actor_id) {
            return Err(TenancyError::NotOwner);
        }

        let branch = self
            .branch_repo
            .find_by_id(&input.org_id, &input.branch_id)
            .await?
            .ok_or(TenancyError::BranchNotFound)?;

        // Reassignment tears down the previous slot occupant first.
        if let Some(existing) = branch.manager_account_id {
            self.provisioner.disable(&existing).await?;
        }

        let username = manager_username(&branch.username);

        let (contact_email, login_email) = match &input.email {
            Some(raw) => {
                let email = Email::new(raw.clone())?;
                (Some(email.clone()), email)
            }
            None => (None, Email::virtual_for(&username)),
        };

        let identity = NewIdentity {
            role: Role::Manager,
            org_id: Some(input.org_id),
            branch_id: Some(input.branch_id),
            display_name: input.display_name,
            contact_email,
            login_email,
            username: Some(username),
        };

        let profile = match input.pin {
            Some(pin) => {
                let pin = ClearTextPin::new(pin)?;
                self.provisioner
                    .provision_with_credential(identity, pin)
                    .await?
            }
            None => {
                if identity.contact_email.is_none() {
                    return Err(TenancyError::Validation(
                        "An email is required when no PIN is supplied".to_string(),
                    ));
                }
                self.provisioner.provision_deferred(identity).await?
            }
        };

        self.branch_repo
            .set_manager(&input.org_id, &input.branch_id, Some(profile.account_id))
            .await?;

        tracing::info!(
            org_id = %input.org_id,
            branch_id = %input.branch_id,
            manager = %profile.account_id,
            status = %profile.status,
            "Branch manager upserted"
        );

        Ok(profile)
    }
}
