//! Create Cashier Use Case
//!
//! Allocates the branch's next cashier sequence and provisions the
//! cashier identity inline. Cashiers always receive an inline PIN,
//! never a deferred invite.

use std::sync::Arc;

use platform::pin::ClearTextPin;

use crate::application::actor::Actor;
use crate::application::provisioner::IdentityProvisioner;
use crate::domain::entity::account::{AccountProfile, NewIdentity};
use crate::domain::repository::{
    AccountRepository, BranchRepository, DirectoryProvider, InviteRepository, Notifier,
    OrganizationRepository,
};
use crate::domain::value_object::slug::cashier_username;
use crate::domain::value_object::{Email, Role};
use crate::error::{TenancyError, TenancyResult};
use kernel::id::{BranchId, OrgId};

/// Create cashier input
pub struct CreateCashierInput {
    pub org_id: OrgId,
    pub branch_id: BranchId,
    pub display_name: String,
    pub pin: String,
}

/// Create cashier use case
pub struct CreateCashierUseCase<O, B, A, D, I, N>
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

impl<O, B, A, D, I, N> CreateCashierUseCase<O, B, A, D, I, N>
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

    pub async fn execute(
        &self,
        input: CreateCashierInput,
        actor: &Actor,
    ) -> TenancyResult<AccountProfile> {
        // Scope checks happen before the first write: a manager must be
        // scoped to exactly this branch, any actor to this organization.
        self.authorize(&input, actor).await?;

        let branch = self
            .branch_repo
            .find_by_id(&input.org_id, &input.branch_id)
            .await?
            .ok_or(TenancyError::BranchNotFound)?;

        let pin = ClearTextPin::new(input.pin)?;

        let seq = self
            .branch_repo
            .allocate_cashier_number(&input.org_id, &input.branch_id)
            .await?;

        let username = cashier_username(&branch.username, seq);

        let identity = NewIdentity {
            role: Role::Cashier,
            org_id: Some(input.org_id),
            branch_id: Some(input.branch_id),
            display_name: input.display_name,
            contact_email: None,
            login_email: Email::virtual_for(&username),
            username: Some(username),
        };

        let profile = self
            .provisioner
            .provision_with_credential(identity, pin)
            .await?;

        self.org_repo.adjust_counts(&input.org_id, 0, 1).await?;

        tracing::info!(
            org_id = %input.org_id,
            branch_id = %input.branch_id,
            cashier = %profile.account_id,
            seq,
            "Cashier created"
        );

        Ok(profile)
    }

    async fn authorize(&self, input: &CreateCashierInput, actor: &Actor) -> TenancyResult<()> {
        actor.ensure_org_scope(&input.org_id)?;

        match actor.role {
            Role::Owner => {
                let org = self
                    .org_repo
                    .find_by_id(&input.org_id)
                    .await?
                    .ok_or(TenancyError::OrganizationNotFound)?;
                if !org.is_owner(&actor.account_id) {
                    return Err(TenancyError::NotOwner);
                }
                Ok(())
            }
            Role::Manager => actor.ensure_branch_scope(&input.branch_id),
            _ => Err(TenancyError::ScopeMismatch),
        }
    }
}
