//! Delete Cashier Use Case

use std::sync::Arc;

use crate::application::actor::Actor;
use crate::domain::repository::{
    AccountRepository, DirectoryProvider, OrganizationRepository,
};
use crate::domain::value_object::Role;
use crate::error::{TenancyError, TenancyResult};
use kernel::id::{AccountId, BranchId, OrgId};

/// Delete cashier input
pub struct DeleteCashierInput {
    pub org_id: OrgId,
    pub branch_id: BranchId,
    pub cashier_id: AccountId,
}

/// Delete cashier use case
pub struct DeleteCashierUseCase<O, A, D>
where
    O: OrganizationRepository,
    A: AccountRepository,
    D: DirectoryProvider,
{
    org_repo: Arc<O>,
    account_repo: Arc<A>,
    directory: Arc<D>,
}

impl<O, A, D> DeleteCashierUseCase<O, A, D>
where
    O: OrganizationRepository,
    A: AccountRepository,
    D: DirectoryProvider,
{
    pub fn new(org_repo: Arc<O>, account_repo: Arc<A>, directory: Arc<D>) -> Self {
        Self {
            org_repo,
            account_repo,
            directory,
        }
    }

    pub async fn execute(&self, input: DeleteCashierInput, actor: &Actor) -> TenancyResult<()> {
        // Same scoping rules as cashier creation, before any write.
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
            }
            Role::Manager => actor.ensure_branch_scope(&input.branch_id)?,
            _ => return Err(TenancyError::ScopeMismatch),
        }

        let profile = self
            .account_repo
            .find_by_id(&input.cashier_id)
            .await?
            .ok_or(TenancyError::AccountNotFound)?;

        let in_scope = profile.role == Role::Cashier
            && profile.org_id == Some(input.org_id)
            && profile.branch_id == Some(input.branch_id);
        if !in_scope {
            return Err(TenancyError::AccountNotFound);
        }

        self.account_repo.delete(&input.cashier_id).await?;
        self.directory.delete(&input.cashier_id).await?;
        self.org_repo.adjust_counts(&input.org_id, 0, -1).await?;

        tracing::info!(
            org_id = %input.org_id,
            branch_id = %input.branch_id,
            cashier = %input.cashier_id,
            "Cashier deleted"
        );

        Ok(())
    }
}
