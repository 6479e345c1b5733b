//! Delete Branch Use Case
//!
//! Deletes a branch together with its cashier accounts and manager
//! identity, decrementing the organization counters.

use std::sync::Arc;

use crate::domain::repository::{
    AccountRepository, BranchRepository, DirectoryProvider, OrganizationRepository,
};
use crate::domain::value_object::Role;
use crate::error::{TenancyError, TenancyResult};
use kernel::id::{AccountId, BranchId, OrgId};

/// Delete branch input
pub struct DeleteBranchInput {
    pub org_id: OrgId,
    pub branch_id: BranchId,
    pub actor_id: AccountId,
}

/// Delete branch use case
pub struct DeleteBranchUseCase<O, B, A, D>
where
    O: OrganizationRepository,
    B: BranchRepository,
    A: AccountRepository,
    D: DirectoryProvider,
{
    org_repo: Arc<O>,
    branch_repo: Arc<B>,
    account_repo: Arc<A>,
    directory: Arc<D>,
}

impl<O, B, A, D> DeleteBranchUseCase<O, B, A, D>
where
    O: OrganizationRepository,
    B: BranchRepository,
    A: AccountRepository,
    D: DirectoryProvider,
{
    pub fn new(
        org_repo: Arc<O>,
        branch_repo: Arc<B>,
        account_repo: Arc<A>,
        directory: Arc<D>,
    ) -> Self {
        Self {
            org_repo,
            branch_repo,
            account_repo,
            directory,
        }
    }

    pub async fn execute(&self, input: DeleteBranchInput) -> TenancyResult<()> {
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

        // Cascade: every identity scoped to the branch goes with it
        // (cashiers and the manager slot alike), both halves of each
        // dual record.
        let profiles = self
            .account_repo
            .list_by_branch(&input.org_id, &input.branch_id)
            .await?;

        let cashier_count = profiles
            .iter()
            .filter(|p| p.role == Role::Cashier)
            .count() as i32;

        for profile in &profiles {
            self.account_repo.delete(&profile.account_id).await?;
            self.directory.delete(&profile.account_id).await?;
        }

        self.branch_repo
            .delete(&input.org_id, &input.branch_id)
            .await?;

        self.org_repo
            .adjust_counts(&input.org_id, -1, -cashier_count)
            .await?;

        tracing::info!(
            org_id = %input.org_id,
            branch_id = %input.branch_id,
            branch_no = branch.branch_no,
            deleted_identities = profiles.len(),
            "Branch deleted"
        );

        Ok(())
    }
}
