//! Create Branch Use Case
//!
//! Allocates the next branch number transactionally, derives the branch
//! slug and username, and writes the new branch.

use std::sync::Arc;

use crate::domain::entity::branch::{Branch, NewBranch};
use crate::domain::repository::{BranchRepository, OrganizationRepository};
use crate::domain::value_object::slug::{branch_username, slugify, unique_slug};
use crate::error::{TenancyError, TenancyResult};
use kernel::id::{AccountId, OrgId};

/// Create branch input
pub struct CreateBranchInput {
    pub org_id: OrgId,
    pub name: String,
    pub actor_id: AccountId,
}

/// Create branch use case
pub struct CreateBranchUseCase<O, B>
where
    O: OrganizationRepository,
    B: BranchRepository,
{
    org_repo: Arc<O>,
    branch_repo: Arc<B>,
}

impl<O, B> CreateBranchUseCase<O, B>
where
    O: OrganizationRepository,
    B: BranchRepository,
{
    pub fn new(org_repo: Arc<O>, branch_repo: Arc<B>) -> Self {
        Self {
            org_repo,
            branch_repo,
        }
    }

    pub async fn execute(&self, input: CreateBranchInput) -> TenancyResult<Branch> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(TenancyError::Validation(
                "Branch name cannot be empty".to_string(),
            ));
        }

        let org = self
            .org_repo
            .find_by_id(&input.org_id)
            .await?
            .ok_or(TenancyError::OrganizationNotFound)?;

        // Fast-path ownership check; the allocation transaction re-reads
        // the organization and checks again before writing.
        if !org.is_owner(&input.actor_id) {
            return Err(TenancyError::NotOwner);
        }

        // Branch slug is unique within the organization; the username is
        // unique across all branches. Both checks are lookups before the
        // write (fail-open on a simultaneous identical request).
        let base = slugify(&name);
        let taken_slugs = self
            .branch_repo
            .taken_slugs_with_prefix(&input.org_id, &base)
            .await?;
        let slug = unique_slug(&base, &taken_slugs);

        let username_base = branch_username(&org.slug, &slug);
        let taken_usernames = self
            .branch_repo
            .taken_usernames_with_prefix(&username_base)
            .await?;
        let username = unique_slug(&username_base, &taken_usernames);

        let branch = self
            .branch_repo
            .insert_allocating_number(
                &input.org_id,
                &input.actor_id,
                NewBranch::new(name, slug, username),
            )
            .await?;

        // Denormalized count is maintained outside the critical path.
        self.org_repo.adjust_counts(&input.org_id, 1, 0).await?;

        tracing::info!(
            org_id = %input.org_id,
            branch_id = %branch.branch_id,
            branch_no = branch.branch_no,
            username = %branch.username,
            "Branch created"
        );

        Ok(branch)
    }
}
