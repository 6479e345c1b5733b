//! Create Organization Use Case
//!
//! Owner onboarding: derives a unique organization slug and writes the
//! organization plus the owner profile atomically.

use std::sync::Arc;

use platform::pin::{ClearTextPin, PinHash};

use crate::application::config::TenancyConfig;
use crate::domain::entity::account::{
    AccountProfile, DirectoryAccount, NewIdentity, StoredCredential,
};
use crate::domain::entity::organization::Organization;
use crate::domain::repository::{AccountRepository, DirectoryProvider, OrganizationRepository};
use crate::domain::value_object::slug::{slugify, unique_slug};
use crate::domain::value_object::{AccountStatus, Email, Role};
use crate::error::{TenancyError, TenancyResult};
use kernel::id::{AccountId, OrgId};

/// Create organization input
pub struct CreateOrganizationInput {
    pub name: String,
    pub owner_display_name: String,
    pub owner_email: String,
    pub owner_password: String,
}

/// Create organization output
pub struct CreateOrganizationOutput {
    pub org_id: OrgId,
    pub slug: String,
    pub owner_account_id: AccountId,
}

/// Create organization use case
pub struct CreateOrganizationUseCase<O, A, D>
where
    O: OrganizationRepository,
    A: AccountRepository,
    D: DirectoryProvider,
{
    org_repo: Arc<O>,
    account_repo: Arc<A>,
    directory: Arc<D>,
    config: Arc<TenancyConfig>,
}

impl<O, A, D> CreateOrganizationUseCase<O, A, D>
where
    O: OrganizationRepository,
    A: AccountRepository,
    D: DirectoryProvider,
{
    pub fn new(
        org_repo: Arc<O>,
        account_repo: Arc<A>,
        directory: Arc<D>,
        config: Arc<TenancyConfig>,
    ) -> Self {
        Self {
            org_repo,
            account_repo,
            directory,
            config,
        }
    }

    pub async fn execute(
        &self,
        input: CreateOrganizationInput,
    ) -> TenancyResult<CreateOrganizationOutput> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(TenancyError::Validation(
                "Organization name cannot be empty".to_string(),
            ));
        }

        let owner_email = Email::new(input.owner_email)?;
        if self
            .account_repo
            .exists_by_login_email(Role::Owner, &owner_email)
            .await?
        {
            return Err(TenancyError::Conflict(
                "An owner account already exists for this email".to_string(),
            ));
        }

        // Hash before any writes
        let password = ClearTextPin::new_password(input.owner_password)?;
        let hash = PinHash::from_clear(&password, self.config.pepper())?;

        // Slug uniqueness is checked by lookup, then written - fail-open
        // under a simultaneous-request race for the same name. Accepted:
        // organization creation is a human-paced operation.
        let base = slugify(&name);
        let taken = self.org_repo.taken_slugs_with_prefix(&base).await?;
        let slug = unique_slug(&base, &taken);

        let mut owner = AccountProfile::from_identity(
            NewIdentity {
                role: Role::Owner,
                org_id: None,
                branch_id: None,
                display_name: input.owner_display_name,
                contact_email: Some(owner_email.clone()),
                login_email: owner_email,
                username: None,
            },
            AccountStatus::Active,
            Some(StoredCredential::modern(hash.as_phc_string())),
        );

        let org = Organization::new(name, slug.clone(), owner.account_id);
        owner.org_id = Some(org.org_id);

        self.org_repo.create_with_owner(&org, &owner).await?;
        self.directory
            .upsert(&DirectoryAccount::for_profile(&owner))
            .await?;

        tracing::info!(
            org_id = %org.org_id,
            slug = %slug,
            owner = %owner.account_id,
            "Organization created"
        );

        Ok(CreateOrganizationOutput {
            org_id: org.org_id,
            slug,
            owner_account_id: owner.account_id,
        })
    }
}
