//! Invite Account Use Case
//!
//! Provisions a deferred-credential platform account (admin, staff) and
//! triggers the notification collaborator. Tenant-scoped roles are
//! invited through the organization endpoints instead.

use crate::application::provisioner::IdentityProvisioner;
use crate::domain::entity::account::{AccountProfile, NewIdentity};
use crate::domain::repository::{
    AccountRepository, BranchRepository, DirectoryProvider, InviteRepository, Notifier,
};
use crate::domain::value_object::{Email, Role};
use crate::error::{TenancyError, TenancyResult};

/// Invite account input
pub struct InviteAccountInput {
    pub role: Role,
    pub email: String,
    pub name: String,
}

/// Invite account use case
pub struct InviteAccountUseCase<A, B, D, I, N>
where
    A: AccountRepository,
    B: BranchRepository,
    D: DirectoryProvider,
    I: InviteRepository,
    N: Notifier,
{
    provisioner: IdentityProvisioner<A, B, D, I, N>,
}

impl<A, B, D, I, N> InviteAccountUseCase<A, B, D, I, N>
where
    A: AccountRepository,
    B: BranchRepository,
    D: DirectoryProvider,
    I: InviteRepository,
    N: Notifier,
{
    pub fn new(provisioner: IdentityProvisioner<A, B, D, I, N>) -> Self {
        Self { provisioner }
    }

    pub async fn execute(&self, input: InviteAccountInput) -> TenancyResult<AccountProfile> {
        if !input.role.is_platform() {
            return Err(TenancyError::Validation(
                "This role is invited through the organization endpoints".to_string(),
            ));
        }

        let email = Email::new(input.email)?;
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(TenancyError::Validation("Name cannot be empty".to_string()));
        }

        let identity = NewIdentity {
            role: input.role,
            org_id: None,
            branch_id: None,
            display_name: name,
            contact_email: Some(email.clone()),
            login_email: email,
            username: None,
        };

        self.provisioner.provision_deferred(identity).await
    }
}
