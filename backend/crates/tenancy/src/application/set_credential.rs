//! Set Credential Use Case
//!
//! Consumes an invite token and activates the pending identity with the
//! chosen PIN or password.

use platform::pin::ClearTextPin;

use crate::application::provisioner::IdentityProvisioner;
use crate::domain::entity::account::AccountProfile;
use crate::domain::repository::{
    AccountRepository, BranchRepository, DirectoryProvider, InviteRepository, Notifier,
};
use crate::domain::value_object::Role;
use crate::error::TenancyResult;

/// Set credential input
pub struct SetCredentialInput {
    pub role: Role,
    pub token: String,
    pub secret: String,
}

/// Set credential use case
pub struct SetCredentialUseCase<A, B, D, I, N>
where
    A: AccountRepository,
    B: BranchRepository,
    D: DirectoryProvider,
    I: InviteRepository,
    N: Notifier,
{
    provisioner: IdentityProvisioner<A, B, D, I, N>,
}

impl<A, B, D, I, N> SetCredentialUseCase<A, B, D, I, N>
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

    pub async fn execute(&self, input: SetCredentialInput) -> TenancyResult<AccountProfile> {
        // PIN roles get the digit policy, password roles the length policy
        let secret = if input.role.uses_pin() {
            ClearTextPin::new(input.secret)?
        } else {
            ClearTextPin::new_password(input.secret)?
        };

        self.provisioner
            .activate_from_invite(&input.token, secret, Some(input.role))
            .await
    }
}
