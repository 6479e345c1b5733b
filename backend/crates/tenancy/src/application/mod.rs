//! Application Layer
//!
//! Use cases and application services.

pub mod actor;
pub mod check_exists;
pub mod check_session;
pub mod config;
pub mod create_branch;
pub mod create_cashier;
pub mod create_organization;
pub mod delete_branch;
pub mod delete_cashier;
pub mod invite;
pub mod invite_account;
pub mod provisioner;
pub mod reset_credential;
pub mod session;
pub mod set_credential;
pub mod sign_in;
pub mod sign_out;
pub mod upsert_manager;

// Re-exports
pub use actor::Actor;
pub use check_exists::CheckExistsUseCase;
pub use check_session::{CheckSessionUseCase, SessionInfoOutput};
pub use config::TenancyConfig;
pub use create_branch::{CreateBranchInput, CreateBranchUseCase};
pub use create_cashier::{CreateCashierInput, CreateCashierUseCase};
pub use create_organization::{
    CreateOrganizationInput, CreateOrganizationOutput, CreateOrganizationUseCase,
};
pub use delete_branch::{DeleteBranchInput, DeleteBranchUseCase};
pub use delete_cashier::{DeleteCashierInput, DeleteCashierUseCase};
pub use invite::{ConsumedInvite, InviteTokenManager};
pub use invite_account::{InviteAccountInput, InviteAccountUseCase};
pub use provisioner::IdentityProvisioner;
pub use reset_credential::{ResetCredentialInput, ResetCredentialUseCase};
pub use session::SessionManager;
pub use set_credential::{SetCredentialInput, SetCredentialUseCase};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use upsert_manager::{UpsertManagerInput, UpsertManagerUseCase};
