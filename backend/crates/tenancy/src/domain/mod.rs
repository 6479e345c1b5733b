//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    account::{AccountProfile, DirectoryAccount, DirectoryClaims, NewIdentity, StoredCredential},
    branch::{Branch, NewBranch},
    invite::{InviteKind, InviteToken},
    organization::Organization,
    session::Session,
};
pub use repository::{
    AccountRepository, BranchRepository, DirectoryProvider, InviteRepository, Notifier,
    OrganizationRepository, SessionRepository,
};
