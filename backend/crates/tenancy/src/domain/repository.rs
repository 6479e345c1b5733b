//! Repository and Collaborator Traits
//!
//! Interfaces for data persistence and the two external collaborators
//! (auth-provider directory, notification delivery). Implementations are
//! in the infrastructure layer; every service takes these by handle so
//! test doubles slot in without a live store.

use std::collections::HashSet;

use crate::domain::entity::account::{AccountProfile, DirectoryAccount, DirectoryClaims};
use crate::domain::entity::branch::{Branch, NewBranch};
use crate::domain::entity::invite::InviteToken;
use crate::domain::entity::organization::Organization;
use crate::domain::entity::session::Session;
use crate::domain::value_object::{Email, Role};
use crate::error::TenancyResult;
use kernel::id::{AccountId, BranchId, InviteId, OrgId, SessionId};

/// Organization repository trait
#[trait_variant::make(OrganizationRepository: Send)]
pub trait LocalOrganizationRepository {
    /// Create an organization together with its owner profile
    ///
    /// The two writes commit atomically.
    async fn create_with_owner(
        &self,
        org: &Organization,
        owner: &AccountProfile,
    ) -> TenancyResult<()>;

    /// Find organization by ID
    async fn find_by_id(&self, org_id: &OrgId) -> TenancyResult<Option<Organization>>;

    /// Snapshot of taken organization slugs sharing a prefix
    ///
    /// Read before the write; slug uniqueness is fail-open by design.
    async fn taken_slugs_with_prefix(&self, prefix: &str) -> TenancyResult<HashSet<String>>;

    /// Adjust the denormalized branch/cashier counters
    async fn adjust_counts(
        &self,
        org_id: &OrgId,
        branch_delta: i32,
        cashier_delta: i32,
    ) -> TenancyResult<()>;
}

/// Branch repository trait
#[trait_variant::make(BranchRepository: Send)]
pub trait LocalBranchRepository {
    /// Atomically create a branch, allocating its number
    ///
    /// Runs in one store transaction: re-read the organization, verify
    /// `actor` is its owner (NotOwner before any write otherwise),
    /// allocate the next branch number from the organization counter,
    /// and insert the branch. Retried by the transaction mechanism on
    /// conflict; committed numbers never skip or repeat.
    async fn insert_allocating_number(
        &self,
        org_id: &OrgId,
        actor: &AccountId,
        branch: NewBranch,
    ) -> TenancyResult<Branch>;

    /// Find branch by ID within an organization
    async fn find_by_id(
        &self,
        org_id: &OrgId,
        branch_id: &BranchId,
    ) -> TenancyResult<Option<Branch>>;

    /// Snapshot of taken branch slugs within an organization
    async fn taken_slugs_with_prefix(
        &self,
        org_id: &OrgId,
        prefix: &str,
    ) -> TenancyResult<HashSet<String>>;

    /// Snapshot of taken branch usernames across all organizations
    async fn taken_usernames_with_prefix(&self, prefix: &str) -> TenancyResult<HashSet<String>>;

    /// Atomically allocate the next cashier number for a branch
    async fn allocate_cashier_number(
        &self,
        org_id: &OrgId,
        branch_id: &BranchId,
    ) -> TenancyResult<u32>;

    /// Assign or clear the branch manager slot
    async fn set_manager(
        &self,
        org_id: &OrgId,
        branch_id: &BranchId,
        manager: Option<AccountId>,
    ) -> TenancyResult<()>;

    /// Delete a branch record
    async fn delete(&self, org_id: &OrgId, branch_id: &BranchId) -> TenancyResult<()>;
}

/// Account profile repository trait
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    /// Create a profile record
    async fn create(&self, profile: &AccountProfile) -> TenancyResult<()>;

    /// Find profile by account ID
    async fn find_by_id(&self, account_id: &AccountId) -> TenancyResult<Option<AccountProfile>>;

    /// Find profile by auth-provider login key
    async fn find_by_login_email(&self, email: &Email) -> TenancyResult<Option<AccountProfile>>;

    /// Check if a login key is taken for a role
    async fn exists_by_login_email(&self, role: Role, email: &Email) -> TenancyResult<bool>;

    /// List profiles scoped to a branch
    async fn list_by_branch(
        &self,
        org_id: &OrgId,
        branch_id: &BranchId,
    ) -> TenancyResult<Vec<AccountProfile>>;

    /// Update a profile record
    async fn update(&self, profile: &AccountProfile) -> TenancyResult<()>;

    /// Delete a profile; idempotent, returns whether it existed
    async fn delete(&self, account_id: &AccountId) -> TenancyResult<bool>;
}

/// Invite token repository trait
#[trait_variant::make(InviteRepository: Send)]
pub trait LocalInviteRepository {
    /// Persist an invite record (digest only, never the raw token)
    async fn create(&self, invite: &InviteToken) -> TenancyResult<()>;

    /// Find an invite by the digest of a presented token
    async fn find_by_digest(&self, digest: &str) -> TenancyResult<Option<InviteToken>>;

    /// Atomically flip the used flag
    ///
    /// The check and set happen in the same store operation so that of
    /// any number of concurrent consumption attempts exactly one wins.
    /// Returns false for the losers.
    async fn mark_used(&self, invite_id: &InviteId) -> TenancyResult<bool>;

    /// Delete an invite record; idempotent
    async fn delete(&self, invite_id: &InviteId) -> TenancyResult<()>;

    /// Opportunistically delete expired/used invites for an email
    async fn delete_stale_for_email(&self, email: &Email) -> TenancyResult<u64>;

    /// Reap all expired invites (lazy cleanup)
    async fn cleanup_expired(&self) -> TenancyResult<u64>;
}

/// Session repository trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    /// Create a session record
    async fn create(&self, session: &Session) -> TenancyResult<()>;

    /// Find session by ID
    async fn find_by_id(&self, session_id: SessionId) -> TenancyResult<Option<Session>>;

    /// Delete a session; idempotent
    async fn delete(&self, session_id: SessionId) -> TenancyResult<()>;

    /// Delete all sessions for an account, returning the count
    async fn delete_all_for_account(&self, account_id: &AccountId) -> TenancyResult<u64>;

    /// Reap all expired sessions (lazy cleanup)
    async fn cleanup_expired(&self) -> TenancyResult<u64>;
}

/// Everything the presentation layer needs from one store handle
///
/// Blanket-implemented for any type carrying all five repositories.
pub trait TenancyStore:
    OrganizationRepository
    + BranchRepository
    + AccountRepository
    + InviteRepository
    + SessionRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> TenancyStore for T where
    T: OrganizationRepository
        + BranchRepository
        + AccountRepository
        + InviteRepository
        + SessionRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}

/// Auth-provider directory client
///
/// The other half of the dual identity record. uid always equals the
/// profile account id; callers never mutate one side without the other.
#[trait_variant::make(DirectoryProvider: Send)]
pub trait LocalDirectoryProvider {
    /// Create or replace a directory record
    async fn upsert(&self, account: &DirectoryAccount) -> TenancyResult<()>;

    /// Find a directory record by uid
    async fn find(&self, uid: &AccountId) -> TenancyResult<Option<DirectoryAccount>>;

    /// Enable or disable sign-in for a uid
    async fn set_enabled(&self, uid: &AccountId, enabled: bool) -> TenancyResult<()>;

    /// Re-apply permission claims for a uid
    async fn set_claims(&self, uid: &AccountId, claims: &DirectoryClaims) -> TenancyResult<()>;

    /// Delete a directory record; idempotent, returns whether it existed
    async fn delete(&self, uid: &AccountId) -> TenancyResult<bool>;
}

/// Outbound notification delivery
///
/// Fire-and-forget relative to provisioning: callers log failures and
/// report the primary operation's success independently.
#[trait_variant::make(Notifier: Send)]
pub trait LocalNotifier {
    /// Deliver a credential-setup link for a fresh invite
    async fn send_invite(
        &self,
        email: &Email,
        name_hint: &str,
        raw_token: &str,
    ) -> TenancyResult<()>;

    /// Deliver a credential-reset link
    async fn send_reset(&self, email: &Email, raw_token: &str) -> TenancyResult<()>;
}
