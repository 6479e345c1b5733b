//! In-Memory Repository Implementations
//!
//! Single-lock store implementing the same traits as the PostgreSQL
//! backend, with the same atomicity guarantees (each composite operation
//! runs inside one critical section). Used as the test double the
//! services are designed against; also handy for demos.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::domain::entity::account::{AccountProfile, DirectoryAccount, DirectoryClaims};
use crate::domain::entity::branch::{Branch, NewBranch};
use crate::domain::entity::invite::InviteToken;
use crate::domain::entity::organization::Organization;
use crate::domain::entity::session::Session;
use crate::domain::repository::{
    AccountRepository, BranchRepository, DirectoryProvider, InviteRepository, Notifier,
    OrganizationRepository, SessionRepository,
};
use crate::domain::value_object::{Email, Role};
use crate::error::{TenancyError, TenancyResult};
use kernel::id::{AccountId, BranchId, InviteId, OrgId, SessionId};

#[derive(Default)]
struct StoreState {
    organizations: HashMap<Uuid, Organization>,
    branches: HashMap<Uuid, Branch>,
    accounts: HashMap<Uuid, AccountProfile>,
    invites: HashMap<Uuid, InviteToken>,
    sessions: HashMap<Uuid, Session>,
}

/// In-memory tenancy store
#[derive(Clone, Default)]
pub struct InMemoryTenancy {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryTenancy {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().expect("tenancy store lock poisoned")
    }
}

impl OrganizationRepository for InMemoryTenancy {
    async fn create_with_owner(
        &self,
        org: &Organization,
        owner: &AccountProfile,
    ) -> TenancyResult<()> {
        let mut state = self.state();
        state.organizations.insert(*org.org_id.as_uuid(), org.clone());
        state.accounts.insert(*owner.account_id.as_uuid(), owner.clone());
        Ok(())
    }

    async fn find_by_id(&self, org_id: &OrgId) -> TenancyResult<Option<Organization>> {
        Ok(self.state().organizations.get(org_id.as_uuid()).cloned())
    }

    async fn taken_slugs_with_prefix(&self, prefix: &str) -> TenancyResult<HashSet<String>> {
        Ok(self
            .state()
            .organizations
            .values()
            .filter(|o| o.slug.starts_with(prefix))
            .map(|o| o.slug.clone())
            .collect())
    }

    async fn adjust_counts(
        &self,
        org_id: &OrgId,
        branch_delta: i32,
        cashier_delta: i32,
    ) -> TenancyResult<()> {
        let mut state = self.state();
        if let Some(org) = state.organizations.get_mut(org_id.as_uuid()) {
            org.branch_count = org.branch_count.saturating_add_signed(branch_delta);
            org.cashier_count = org.cashier_count.saturating_add_signed(cashier_delta);
            org.updated_at = Utc::now();
        }
        Ok(())
    }
}

impl BranchRepository for InMemoryTenancy {
    async fn insert_allocating_number(
        &self,
        org_id: &OrgId,
        actor: &AccountId,
        branch: NewBranch,
    ) -> TenancyResult<Branch> {
        // One critical section covers the ownership check, the counter
        // allocation, and the insert - the in-memory equivalent of the
        // store transaction.
        let mut state = self.state();

        let org = state
            .organizations
            .get_mut(org_id.as_uuid())
            .ok_or(TenancyError::OrganizationNotFound)?;

        if !org.is_owner(actor) {
            return Err(TenancyError::NotOwner);
        }

        let branch_no = org.allocate_branch_number();
        let created = branch.into_branch(*org_id, branch_no);
        state.branches.insert(*created.branch_id.as_uuid(), created.clone());

        Ok(created)
    }

    async fn find_by_id(
        &self,
        org_id: &OrgId,
        branch_id: &BranchId,
    ) -> TenancyResult<Option<Branch>> {
        Ok(self
            .state()
            .branches
            .get(branch_id.as_uuid())
            .filter(|b| &b.org_id == org_id)
            .cloned())
    }

    async fn taken_slugs_with_prefix(
        &self,
        org_id: &OrgId,
        prefix: &str,
    ) -> TenancyResult<HashSet<String>> {
        Ok(self
            .state()
            .branches
            .values()
            .filter(|b| &b.org_id == org_id && b.slug.starts_with(prefix))
            .map(|b| b.slug.clone())
            .collect())
    }

    async fn taken_usernames_with_prefix(&self, prefix: &str) -> TenancyResult<HashSet<String>> {
        Ok(self
            .state()
            .branches
            .values()
            .filter(|b| b.username.starts_with(prefix))
            .map(|b| b.username.clone())
            .collect())
    }

    async fn allocate_cashier_number(
        &self,
        org_id: &OrgId,
        branch_id: &BranchId,
    ) -> TenancyResult<u32> {
        let mut state = self.state();
        let branch = state
            .branches
            .get_mut(branch_id.as_uuid())
            .filter(|b| &b.org_id == org_id)
            .ok_or(TenancyError::BranchNotFound)?;

        Ok(branch.allocate_cashier_number())
    }

    async fn set_manager(
        &self,
        org_id: &OrgId,
        branch_id: &BranchId,
        manager: Option<AccountId>,
    ) -> TenancyResult<()> {
        let mut state = self.state();
        if let Some(branch) = state
            .branches
            .get_mut(branch_id.as_uuid())
            .filter(|b| &b.org_id == org_id)
        {
            branch.set_manager(manager);
        }
        Ok(())
    }

    async fn delete(&self, org_id: &OrgId, branch_id: &BranchId) -> TenancyResult<()> {
        let mut state = self.state();
        if state
            .branches
            .get(branch_id.as_uuid())
            .is_some_and(|b| &b.org_id == org_id)
        {
            state.branches.remove(branch_id.as_uuid());
        }
        Ok(())
    }
}

impl AccountRepository for InMemoryTenancy {
    async fn create(&self, profile: &AccountProfile) -> TenancyResult<()> {
        self.state()
            .accounts
            .insert(*profile.account_id.as_uuid(), profile.clone());
        Ok(())
    }

    async fn find_by_id(&self, account_id: &AccountId) -> TenancyResult<Option<AccountProfile>> {
        Ok(self.state().accounts.get(account_id.as_uuid()).cloned())
    }

    async fn find_by_login_email(&self, email: &Email) -> TenancyResult<Option<AccountProfile>> {
        Ok(self
            .state()
            .accounts
            .values()
            .find(|p| &p.login_email == email)
            .cloned())
    }

    async fn exists_by_login_email(&self, role: Role, email: &Email) -> TenancyResult<bool> {
        Ok(self
            .state()
            .accounts
            .values()
            .any(|p| p.role == role && &p.login_email == email))
    }

    async fn list_by_branch(
        &self,
        org_id: &OrgId,
        branch_id: &BranchId,
    ) -> TenancyResult<Vec<AccountProfile>> {
        Ok(self
            .state()
            .accounts
            .values()
            .filter(|p| p.org_id.as_ref() == Some(org_id) && p.branch_id.as_ref() == Some(branch_id))
            .cloned()
            .collect())
    }

    async fn update(&self, profile: &AccountProfile) -> TenancyResult<()> {
        self.state()
            .accounts
            .insert(*profile.account_id.as_uuid(), profile.clone());
        Ok(())
    }

    async fn delete(&self, account_id: &AccountId) -> TenancyResult<bool> {
        Ok(self.state().accounts.remove(account_id.as_uuid()).is_some())
    }
}

impl InviteRepository for InMemoryTenancy {
    async fn create(&self, invite: &InviteToken) -> TenancyResult<()> {
        self.state()
            .invites
            .insert(*invite.invite_id.as_uuid(), invite.clone());
        Ok(())
    }

    async fn find_by_digest(&self, digest: &str) -> TenancyResult<Option<InviteToken>> {
        Ok(self
            .state()
            .invites
            .values()
            .find(|i| i.token_digest == digest)
            .cloned())
    }

    async fn mark_used(&self, invite_id: &InviteId) -> TenancyResult<bool> {
        // Check-and-set under the lock: exactly one concurrent caller
        // observes used == false
        let mut state = self.state();
        match state.invites.get_mut(invite_id.as_uuid()) {
            Some(invite) if !invite.used => {
                invite.used = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, invite_id: &InviteId) -> TenancyResult<()> {
        self.state().invites.remove(invite_id.as_uuid());
        Ok(())
    }

    async fn delete_stale_for_email(&self, email: &Email) -> TenancyResult<u64> {
        let mut state = self.state();
        let before = state.invites.len();
        state
            .invites
            .retain(|_, i| !(&i.email == email && i.is_stale()));
        Ok((before - state.invites.len()) as u64)
    }

    async fn cleanup_expired(&self) -> TenancyResult<u64> {
        let mut state = self.state();
        let before = state.invites.len();
        state.invites.retain(|_, i| !i.is_expired());
        Ok((before - state.invites.len()) as u64)
    }
}

impl SessionRepository for InMemoryTenancy {
    async fn create(&self, session: &Session) -> TenancyResult<()> {
        self.state()
            .sessions
            .insert(*session.session_id.as_uuid(), session.clone());
        Ok(())
    }

    async fn find_by_id(&self, session_id: SessionId) -> TenancyResult<Option<Session>> {
        Ok(self.state().sessions.get(session_id.as_uuid()).cloned())
    }

    async fn delete(&self, session_id: SessionId) -> TenancyResult<()> {
        self.state().sessions.remove(session_id.as_uuid());
        Ok(())
    }

    async fn delete_all_for_account(&self, account_id: &AccountId) -> TenancyResult<u64> {
        let mut state = self.state();
        let before = state.sessions.len();
        state.sessions.retain(|_, s| &s.account_id != account_id);
        Ok((before - state.sessions.len()) as u64)
    }

    async fn cleanup_expired(&self) -> TenancyResult<u64> {
        let mut state = self.state();
        let before = state.sessions.len();
        state.sessions.retain(|_, s| !s.is_expired());
        Ok((before - state.sessions.len()) as u64)
    }
}

// ============================================================================
// Directory double
// ============================================================================

/// In-memory auth-provider directory
#[derive(Clone, Default)]
pub struct InMemoryDirectory {
    accounts: Arc<Mutex<HashMap<Uuid, DirectoryAccount>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn accounts(&self) -> MutexGuard<'_, HashMap<Uuid, DirectoryAccount>> {
        self.accounts.lock().expect("directory lock poisoned")
    }
}

impl DirectoryProvider for InMemoryDirectory {
    async fn upsert(&self, account: &DirectoryAccount) -> TenancyResult<()> {
        self.accounts().insert(*account.uid.as_uuid(), account.clone());
        Ok(())
    }

    async fn find(&self, uid: &AccountId) -> TenancyResult<Option<DirectoryAccount>> {
        Ok(self.accounts().get(uid.as_uuid()).cloned())
    }

    async fn set_enabled(&self, uid: &AccountId, enabled: bool) -> TenancyResult<()> {
        if let Some(account) = self.accounts().get_mut(uid.as_uuid()) {
            account.disabled = !enabled;
            account.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_claims(&self, uid: &AccountId, claims: &DirectoryClaims) -> TenancyResult<()> {
        if let Some(account) = self.accounts().get_mut(uid.as_uuid()) {
            account.claims = claims.clone();
            account.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, uid: &AccountId) -> TenancyResult<bool> {
        Ok(self.accounts().remove(uid.as_uuid()).is_some())
    }
}

// ============================================================================
// Notifier doubles
// ============================================================================

/// Notifier double that records every delivery
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentNotification>>>,
}

/// A recorded delivery
#[derive(Debug, Clone)]
pub struct SentNotification {
    pub email: String,
    pub raw_token: String,
    pub is_reset: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().expect("notifier lock poisoned").clone()
    }

    /// The raw token of the most recent delivery
    pub fn last_token(&self) -> Option<String> {
        self.sent().last().map(|s| s.raw_token.clone())
    }
}

impl Notifier for RecordingNotifier {
    async fn send_invite(
        &self,
        email: &Email,
        _name_hint: &str,
        raw_token: &str,
    ) -> TenancyResult<()> {
        self.sent.lock().expect("notifier lock poisoned").push(SentNotification {
            email: email.as_str().to_string(),
            raw_token: raw_token.to_string(),
            is_reset: false,
        });
        Ok(())
    }

    async fn send_reset(&self, email: &Email, raw_token: &str) -> TenancyResult<()> {
        self.sent.lock().expect("notifier lock poisoned").push(SentNotification {
            email: email.as_str().to_string(),
            raw_token: raw_token.to_string(),
            is_reset: true,
        });
        Ok(())
    }
}

/// Notifier double that always fails delivery
#[derive(Clone, Default)]
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    async fn send_invite(
        &self,
        _email: &Email,
        _name_hint: &str,
        _raw_token: &str,
    ) -> TenancyResult<()> {
        Err(TenancyError::Internal("delivery refused".to_string()))
    }

    async fn send_reset(&self, _email: &Email, _raw_token: &str) -> TenancyResult<()> {
        Err(TenancyError::Internal("delivery refused".to_string()))
    }
}
