//! PostgreSQL Repository Implementations

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::account::{
    AccountProfile, CredentialAlgorithm, DirectoryAccount, DirectoryClaims, StoredCredential,
};
use crate::domain::entity::branch::{Branch, NewBranch};
use crate::domain::entity::invite::InviteToken;
use crate::domain::entity::organization::Organization;
use crate::domain::entity::session::Session;
use crate::domain::repository::{
    AccountRepository, BranchRepository, DirectoryProvider, InviteRepository,
    OrganizationRepository, SessionRepository,
};
use crate::domain::value_object::{AccountStatus, Email, Role};
use crate::error::{TenancyError, TenancyResult};
use crate::infra::txn::{MAX_TXN_ATTEMPTS, is_serialization_conflict};
use kernel::id::{AccountId, BranchId, Id, InviteId, OrgId, SessionId};

/// PostgreSQL-backed tenancy repository
#[derive(Clone)]
pub struct PgTenancy {
    pool: PgPool,
}

impl PgTenancy {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reap expired sessions and invites (startup lazy cleanup)
    pub async fn cleanup_expired(&self) -> TenancyResult<(u64, u64)> {
        let sessions = SessionRepository::cleanup_expired(self).await?;
        let invites = InviteRepository::cleanup_expired(self).await?;

        tracing::info!(
            sessions_deleted = sessions,
            invites_deleted = invites,
            "Cleaned up expired tenancy records"
        );

        Ok((sessions, invites))
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct OrganizationRow {
    org_id: Uuid,
    name: String,
    slug: String,
    owner_account_id: Uuid,
    branch_count: i32,
    cashier_count: i32,
    next_branch_seq: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrganizationRow {
    fn into_organization(self) -> Organization {
        Organization {
            org_id: Id::from_uuid(self.org_id),
            name: self.name,
            slug: self.slug,
            owner_account_id: Id::from_uuid(self.owner_account_id),
            branch_count: self.branch_count.max(0) as u32,
            cashier_count: self.cashier_count.max(0) as u32,
            next_branch_seq: self.next_branch_seq.max(0) as u32,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BranchRow {
    branch_id: Uuid,
    org_id: Uuid,
    name: String,
    slug: String,
    username: String,
    branch_no: i32,
    manager_account_id: Option<Uuid>,
    next_cashier_seq: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BranchRow {
    fn into_branch(self) -> Branch {
        Branch {
            branch_id: Id::from_uuid(self.branch_id),
            org_id: Id::from_uuid(self.org_id),
            name: self.name,
            slug: self.slug,
            username: self.username,
            branch_no: self.branch_no.max(0) as u32,
            manager_account_id: self.manager_account_id.map(Id::from_uuid),
            next_cashier_seq: self.next_cashier_seq.max(0) as u32,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    account_id: Uuid,
    role: i16,
    org_id: Option<Uuid>,
    branch_id: Option<Uuid>,
    display_name: String,
    contact_email: Option<String>,
    login_email: String,
    username: Option<String>,
    status: i16,
    credential_hash: Option<String>,
    credential_algorithm: Option<i16>,
    credential_upgraded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_profile(self) -> TenancyResult<AccountProfile> {
        let role = Role::from_id(self.role)
            .ok_or_else(|| TenancyError::Internal(format!("Invalid role id: {}", self.role)))?;
        let status = AccountStatus::from_id(self.status)
            .ok_or_else(|| TenancyError::Internal(format!("Invalid status id: {}", self.status)))?;

        let credential = match (self.credential_hash, self.credential_algorithm) {
            (Some(hash), Some(alg)) => {
                let algorithm = CredentialAlgorithm::from_id(alg).ok_or_else(|| {
                    TenancyError::Internal(format!("Invalid credential algorithm id: {alg}"))
                })?;
                Some(StoredCredential {
                    hash,
                    algorithm,
                    upgraded_at: self.credential_upgraded_at,
                })
            }
            _ => None,
        };

        Ok(AccountProfile {
            account_id: Id::from_uuid(self.account_id),
            role,
            org_id: self.org_id.map(Id::from_uuid),
            branch_id: self.branch_id.map(Id::from_uuid),
            display_name: self.display_name,
            contact_email: self.contact_email.map(Email::from_db),
            login_email: Email::from_db(self.login_email),
            username: self.username,
            status,
            credential,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct InviteRow {
    invite_id: Uuid,
    email: String,
    name_hint: String,
    token_digest: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    used: bool,
}

impl InviteRow {
    fn into_invite(self) -> InviteToken {
        InviteToken {
            invite_id: Id::from_uuid(self.invite_id),
            email: Email::from_db(self.email),
            name_hint: self.name_hint,
            token_digest: self.token_digest,
            created_at: self.created_at,
            expires_at: self.expires_at,
            used: self.used,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: Uuid,
    account_id: Uuid,
    expires_at_ms: i64,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> Session {
        Session {
            session_id: Id::from_uuid(self.session_id),
            account_id: Id::from_uuid(self.account_id),
            expires_at_ms: self.expires_at_ms,
            created_at: self.created_at,
        }
    }
}

// ============================================================================
// Organization Repository Implementation
// ============================================================================

impl OrganizationRepository for PgTenancy {
    async fn create_with_owner(
        &self,
        org: &Organization,
        owner: &AccountProfile,
    ) -> TenancyResult<()> {
        let mut txn = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO organizations (
                org_id,
                name,
                slug,
                owner_account_id,
                branch_count,
                cashier_count,
                next_branch_seq,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(org.org_id.as_uuid())
        .bind(&org.name)
        .bind(&org.slug)
        .bind(org.owner_account_id.as_uuid())
        .bind(org.branch_count as i32)
        .bind(org.cashier_count as i32)
        .bind(org.next_branch_seq as i32)
        .bind(org.created_at)
        .bind(org.updated_at)
        .execute(&mut *txn)
        .await?;

        insert_profile(&mut txn, owner).await?;

        txn.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, org_id: &OrgId) -> TenancyResult<Option<Organization>> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT
                org_id,
                name,
                slug,
                owner_account_id,
                branch_count,
                cashier_count,
                next_branch_seq,
                created_at,
                updated_at
            FROM organizations
            WHERE org_id = $1
            "#,
        )
        .bind(org_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_organization()))
    }

    async fn taken_slugs_with_prefix(&self, prefix: &str) -> TenancyResult<HashSet<String>> {
        let slugs: Vec<String> =
            sqlx::query_scalar("SELECT slug FROM organizations WHERE slug LIKE $1 || '%'")
                .bind(prefix)
                .fetch_all(&self.pool)
                .await?;

        Ok(slugs.into_iter().collect())
    }

    async fn adjust_counts(
        &self,
        org_id: &OrgId,
        branch_delta: i32,
        cashier_delta: i32,
    ) -> TenancyResult<()> {
        sqlx::query(
            r#"
            UPDATE organizations SET
                branch_count = GREATEST(branch_count + $2, 0),
                cashier_count = GREATEST(cashier_count + $3, 0),
                updated_at = NOW()
            WHERE org_id = $1
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(branch_delta)
        .bind(cashier_delta)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Branch Repository Implementation
// ============================================================================

impl BranchRepository for PgTenancy {
    async fn insert_allocating_number(
        &self,
        org_id: &OrgId,
        actor: &AccountId,
        branch: NewBranch,
    ) -> TenancyResult<Branch> {
        // Optimistic serializable transaction, retried on conflict. Two
        // concurrent allocations against the same counter never both
        // commit.
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_insert_allocating_number(org_id, actor, &branch).await {
                Err(TenancyError::Database(e))
                    if is_serialization_conflict(&e) && attempt < MAX_TXN_ATTEMPTS =>
                {
                    tracing::debug!(attempt, org_id = %org_id, "Branch allocation conflicted; retrying");
                }
                Err(TenancyError::Database(e)) if is_serialization_conflict(&e) => {
                    return Err(TenancyError::Internal(
                        "Branch allocation kept conflicting".to_string(),
                    ));
                }
                other => return other,
            }
        }
    }

    async fn find_by_id(
        &self,
        org_id: &OrgId,
        branch_id: &BranchId,
    ) -> TenancyResult<Option<Branch>> {
        let row = sqlx::query_as::<_, BranchRow>(
            r#"
            SELECT
                branch_id,
                org_id,
                name,
                slug,
                username,
                branch_no,
                manager_account_id,
                next_cashier_seq,
                created_at,
                updated_at
            FROM branches
            WHERE org_id = $1 AND branch_id = $2
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(branch_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_branch()))
    }

    async fn taken_slugs_with_prefix(
        &self,
        org_id: &OrgId,
        prefix: &str,
    ) -> TenancyResult<HashSet<String>> {
        let slugs: Vec<String> = sqlx::query_scalar(
            "SELECT slug FROM branches WHERE org_id = $1 AND slug LIKE $2 || '%'",
        )
        .bind(org_id.as_uuid())
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        Ok(slugs.into_iter().collect())
    }

    async fn taken_usernames_with_prefix(&self, prefix: &str) -> TenancyResult<HashSet<String>> {
        let usernames: Vec<String> =
            sqlx::query_scalar("SELECT username FROM branches WHERE username LIKE $1 || '%'")
                .bind(prefix)
                .fetch_all(&self.pool)
                .await?;

        Ok(usernames.into_iter().collect())
    }

    async fn allocate_cashier_number(
        &self,
        org_id: &OrgId,
        branch_id: &BranchId,
    ) -> TenancyResult<u32> {
        // Single-statement read-and-increment; atomic by construction
        let allocated: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE branches SET
                next_cashier_seq = next_cashier_seq + 1,
                updated_at = NOW()
            WHERE org_id = $1 AND branch_id = $2
            RETURNING next_cashier_seq - 1
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(branch_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match allocated {
            Some(n) => Ok(n.max(0) as u32),
            None => Err(TenancyError::BranchNotFound),
        }
    }

    async fn set_manager(
        &self,
        org_id: &OrgId,
        branch_id: &BranchId,
        manager: Option<AccountId>,
    ) -> TenancyResult<()> {
        sqlx::query(
            r#"
            UPDATE branches SET
                manager_account_id = $3,
                updated_at = NOW()
            WHERE org_id = $1 AND branch_id = $2
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(branch_id.as_uuid())
        .bind(manager.map(|m| *m.as_uuid()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, org_id: &OrgId, branch_id: &BranchId) -> TenancyResult<()> {
        sqlx::query("DELETE FROM branches WHERE org_id = $1 AND branch_id = $2")
            .bind(org_id.as_uuid())
            .bind(branch_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

impl PgTenancy {
    /// One attempt of the branch-allocation transaction
    async fn try_insert_allocating_number(
        &self,
        org_id: &OrgId,
        actor: &AccountId,
        branch: &NewBranch,
    ) -> TenancyResult<Branch> {
        let mut txn = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *txn)
            .await?;

        // Re-read the organization inside the transaction
        let org: Option<(Uuid, i32)> = sqlx::query_as(
            "SELECT owner_account_id, next_branch_seq FROM organizations WHERE org_id = $1",
        )
        .bind(org_id.as_uuid())
        .fetch_optional(&mut *txn)
        .await?;

        let (owner, next_seq) = org.ok_or(TenancyError::OrganizationNotFound)?;

        // Ownership check before the first write
        if &owner != actor.as_uuid() {
            return Err(TenancyError::NotOwner);
        }

        let branch_no = next_seq.max(1);

        sqlx::query(
            r#"
            UPDATE organizations SET
                next_branch_seq = $2,
                updated_at = NOW()
            WHERE org_id = $1
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(branch_no + 1)
        .execute(&mut *txn)
        .await?;

        let created = branch.clone().into_branch(*org_id, branch_no as u32);

        sqlx::query(
            r#"
            INSERT INTO branches (
                branch_id,
                org_id,
                name,
                slug,
                username,
                branch_no,
                manager_account_id,
                next_cashier_seq,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(created.branch_id.as_uuid())
        .bind(created.org_id.as_uuid())
        .bind(&created.name)
        .bind(&created.slug)
        .bind(&created.username)
        .bind(created.branch_no as i32)
        .bind(created.manager_account_id.map(|m| *m.as_uuid()))
        .bind(created.next_cashier_seq as i32)
        .bind(created.created_at)
        .bind(created.updated_at)
        .execute(&mut *txn)
        .await?;

        txn.commit().await?;

        Ok(created)
    }
}

// ============================================================================
// Account Repository Implementation
// ============================================================================

/// Shared profile INSERT used by create and create_with_owner
async fn insert_profile(
    executor: &mut sqlx::PgTransaction<'_>,
    profile: &AccountProfile,
) -> TenancyResult<()> {
    sqlx::query(
        r#"
        INSERT INTO account_profiles (
            account_id,
            role,
            org_id,
            branch_id,
            display_name,
            contact_email,
            login_email,
            username,
            status,
            credential_hash,
            credential_algorithm,
            credential_upgraded_at,
            created_at,
            updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(profile.account_id.as_uuid())
    .bind(profile.role.id())
    .bind(profile.org_id.map(|id| *id.as_uuid()))
    .bind(profile.branch_id.map(|id| *id.as_uuid()))
    .bind(&profile.display_name)
    .bind(profile.contact_email.as_ref().map(|e| e.as_str()))
    .bind(profile.login_email.as_str())
    .bind(profile.username.as_deref())
    .bind(profile.status.id())
    .bind(profile.credential.as_ref().map(|c| c.hash.as_str()))
    .bind(profile.credential.as_ref().map(|c| c.algorithm.id()))
    .bind(profile.credential.as_ref().and_then(|c| c.upgraded_at))
    .bind(profile.created_at)
    .bind(profile.updated_at)
    .execute(&mut **executor)
    .await?;

    Ok(())
}

const ACCOUNT_COLUMNS: &str = r#"
    account_id,
    role,
    org_id,
    branch_id,
    display_name,
    contact_email,
    login_email,
    username,
    status,
    credential_hash,
    credential_algorithm,
    credential_upgraded_at,
    created_at,
    updated_at
"#;

impl AccountRepository for PgTenancy {
    async fn create(&self, profile: &AccountProfile) -> TenancyResult<()> {
        let mut txn = self.pool.begin().await?;
        insert_profile(&mut txn, profile).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, account_id: &AccountId) -> TenancyResult<Option<AccountProfile>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account_profiles WHERE account_id = $1"
        ))
        .bind(account_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_profile()).transpose()
    }

    async fn find_by_login_email(&self, email: &Email) -> TenancyResult<Option<AccountProfile>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account_profiles WHERE login_email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_profile()).transpose()
    }

    async fn exists_by_login_email(&self, role: Role, email: &Email) -> TenancyResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM account_profiles WHERE login_email = $1 AND role = $2)",
        )
        .bind(email.as_str())
        .bind(role.id())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list_by_branch(
        &self,
        org_id: &OrgId,
        branch_id: &BranchId,
    ) -> TenancyResult<Vec<AccountProfile>> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account_profiles WHERE org_id = $1 AND branch_id = $2"
        ))
        .bind(org_id.as_uuid())
        .bind(branch_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_profile()).collect()
    }

    async fn update(&self, profile: &AccountProfile) -> TenancyResult<()> {
        sqlx::query(
            r#"
            UPDATE account_profiles SET
                role = $2,
                org_id = $3,
                branch_id = $4,
                display_name = $5,
                contact_email = $6,
                login_email = $7,
                username = $8,
                status = $9,
                credential_hash = $10,
                credential_algorithm = $11,
                credential_upgraded_at = $12,
                updated_at = $13
            WHERE account_id = $1
            "#,
        )
        .bind(profile.account_id.as_uuid())
        .bind(profile.role.id())
        .bind(profile.org_id.map(|id| *id.as_uuid()))
        .bind(profile.branch_id.map(|id| *id.as_uuid()))
        .bind(&profile.display_name)
        .bind(profile.contact_email.as_ref().map(|e| e.as_str()))
        .bind(profile.login_email.as_str())
        .bind(profile.username.as_deref())
        .bind(profile.status.id())
        .bind(profile.credential.as_ref().map(|c| c.hash.as_str()))
        .bind(profile.credential.as_ref().map(|c| c.algorithm.id()))
        .bind(profile.credential.as_ref().and_then(|c| c.upgraded_at))
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, account_id: &AccountId) -> TenancyResult<bool> {
        let affected = sqlx::query("DELETE FROM account_profiles WHERE account_id = $1")
            .bind(account_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }
}

// ============================================================================
// Invite Repository Implementation
// ============================================================================

impl InviteRepository for PgTenancy {
    async fn create(&self, invite: &InviteToken) -> TenancyResult<()> {
        sqlx::query(
            r#"
            INSERT INTO invite_tokens (
                invite_id,
                email,
                name_hint,
                token_digest,
                created_at,
                expires_at,
                used
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(invite.invite_id.as_uuid())
        .bind(invite.email.as_str())
        .bind(&invite.name_hint)
        .bind(&invite.token_digest)
        .bind(invite.created_at)
        .bind(invite.expires_at)
        .bind(invite.used)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_digest(&self, digest: &str) -> TenancyResult<Option<InviteToken>> {
        let row = sqlx::query_as::<_, InviteRow>(
            r#"
            SELECT
                invite_id,
                email,
                name_hint,
                token_digest,
                created_at,
                expires_at,
                used
            FROM invite_tokens
            WHERE token_digest = $1
            "#,
        )
        .bind(digest)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_invite()))
    }

    async fn mark_used(&self, invite_id: &InviteId) -> TenancyResult<bool> {
        // Conditional flip: check and set in one atomic statement, so
        // exactly one of any concurrent consumers wins
        let affected =
            sqlx::query("UPDATE invite_tokens SET used = TRUE WHERE invite_id = $1 AND used = FALSE")
                .bind(invite_id.as_uuid())
                .execute(&self.pool)
                .await?
                .rows_affected();

        Ok(affected == 1)
    }

    async fn delete(&self, invite_id: &InviteId) -> TenancyResult<()> {
        sqlx::query("DELETE FROM invite_tokens WHERE invite_id = $1")
            .bind(invite_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_stale_for_email(&self, email: &Email) -> TenancyResult<u64> {
        let deleted = sqlx::query(
            "DELETE FROM invite_tokens WHERE email = $1 AND (used = TRUE OR expires_at < NOW())",
        )
        .bind(email.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(deleted)
    }

    async fn cleanup_expired(&self) -> TenancyResult<u64> {
        let deleted = sqlx::query("DELETE FROM invite_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for PgTenancy {
    async fn create(&self, session: &Session) -> TenancyResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (
                session_id,
                account_id,
                expires_at_ms,
                created_at
            ) VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session.session_id.as_uuid())
        .bind(session.account_id.as_uuid())
        .bind(session.expires_at_ms)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, session_id: SessionId) -> TenancyResult<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                session_id,
                account_id,
                expires_at_ms,
                created_at
            FROM sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_session()))
    }

    async fn delete(&self, session_id: SessionId) -> TenancyResult<()> {
        sqlx::query("DELETE FROM sessions WHERE session_id = $1")
            .bind(session_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_all_for_account(&self, account_id: &AccountId) -> TenancyResult<u64> {
        let deleted = sqlx::query("DELETE FROM sessions WHERE account_id = $1")
            .bind(account_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }

    async fn cleanup_expired(&self) -> TenancyResult<u64> {
        let now_ms = Utc::now().timestamp_millis();

        let deleted = sqlx::query("DELETE FROM sessions WHERE expires_at_ms < $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Directory Provider Implementation
// ============================================================================

/// PostgreSQL-backed auth-provider directory
///
/// Stands in for the external identity provider behind the same trait
/// boundary the rest of the core depends on.
#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct DirectoryRow {
    uid: Uuid,
    login_email: String,
    disabled: bool,
    claims: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DirectoryRow {
    fn into_account(self) -> TenancyResult<DirectoryAccount> {
        let claims: DirectoryClaims = serde_json::from_str(&self.claims)
            .map_err(|e| TenancyError::Internal(format!("Invalid stored claims: {e}")))?;

        Ok(DirectoryAccount {
            uid: Id::from_uuid(self.uid),
            login_email: Email::from_db(self.login_email),
            disabled: self.disabled,
            claims,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl DirectoryProvider for PgDirectory {
    async fn upsert(&self, account: &DirectoryAccount) -> TenancyResult<()> {
        let claims = serde_json::to_string(&account.claims)
            .map_err(|e| TenancyError::Internal(format!("Failed to encode claims: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO directory_accounts (
                uid,
                login_email,
                disabled,
                claims,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (uid) DO UPDATE SET
                login_email = EXCLUDED.login_email,
                disabled = EXCLUDED.disabled,
                claims = EXCLUDED.claims,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(account.uid.as_uuid())
        .bind(account.login_email.as_str())
        .bind(account.disabled)
        .bind(&claims)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, uid: &AccountId) -> TenancyResult<Option<DirectoryAccount>> {
        let row = sqlx::query_as::<_, DirectoryRow>(
            r#"
            SELECT
                uid,
                login_email,
                disabled,
                claims,
                created_at,
                updated_at
            FROM directory_accounts
            WHERE uid = $1
            "#,
        )
        .bind(uid.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_account()).transpose()
    }

    async fn set_enabled(&self, uid: &AccountId, enabled: bool) -> TenancyResult<()> {
        sqlx::query(
            "UPDATE directory_accounts SET disabled = $2, updated_at = NOW() WHERE uid = $1",
        )
        .bind(uid.as_uuid())
        .bind(!enabled)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_claims(&self, uid: &AccountId, claims: &DirectoryClaims) -> TenancyResult<()> {
        let claims = serde_json::to_string(claims)
            .map_err(|e| TenancyError::Internal(format!("Failed to encode claims: {e}")))?;

        sqlx::query("UPDATE directory_accounts SET claims = $2, updated_at = NOW() WHERE uid = $1")
            .bind(uid.as_uuid())
            .bind(&claims)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, uid: &AccountId) -> TenancyResult<bool> {
        let affected = sqlx::query("DELETE FROM directory_accounts WHERE uid = $1")
            .bind(uid.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }
}
