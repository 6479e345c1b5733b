//! Account Identity Entities
//!
//! An account is one logical aggregate with two records that must never
//! drift apart: the profile record (this store) and the auth-provider
//! directory record (uid == profile id). Both sides are only ever
//! mutated through the identity provisioner.

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, BranchId, OrgId};
use serde::{Deserialize, Serialize};

use crate::domain::value_object::role::{CLAIMS_VERSION, Role};
use crate::domain::value_object::{AccountStatus, Email};

// ============================================================================
// Credential
// ============================================================================

/// Hash algorithm tag for a stored credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum CredentialAlgorithm {
    /// Modern scheme: Argon2id PHC string, peppered
    Argon2id = 0,
    /// Legacy scheme: unsalted, unpeppered SHA-256 hex digest
    LegacySha256 = 1,
}

impl CredentialAlgorithm {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(Self::Argon2id),
            1 => Some(Self::LegacySha256),
            _ => None,
        }
    }
}

/// Stored credential: hash, algorithm tag, upgrade timestamp
#[derive(Debug, Clone)]
pub struct StoredCredential {
    pub hash: String,
    pub algorithm: CredentialAlgorithm,
    /// Set when a legacy hash was re-hashed under the modern scheme
    pub upgraded_at: Option<DateTime<Utc>>,
}

impl StoredCredential {
    /// A freshly hashed modern credential
    pub fn modern(phc_hash: impl Into<String>) -> Self {
        Self {
            hash: phc_hash.into(),
            algorithm: CredentialAlgorithm::Argon2id,
            upgraded_at: None,
        }
    }

    /// A modern credential that replaced a matching legacy hash
    pub fn upgraded(phc_hash: impl Into<String>) -> Self {
        Self {
            hash: phc_hash.into(),
            algorithm: CredentialAlgorithm::Argon2id,
            upgraded_at: Some(Utc::now()),
        }
    }

    /// A legacy digest carried over from the old scheme
    pub fn legacy(hex_digest: impl Into<String>) -> Self {
        Self {
            hash: hex_digest.into(),
            algorithm: CredentialAlgorithm::LegacySha256,
            upgraded_at: None,
        }
    }
}

// ============================================================================
// Profile record
// ============================================================================

/// Account profile record
///
/// The profile half of the dual identity record. `account_id` equals the
/// directory uid by construction.
#[derive(Debug, Clone)]
pub struct AccountProfile {
    pub account_id: AccountId,
    pub role: Role,
    /// Organization scope (None for platform roles)
    pub org_id: Option<OrgId>,
    /// Branch scope (managers, cashiers)
    pub branch_id: Option<BranchId>,
    pub display_name: String,
    /// Real mailbox, when the account has one
    pub contact_email: Option<Email>,
    /// Auth-provider login key: real email or derived virtual address
    pub login_email: Email,
    /// Derived username for virtual identities
    pub username: Option<String>,
    pub status: AccountStatus,
    pub credential: Option<StoredCredential>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields describing an identity to provision
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub role: Role,
    pub org_id: Option<OrgId>,
    pub branch_id: Option<BranchId>,
    pub display_name: String,
    pub contact_email: Option<Email>,
    pub login_email: Email,
    pub username: Option<String>,
}

impl AccountProfile {
    /// Create a profile from a provisioning request
    ///
    /// The caller decides the status: Active when a credential is set
    /// inline, Pending for the deferred invite flow.
    pub fn from_identity(
        identity: NewIdentity,
        status: AccountStatus,
        credential: Option<StoredCredential>,
    ) -> Self {
        let now = Utc::now();
        Self {
            account_id: AccountId::new(),
            role: identity.role,
            org_id: identity.org_id,
            branch_id: identity.branch_id,
            display_name: identity.display_name,
            contact_email: identity.contact_email,
            login_email: identity.login_email,
            username: identity.username,
            status,
            credential,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the credential and activate the account
    pub fn activate_with_credential(&mut self, credential: StoredCredential) {
        self.credential = Some(credential);
        self.status = AccountStatus::Active;
        self.updated_at = Utc::now();
    }

    /// Replace the credential (e.g., legacy-hash upgrade)
    pub fn replace_credential(&mut self, credential: StoredCredential) {
        self.credential = Some(credential);
        self.updated_at = Utc::now();
    }

    /// Check if sign-in is allowed for this profile
    pub fn can_sign_in(&self) -> bool {
        self.status.can_sign_in()
    }
}

// ============================================================================
// Directory record (auth-provider half)
// ============================================================================

/// Versioned permission claims pushed to the auth provider
///
/// Fully determined by role and tenant refs; re-derived and re-applied
/// on every mutation that changes either. IDs travel as strings because
/// claims are a wire-level artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryClaims {
    pub version: u8,
    pub role: String,
    pub org_id: Option<String>,
    pub branch_id: Option<String>,
    pub permissions: Vec<String>,
}

impl DirectoryClaims {
    /// Derive the claims for a role and its tenant scope
    pub fn for_role(role: Role, org_id: Option<&OrgId>, branch_id: Option<&BranchId>) -> Self {
        Self {
            version: CLAIMS_VERSION,
            role: role.code().to_string(),
            org_id: org_id.map(|id| id.to_string()),
            branch_id: branch_id.map(|id| id.to_string()),
            permissions: role.permissions().iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Derive the claims matching a profile record
    pub fn for_profile(profile: &AccountProfile) -> Self {
        Self::for_role(
            profile.role,
            profile.org_id.as_ref(),
            profile.branch_id.as_ref(),
        )
    }
}

/// Auth-provider directory record
#[derive(Debug, Clone)]
pub struct DirectoryAccount {
    /// uid == profile account_id, always
    pub uid: AccountId,
    pub login_email: Email,
    pub disabled: bool,
    pub claims: DirectoryClaims,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DirectoryAccount {
    /// Create the directory half for a profile
    pub fn for_profile(profile: &AccountProfile) -> Self {
        let now = Utc::now();
        Self {
            uid: profile.account_id,
            login_email: profile.login_email.clone(),
            disabled: !profile.status.can_sign_in(),
            claims: DirectoryClaims::for_profile(profile),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::id::Id;

    fn identity(role: Role) -> NewIdentity {
        NewIdentity {
            role,
            org_id: Some(Id::new()),
            branch_id: Some(Id::new()),
            display_name: "Kasun".to_string(),
            contact_email: None,
            login_email: Email::virtual_for("acme-colombo-1"),
            username: Some("acme-colombo-1".to_string()),
        }
    }

    #[test]
    fn test_profile_activation() {
        let mut profile =
            AccountProfile::from_identity(identity(Role::Cashier), AccountStatus::Pending, None);
        assert!(!profile.can_sign_in());
        assert!(profile.credential.is_none());

        profile.activate_with_credential(StoredCredential::modern("$argon2id$test"));
        assert!(profile.can_sign_in());
        assert_eq!(profile.status, AccountStatus::Active);
    }

    #[test]
    fn test_claims_follow_profile_scope() {
        let profile =
            AccountProfile::from_identity(identity(Role::Manager), AccountStatus::Active, None);
        let claims = DirectoryClaims::for_profile(&profile);

        assert_eq!(claims.version, CLAIMS_VERSION);
        assert_eq!(claims.role, "manager");
        assert_eq!(claims.org_id, profile.org_id.map(|id| id.to_string()));
        assert_eq!(claims.branch_id, profile.branch_id.map(|id| id.to_string()));
        assert!(claims.permissions.contains(&"cashier:manage".to_string()));
    }

    #[test]
    fn test_directory_mirrors_profile() {
        let profile =
            AccountProfile::from_identity(identity(Role::Cashier), AccountStatus::Active, None);
        let dir = DirectoryAccount::for_profile(&profile);
        assert_eq!(dir.uid, profile.account_id);
        assert!(!dir.disabled);

        let pending =
            AccountProfile::from_identity(identity(Role::Cashier), AccountStatus::Pending, None);
        let dir = DirectoryAccount::for_profile(&pending);
        assert!(dir.disabled);
    }

    #[test]
    fn test_credential_algorithm_tags() {
        let modern = StoredCredential::modern("$argon2id$x");
        assert_eq!(modern.algorithm, CredentialAlgorithm::Argon2id);
        assert!(modern.upgraded_at.is_none());

        let upgraded = StoredCredential::upgraded("$argon2id$x");
        assert!(upgraded.upgraded_at.is_some());

        let legacy = StoredCredential::legacy("ab".repeat(32));
        assert_eq!(legacy.algorithm, CredentialAlgorithm::LegacySha256);
    }
}
