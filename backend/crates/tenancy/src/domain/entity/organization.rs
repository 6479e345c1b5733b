//! Organization Entity
//!
//! Root of the tenant hierarchy: Organization → Branch → Cashier.

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, OrgId};

/// Organization entity
///
/// `slug` is unique across all organizations (checked by lookup before
/// the write). `next_branch_seq` is monotonically non-decreasing and an
/// allocated number is never reused.
#[derive(Debug, Clone)]
pub struct Organization {
    pub org_id: OrgId,
    /// Human-chosen display name
    pub name: String,
    /// Derived unique slug
    pub slug: String,
    /// Owning identity (profile id == directory uid)
    pub owner_account_id: AccountId,
    /// Denormalized branch count for dashboards
    pub branch_count: u32,
    /// Denormalized cashier count for dashboards
    pub cashier_count: u32,
    /// Next branch number to hand out (starts at 1)
    pub next_branch_seq: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Create a new organization
    pub fn new(name: impl Into<String>, slug: impl Into<String>, owner: AccountId) -> Self {
        let now = Utc::now();
        Self {
            org_id: OrgId::new(),
            name: name.into(),
            slug: slug.into(),
            owner_account_id: owner,
            branch_count: 0,
            cashier_count: 0,
            next_branch_seq: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the given account owns this organization
    pub fn is_owner(&self, account_id: &AccountId) -> bool {
        &self.owner_account_id == account_id
    }

    /// Allocate the next branch number
    ///
    /// Must only be called inside the store's transaction boundary; the
    /// counter never moves backwards and numbers are never reused.
    pub fn allocate_branch_number(&mut self) -> u32 {
        let allocated = self.next_branch_seq;
        self.next_branch_seq += 1;
        self.updated_at = Utc::now();
        allocated
    }
}
