//! Branch Entity

use chrono::{DateTime, Utc};
use kernel::id::{AccountId, BranchId, OrgId};

/// Branch entity
///
/// `branch_no` and `username` are assigned exactly once at creation and
/// never change afterwards. The manager slot holds at most one identity;
/// reassignment re-provisions the slot rather than adding a second one.
#[derive(Debug, Clone)]
pub struct Branch {
    pub branch_id: BranchId,
    pub org_id: OrgId,
    /// Human-chosen display name
    pub name: String,
    /// Derived slug, unique within the organization
    pub slug: String,
    /// Derived username: org slug + branch slug, suffixed on collision
    pub username: String,
    /// Sequential branch number within the organization
    pub branch_no: u32,
    /// Fixed manager identity slot (nullable)
    pub manager_account_id: Option<AccountId>,
    /// Next cashier number to hand out (starts at 1)
    pub next_cashier_seq: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields resolved before the allocation transaction
///
/// Slug and username derivation happen over pre-read collision sets; the
/// branch number is assigned inside the transaction that inserts this.
#[derive(Debug, Clone)]
pub struct NewBranch {
    pub branch_id: BranchId,
    pub name: String,
    pub slug: String,
    pub username: String,
}

impl NewBranch {
    pub fn new(name: impl Into<String>, slug: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            branch_id: BranchId::new(),
            name: name.into(),
            slug: slug.into(),
            username: username.into(),
        }
    }

    /// Materialize the branch once its number has been allocated
    pub fn into_branch(self, org_id: OrgId, branch_no: u32) -> Branch {
        let now = Utc::now();
        Branch {
            branch_id: self.branch_id,
            org_id,
            name: self.name,
            slug: self.slug,
            username: self.username,
            branch_no,
            manager_account_id: None,
            next_cashier_seq: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Branch {
    /// Allocate the next cashier number
    ///
    /// Must only be called inside the store's transaction boundary.
    pub fn allocate_cashier_number(&mut self) -> u32 {
        let allocated = self.next_cashier_seq;
        self.next_cashier_seq += 1;
        self.updated_at = Utc::now();
        allocated
    }

    /// Assign or replace the manager slot
    pub fn set_manager(&mut self, manager: Option<AccountId>) {
        self.manager_account_id = manager;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::id::Id;

    #[test]
    fn test_new_branch_materialization() {
        let org_id: OrgId = Id::new();
        let new_branch = NewBranch::new("Colombo", "colombo", "acme-colombo");
        let branch = new_branch.into_branch(org_id, 1);

        assert_eq!(branch.branch_no, 1);
        assert_eq!(branch.username, "acme-colombo");
        assert_eq!(branch.next_cashier_seq, 1);
        assert!(branch.manager_account_id.is_none());
    }

    #[test]
    fn test_allocate_cashier_numbers_sequential() {
        let mut branch =
            NewBranch::new("Colombo", "colombo", "acme-colombo").into_branch(Id::new(), 1);
        assert_eq!(branch.allocate_cashier_number(), 1);
        assert_eq!(branch.allocate_cashier_number(), 2);
        assert_eq!(branch.next_cashier_seq, 3);
    }

    #[test]
    fn test_manager_slot() {
        let mut branch =
            NewBranch::new("Colombo", "colombo", "acme-colombo").into_branch(Id::new(), 1);
        let mgr: AccountId = Id::new();
        branch.set_manager(Some(mgr));
        assert_eq!(branch.manager_account_id, Some(mgr));
        branch.set_manager(None);
        assert!(branch.manager_account_id.is_none());
    }
}
