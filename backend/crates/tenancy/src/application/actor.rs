//! Authenticated Actor
//!
//! Identity and tenant scope of the caller, resolved from a validated
//! session by the presentation layer.

use kernel::id::{AccountId, BranchId, OrgId};

use crate::domain::value_object::Role;
use crate::error::{TenancyError, TenancyResult};

/// The authenticated caller of a hierarchy operation
#[derive(Debug, Clone)]
pub struct Actor {
    pub account_id: AccountId,
    pub role: Role,
    pub org_id: Option<OrgId>,
    pub branch_id: Option<BranchId>,
}

impl Actor {
    /// Require the actor to be scoped to the given organization
    pub fn ensure_org_scope(&self, org_id: &OrgId) -> TenancyResult<()> {
        if self.org_id.as_ref() == Some(org_id) {
            Ok(())
        } else {
            Err(TenancyError::ScopeMismatch)
        }
    }

    /// Require the actor to be scoped to exactly the given branch
    pub fn ensure_branch_scope(&self, branch_id: &BranchId) -> TenancyResult<()> {
        if self.branch_id.as_ref() == Some(branch_id) {
            Ok(())
        } else {
            Err(TenancyError::ScopeMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::id::Id;

    #[test]
    fn test_org_scope() {
        let org: OrgId = Id::new();
        let actor = Actor {
            account_id: Id::new(),
            role: Role::Manager,
            org_id: Some(org),
            branch_id: None,
        };
        assert!(actor.ensure_org_scope(&org).is_ok());
        assert!(matches!(
            actor.ensure_org_scope(&Id::new()),
            Err(TenancyError::ScopeMismatch)
        ));
    }

    #[test]
    fn test_branch_scope() {
        let branch: BranchId = Id::new();
        let actor = Actor {
            account_id: Id::new(),
            role: Role::Manager,
            org_id: Some(Id::new()),
            branch_id: Some(branch),
        };
        assert!(actor.ensure_branch_scope(&branch).is_ok());
        assert!(matches!(
            actor.ensure_branch_scope(&Id::new()),
            Err(TenancyError::ScopeMismatch)
        ));
    }
}
