use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of the role→permission table below.
///
/// Bump whenever the table changes so stale directory claims can be
/// detected and re-applied.
pub const CLAIMS_VERSION: u8 = 2;

/// Account role within the platform
///
/// Owner, Admin and Staff authenticate with a password; Manager and
/// Cashier authenticate with a short numeric PIN through the role
/// account gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum Role {
    Owner = 0,
    Manager = 1,
    Cashier = 2,
    Admin = 3,
    Staff = 4,
}

impl Role {
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        use Role::*;
        match self {
            Owner => "owner",
            Manager => "manager",
            Cashier => "cashier",
            Admin => "admin",
            Staff => "staff",
        }
    }

    /// Roles that authenticate with a numeric PIN
    #[inline]
    pub const fn uses_pin(&self) -> bool {
        use Role::*;
        matches!(self, Manager | Cashier)
    }

    /// Platform-level roles with no tenant scoping
    #[inline]
    pub const fn is_platform(&self) -> bool {
        use Role::*;
        matches!(self, Admin | Staff)
    }

    /// Roles that may carry a derived virtual login identity
    #[inline]
    pub const fn may_use_virtual_identity(&self) -> bool {
        self.uses_pin()
    }

    /// Permission set for this role
    ///
    /// The permission set is fully determined by the role. This table is
    /// the single source of truth; [`CLAIMS_VERSION`] tracks its shape.
    pub const fn permissions(&self) -> &'static [&'static str] {
        use Role::*;
        match self {
            Owner => &[
                "org:manage",
                "branch:manage",
                "cashier:manage",
                "txn:view",
            ],
            Manager => &["branch:view", "cashier:manage", "txn:capture", "txn:view"],
            Cashier => &["txn:capture"],
            Admin => &["platform:admin"],
            Staff => &["platform:support"],
        }
    }

    #[inline]
    pub fn from_id(id: i16) -> Option<Self> {
        use Role::*;
        match id {
            0 => Some(Owner),
            1 => Some(Manager),
            2 => Some(Cashier),
            3 => Some(Admin),
            4 => Some(Staff),
            _ => None,
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        use Role::*;
        match code {
            "owner" => Some(Owner),
            "manager" => Some(Manager),
            "cashier" => Some(Cashier),
            "admin" => Some(Admin),
            "staff" => Some(Staff),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_id() {
        assert_eq!(Role::from_id(0), Some(Role::Owner));
        assert_eq!(Role::from_id(1), Some(Role::Manager));
        assert_eq!(Role::from_id(2), Some(Role::Cashier));
        assert_eq!(Role::from_id(3), Some(Role::Admin));
        assert_eq!(Role::from_id(4), Some(Role::Staff));
        assert_eq!(Role::from_id(99), None);
    }

    #[test]
    fn test_role_from_code() {
        assert_eq!(Role::from_code("owner"), Some(Role::Owner));
        assert_eq!(Role::from_code("manager"), Some(Role::Manager));
        assert_eq!(Role::from_code("cashier"), Some(Role::Cashier));
        assert_eq!(Role::from_code("admin"), Some(Role::Admin));
        assert_eq!(Role::from_code("staff"), Some(Role::Staff));
        assert_eq!(Role::from_code("intruder"), None);
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Owner.to_string(), "owner");
        assert_eq!(Role::Cashier.to_string(), "cashier");
    }

    #[test]
    fn test_uses_pin() {
        assert!(!Role::Owner.uses_pin());
        assert!(Role::Manager.uses_pin());
        assert!(Role::Cashier.uses_pin());
        assert!(!Role::Admin.uses_pin());
        assert!(!Role::Staff.uses_pin());
    }

    #[test]
    fn test_permissions_non_empty() {
        for role in [
            Role::Owner,
            Role::Manager,
            Role::Cashier,
            Role::Admin,
            Role::Staff,
        ] {
            assert!(!role.permissions().is_empty());
        }
    }

    #[test]
    fn test_cashier_cannot_manage() {
        assert!(!Role::Cashier.permissions().contains(&"cashier:manage"));
        assert!(Role::Manager.permissions().contains(&"cashier:manage"));
        assert!(Role::Owner.permissions().contains(&"cashier:manage"));
    }
}
