//! Account Status Value Object
//!
//! ## Design Decisions
//! - **3 statuses only**: Pending, Active, Disabled
//! - Pending accounts exist with a null credential until the invite flow
//!   completes; they cannot sign in
//! - Disabled is terminal only until a re-provision replaces the identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Account status
///
/// - **Pending**: provisioned without a credential; waiting on invite
/// - **Active**: credential set, sign-in allowed
/// - **Disabled**: sign-in blocked (directory record disabled too)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum AccountStatus {
    #[default]
    Pending = 0,

    Active = 1,

    Disabled = 2,
}

impl AccountStatus {
    /// Get numeric ID for database storage
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    /// Get string code for serialization/API
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Disabled => "disabled",
        }
    }

    /// Check if sign-in is allowed
    #[inline]
    pub const fn can_sign_in(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Check if the account is waiting on credential setup
    #[inline]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Create from numeric ID
    #[inline]
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(Self::Pending),
            1 => Some(Self::Active),
            2 => Some(Self::Disabled),
            _ => None,
        }
    }

    /// Create from string code
    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            "disabled" => Some(Self::Disabled),
            _ => None,
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_id() {
        assert_eq!(AccountStatus::from_id(0), Some(AccountStatus::Pending));
        assert_eq!(AccountStatus::from_id(1), Some(AccountStatus::Active));
        assert_eq!(AccountStatus::from_id(2), Some(AccountStatus::Disabled));
        assert_eq!(AccountStatus::from_id(99), None);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(
            AccountStatus::from_code("pending"),
            Some(AccountStatus::Pending)
        );
        assert_eq!(
            AccountStatus::from_code("active"),
            Some(AccountStatus::Active)
        );
        assert_eq!(
            AccountStatus::from_code("disabled"),
            Some(AccountStatus::Disabled)
        );
        assert_eq!(AccountStatus::from_code("invalid"), None);
    }

    #[test]
    fn test_can_sign_in() {
        assert!(!AccountStatus::Pending.can_sign_in());
        assert!(AccountStatus::Active.can_sign_in());
        assert!(!AccountStatus::Disabled.can_sign_in());
    }

    #[test]
    fn test_display() {
        assert_eq!(AccountStatus::Pending.to_string(), "pending");
        assert_eq!(AccountStatus::Active.to_string(), "active");
        assert_eq!(AccountStatus::Disabled.to_string(), "disabled");
    }

    #[test]
    fn test_default_is_pending() {
        assert_eq!(AccountStatus::default(), AccountStatus::Pending);
    }
}
