//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use crate::domain::value_object::Role;
use crate::error::{TenancyError, TenancyResult};

/// Parse a role code from a request payload
pub fn parse_role(code: &str) -> TenancyResult<Role> {
    Role::from_code(code).ok_or_else(|| TenancyError::Validation(format!("Unknown role: {code}")))
}

// ============================================================================
// Envelope
// ============================================================================

/// Bare `{ok}` success envelope
#[derive(Debug, Clone, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

// ============================================================================
// Gateway: invite / check-exists / set-credential
// ============================================================================

/// Invite request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    pub role: String,
    pub email: String,
    pub name: String,
}

/// Check-exists request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckExistsRequest {
    pub role: String,
    pub email: String,
}

/// Check-exists response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckExistsResponse {
    pub ok: bool,
    pub exists: bool,
}

/// Set-credential request (consumes an invite token)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCredentialRequest {
    pub role: String,
    pub token: String,
    pub secret: String,
}

// ============================================================================
// Gateway: signin / signout / session / reset
// ============================================================================

/// Sign in request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub role: String,
    /// Email address, or a derived username for PIN roles
    #[serde(alias = "email")]
    pub identifier: String,
    pub secret: String,
}

/// Sign in response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub ok: bool,
    pub role: String,
    pub display_name: String,
}

/// Sign out request (names the role cookie to clear)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOutRequest {
    pub role: String,
}

/// Session status query (GET /session?role=cashier)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    pub role: String,
}

/// Session status response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    pub role: Option<String>,
    pub display_name: Option<String>,
    pub org_id: Option<String>,
    pub branch_id: Option<String>,
}

/// Reset request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequest {
    pub role: String,
    pub email: String,
}

// ============================================================================
// Hierarchy: organizations / branches / managers / cashiers
// ============================================================================

/// Create organization request (owner onboarding)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub owner_name: String,
    pub owner_email: String,
    pub owner_password: String,
}

/// Create organization response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationResponse {
    pub ok: bool,
    pub org_id: String,
    pub slug: String,
}

/// Create branch request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBranchRequest {
    pub name: String,
}

/// Branch response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchResponse {
    pub ok: bool,
    pub branch_id: String,
    pub branch_no: u32,
    pub slug: String,
    pub username: String,
}

/// Upsert branch manager request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertManagerRequest {
    pub display_name: String,
    /// Real mailbox; required when no PIN is supplied
    pub email: Option<String>,
    /// Inline PIN; absent triggers the deferred invite flow
    pub pin: Option<String>,
}

/// Account response (manager, cashier)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub ok: bool,
    pub account_id: String,
    pub status: String,
    pub username: Option<String>,
}

/// Create cashier request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCashierRequest {
    pub display_name: String,
    pub pin: String,
}
