//! Tenancy Backend Module
//!
//! Tenant hierarchy and credential provisioning core for the merchant
//! platform: organizations, branches, and the PIN-based subordinate
//! accounts (branch managers, cashiers) that operate them.
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - PostgreSQL and in-memory implementations, notifier
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Organization → Branch → Cashier hierarchy with transactional
//!   sequence allocation and derived usernames
//! - Dual identity records (profile + auth-provider directory) kept in
//!   sync behind one provisioning interface
//! - One-time invite tokens for deferred credential setup
//! - Peppered Argon2id PIN/password hashing with opportunistic
//!   migration off the legacy digest scheme
//! - Server-side sessions with single-active-session semantics

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::TenancyConfig;
pub use error::{TenancyError, TenancyResult};
pub use infra::memory::{InMemoryDirectory, InMemoryTenancy};
pub use infra::notifier::{MailApiNotifier, NoopNotifier};
pub use infra::postgres::{PgDirectory, PgTenancy};
pub use presentation::router::{account_router, org_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::account::*;
    pub use crate::domain::entity::branch::*;
    pub use crate::domain::entity::invite::*;
    pub use crate::domain::entity::organization::*;
    pub use crate::domain::entity::session::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}

#[cfg(test)]
mod tests;
