//! Check Exists Use Case
//!
//! Reports whether an account exists for a role and email. Used by the
//! setup UI to route between invite and sign-in.

use std::sync::Arc;

use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{Email, Role};
use crate::error::TenancyResult;

/// Check exists use case
pub struct CheckExistsUseCase<A>
where
    A: AccountRepository,
{
    account_repo: Arc<A>,
}

impl<A> CheckExistsUseCase<A>
where
    A: AccountRepository,
{
    pub fn new(account_repo: Arc<A>) -> Self {
        Self { account_repo }
    }

    pub async fn execute(&self, role: Role, email: &str) -> TenancyResult<bool> {
        let email = Email::new(email)?;
        self.account_repo.exists_by_login_email(role, &email).await
    }
}
