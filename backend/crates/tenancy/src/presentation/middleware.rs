//! Session Middleware
//!
//! Middleware for requiring an authenticated session on the hierarchy
//! routes. Resolves the caller to an [`Actor`] in request extensions.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::application::actor::Actor;
use crate::application::check_session::CheckSessionUseCase;
use crate::application::config::TenancyConfig;
use crate::domain::repository::TenancyStore;
use crate::domain::value_object::Role;

/// Roles whose sessions may reach the hierarchy endpoints
pub const HIERARCHY_ROLES: &[Role] = &[Role::Owner, Role::Manager];

/// Middleware state
pub struct SessionMiddlewareState<R>
where
    R: TenancyStore,
{
    pub repo: Arc<R>,
    pub config: Arc<TenancyConfig>,
    /// Role cookies accepted on this route group, tried in order
    pub roles: &'static [Role],
}

impl<R> Clone for SessionMiddlewareState<R>
where
    R: TenancyStore,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
            roles: self.roles,
        }
    }
}

/// Middleware that requires a valid session for one of the allowed roles
pub async fn require_session<R>(
    State(state): State<SessionMiddlewareState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response>
where
    R: TenancyStore,
{
    let use_case =
        CheckSessionUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    for role in state.roles {
        let cookie_name = state.config.cookie_name(*role);
        let Some(token) = platform::cookie::extract_cookie(req.headers(), &cookie_name) else {
            continue;
        };

        if let Ok(info) = use_case.execute(&token).await {
            if info.actor.role == *role {
                req.extensions_mut().insert(info.actor);
                return Ok(next.run(req).await);
            }
        }
    }

    Err((StatusCode::UNAUTHORIZED, [("X-Auth-Required", "true")]).into_response())
}
