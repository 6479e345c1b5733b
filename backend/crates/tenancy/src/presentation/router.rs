//! Tenancy Routers

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use std::sync::Arc;

use crate::application::config::TenancyConfig;
use crate::domain::repository::{DirectoryProvider, Notifier, TenancyStore};
use crate::presentation::handlers::{self, GatewayState};
use crate::presentation::middleware::{HIERARCHY_ROLES, SessionMiddlewareState, require_session};

/// Create the role account gateway router
///
/// Invite / check-exists / set-credential / signin / reset / signout for
/// roles without a native identity-provider login.
pub fn account_router<R, D, N>(
    repo: Arc<R>,
    directory: Arc<D>,
    notifier: Arc<N>,
    config: Arc<TenancyConfig>,
) -> Router
where
    R: TenancyStore,
    D: DirectoryProvider + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let state = GatewayState {
        repo,
        directory,
        notifier,
        config,
    };

    Router::new()
        .route("/invite", post(handlers::invite::<R, D, N>))
        .route("/check-exists", post(handlers::check_exists::<R, D, N>))
        .route("/set-credential", post(handlers::set_credential::<R, D, N>))
        .route("/signin", post(handlers::sign_in::<R, D, N>))
        .route("/signout", post(handlers::sign_out::<R, D, N>))
        .route("/session", get(handlers::session_status::<R, D, N>))
        .route("/reset-password", post(handlers::reset_credential::<R, D, N>))
        .with_state(state)
}

/// Create the tenant hierarchy router
///
/// Organization bootstrap is open; everything below it requires an
/// owner or manager session.
pub fn org_router<R, D, N>(
    repo: Arc<R>,
    directory: Arc<D>,
    notifier: Arc<N>,
    config: Arc<TenancyConfig>,
) -> Router
where
    R: TenancyStore,
    D: DirectoryProvider + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let state = GatewayState {
        repo: repo.clone(),
        directory,
        notifier,
        config: config.clone(),
    };

    let session_state = SessionMiddlewareState {
        repo,
        config,
        roles: HIERARCHY_ROLES,
    };

    let authenticated = Router::new()
        .route(
            "/organizations/{org_id}/branches",
            post(handlers::create_branch::<R, D, N>),
        )
        .route(
            "/organizations/{org_id}/branches/{branch_id}",
            delete(handlers::delete_branch::<R, D, N>),
        )
        .route(
            "/organizations/{org_id}/branches/{branch_id}/manager",
            post(handlers::upsert_manager::<R, D, N>),
        )
        .route(
            "/organizations/{org_id}/branches/{branch_id}/cashiers",
            post(handlers::create_cashier::<R, D, N>),
        )
        .route(
            "/organizations/{org_id}/branches/{branch_id}/cashiers/{cashier_id}",
            delete(handlers::delete_cashier::<R, D, N>),
        )
        .layer(middleware::from_fn_with_state(
            session_state,
            require_session::<R>,
        ))
        .with_state(state.clone());

    Router::new()
        .route(
            "/organizations",
            post(handlers::create_organization::<R, D, N>),
        )
        .with_state(state)
        .merge(authenticated)
}
