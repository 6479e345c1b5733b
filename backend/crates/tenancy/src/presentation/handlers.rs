//! HTTP Handlers

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use std::sync::Arc;
use uuid::Uuid;

use platform::cookie::{CookieConfig, extract_cookie};

use crate::application::actor::Actor;
use crate::application::config::TenancyConfig;
use crate::application::{
    CheckExistsUseCase, CheckSessionUseCase, CreateBranchInput, CreateBranchUseCase,
    CreateCashierInput, CreateCashierUseCase, CreateOrganizationInput, CreateOrganizationUseCase,
    DeleteBranchInput, DeleteBranchUseCase, DeleteCashierInput, DeleteCashierUseCase,
    IdentityProvisioner, InviteAccountInput, InviteAccountUseCase, ResetCredentialInput,
    ResetCredentialUseCase, SetCredentialInput, SetCredentialUseCase, SignInInput, SignInUseCase,
    SignOutUseCase, UpsertManagerInput, UpsertManagerUseCase,
};
use crate::domain::repository::{DirectoryProvider, Notifier, TenancyStore};
use crate::domain::value_object::Role;
use crate::error::TenancyResult;
use crate::presentation::dto::{
    AccountResponse, BranchResponse, CheckExistsRequest, CheckExistsResponse,
    CreateBranchRequest, CreateCashierRequest, CreateOrganizationRequest,
    CreateOrganizationResponse, InviteRequest, OkResponse, ResetRequest, SessionQuery,
    SessionStatusResponse, SetCredentialRequest, SignInRequest, SignInResponse, SignOutRequest,
    UpsertManagerRequest, parse_role,
};
use kernel::id::Id;

/// Shared state for tenancy handlers
pub struct GatewayState<R, D, N>
where
    R: TenancyStore,
    D: DirectoryProvider + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub directory: Arc<D>,
    pub notifier: Arc<N>,
    pub config: Arc<TenancyConfig>,
}

impl<R, D, N> Clone for GatewayState<R, D, N>
where
    R: TenancyStore,
    D: DirectoryProvider + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            directory: self.directory.clone(),
            notifier: self.notifier.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R, D, N> GatewayState<R, D, N>
where
    R: TenancyStore,
    D: DirectoryProvider + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    /// Provisioner wired to this state's store and collaborators
    fn provisioner(&self) -> IdentityProvisioner<R, R, D, R, N> {
        IdentityProvisioner::new(
            self.repo.clone(),
            self.repo.clone(),
            self.directory.clone(),
            self.repo.clone(),
            self.notifier.clone(),
            self.config.clone(),
        )
    }
}

// ============================================================================
// Gateway: invite / check-exists / set-credential
// ============================================================================

/// POST /invite
pub async fn invite<R, D, N>(
    State(state): State<GatewayState<R, D, N>>,
    Json(req): Json<InviteRequest>,
) -> TenancyResult<Json<OkResponse>>
where
    R: TenancyStore,
    D: DirectoryProvider + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let role = parse_role(&req.role)?;

    let use_case = InviteAccountUseCase::new(state.provisioner());
    use_case
        .execute(InviteAccountInput {
            role,
            email: req.email,
            name: req.name,
        })
        .await?;

    Ok(Json(OkResponse::ok()))
}

/// POST /check-exists
pub async fn check_exists<R, D, N>(
    State(state): State<GatewayState<R, D, N>>,
    Json(req): Json<CheckExistsRequest>,
) -> TenancyResult<Json<CheckExistsResponse>>
where
    R: TenancyStore,
    D: DirectoryProvider + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let role = parse_role(&req.role)?;

    let use_case = CheckExistsUseCase::new(state.repo.clone());
    let exists = use_case.execute(role, &req.email).await?;

    Ok(Json(CheckExistsResponse { ok: true, exists }))
}

/// POST /set-credential
pub async fn set_credential<R, D, N>(
    State(state): State<GatewayState<R, D, N>>,
    Json(req): Json<SetCredentialRequest>,
) -> TenancyResult<Json<OkResponse>>
where
    R: TenancyStore,
    D: DirectoryProvider + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let role = parse_role(&req.role)?;

    let use_case = SetCredentialUseCase::new(state.provisioner());
    use_case
        .execute(SetCredentialInput {
            role,
            token: req.token,
            secret: req.secret,
        })
        .await?;

    Ok(Json(OkResponse::ok()))
}

// ============================================================================
// Gateway: signin / signout / session / reset
// ============================================================================

/// POST /signin
pub async fn sign_in<R, D, N>(
    State(state): State<GatewayState<R, D, N>>,
    Json(req): Json<SignInRequest>,
) -> TenancyResult<impl IntoResponse>
where
    R: TenancyStore,
    D: DirectoryProvider + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let role = parse_role(&req.role)?;

    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(SignInInput {
            role,
            identifier: req.identifier,
            secret: req.secret,
        })
        .await?;

    let cookie = session_cookie(&state.config, role).build_set_cookie(&output.session_token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(SignInResponse {
            ok: true,
            role: output.role.code().to_string(),
            display_name: output.display_name,
        }),
    ))
}

/// POST /signout
pub async fn sign_out<R, D, N>(
    State(state): State<GatewayState<R, D, N>>,
    headers: HeaderMap,
    Json(req): Json<SignOutRequest>,
) -> TenancyResult<impl IntoResponse>
where
    R: TenancyStore,
    D: DirectoryProvider + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let role = parse_role(&req.role)?;
    let cookie_config = session_cookie(&state.config, role);

    if let Some(token) = extract_cookie(&headers, &cookie_config.name) {
        let use_case = SignOutUseCase::new(state.repo.clone(), state.config.clone());
        // Ignore errors - just clear the cookie
        let _ = use_case.execute(&token).await;
    }

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie_config.build_delete_cookie())],
        Json(OkResponse::ok()),
    ))
}

/// GET /session
pub async fn session_status<R, D, N>(
    State(state): State<GatewayState<R, D, N>>,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
) -> TenancyResult<Json<SessionStatusResponse>>
where
    R: TenancyStore,
    D: DirectoryProvider + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let role = parse_role(&query.role)?;
    let cookie_name = state.config.cookie_name(role);

    let use_case = CheckSessionUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );

    let info = match extract_cookie(&headers, &cookie_name) {
        Some(token) => use_case.execute(&token).await.ok(),
        None => None,
    };

    match info {
        Some(info) if info.actor.role == role => Ok(Json(SessionStatusResponse {
            authenticated: true,
            role: Some(info.actor.role.code().to_string()),
            display_name: Some(info.display_name),
            org_id: info.actor.org_id.map(|id| id.to_string()),
            branch_id: info.actor.branch_id.map(|id| id.to_string()),
        })),
        _ => Ok(Json(SessionStatusResponse {
            authenticated: false,
            role: None,
            display_name: None,
            org_id: None,
            branch_id: None,
        })),
    }
}

/// POST /reset-password
pub async fn reset_credential<R, D, N>(
    State(state): State<GatewayState<R, D, N>>,
    Json(req): Json<ResetRequest>,
) -> TenancyResult<Json<OkResponse>>
where
    R: TenancyStore,
    D: DirectoryProvider + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let role = parse_role(&req.role)?;

    let use_case = ResetCredentialUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );

    // Success regardless of account existence
    use_case
        .execute(ResetCredentialInput {
            role,
            email: req.email,
        })
        .await?;

    Ok(Json(OkResponse::ok()))
}

// ============================================================================
// Hierarchy: organizations / branches / managers / cashiers
// ============================================================================

/// POST /organizations
pub async fn create_organization<R, D, N>(
    State(state): State<GatewayState<R, D, N>>,
    Json(req): Json<CreateOrganizationRequest>,
) -> TenancyResult<Json<CreateOrganizationResponse>>
where
    R: TenancyStore,
    D: DirectoryProvider + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let use_case = CreateOrganizationUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.directory.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(CreateOrganizationInput {
            name: req.name,
            owner_display_name: req.owner_name,
            owner_email: req.owner_email,
            owner_password: req.owner_password,
        })
        .await?;

    Ok(Json(CreateOrganizationResponse {
        ok: true,
        org_id: output.org_id.to_string(),
        slug: output.slug,
    }))
}

/// POST /organizations/{org_id}/branches
pub async fn create_branch<R, D, N>(
    State(state): State<GatewayState<R, D, N>>,
    Extension(actor): Extension<Actor>,
    Path(org_id): Path<Uuid>,
    Json(req): Json<CreateBranchRequest>,
) -> TenancyResult<Json<BranchResponse>>
where
    R: TenancyStore,
    D: DirectoryProvider + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let use_case = CreateBranchUseCase::new(state.repo.clone(), state.repo.clone());

    let branch = use_case
        .execute(CreateBranchInput {
            org_id: Id::from_uuid(org_id),
            name: req.name,
            actor_id: actor.account_id,
        })
        .await?;

    Ok(Json(BranchResponse {
        ok: true,
        branch_id: branch.branch_id.to_string(),
        branch_no: branch.branch_no,
        slug: branch.slug,
        username: branch.username,
    }))
}

/// DELETE /organizations/{org_id}/branches/{branch_id}
pub async fn delete_branch<R, D, N>(
    State(state): State<GatewayState<R, D, N>>,
    Extension(actor): Extension<Actor>,
    Path((org_id, branch_id)): Path<(Uuid, Uuid)>,
) -> TenancyResult<Json<OkResponse>>
where
    R: TenancyStore,
    D: DirectoryProvider + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let use_case = DeleteBranchUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.directory.clone(),
    );

    use_case
        .execute(DeleteBranchInput {
            org_id: Id::from_uuid(org_id),
            branch_id: Id::from_uuid(branch_id),
            actor_id: actor.account_id,
        })
        .await?;

    Ok(Json(OkResponse::ok()))
}

/// POST /organizations/{org_id}/branches/{branch_id}/manager
pub async fn upsert_manager<R, D, N>(
    State(state): State<GatewayState<R, D, N>>,
    Extension(actor): Extension<Actor>,
    Path((org_id, branch_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpsertManagerRequest>,
) -> TenancyResult<Json<AccountResponse>>
where
    R: TenancyStore,
    D: DirectoryProvider + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let use_case = UpsertManagerUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.provisioner(),
    );

    let profile = use_case
        .execute(UpsertManagerInput {
            org_id: Id::from_uuid(org_id),
            branch_id: Id::from_uuid(branch_id),
            actor_id: actor.account_id,
            display_name: req.display_name,
            email: req.email,
            pin: req.pin,
        })
        .await?;

    Ok(Json(AccountResponse {
        ok: true,
        account_id: profile.account_id.to_string(),
        status: profile.status.code().to_string(),
        username: profile.username,
    }))
}

/// POST /organizations/{org_id}/branches/{branch_id}/cashiers
pub async fn create_cashier<R, D, N>(
    State(state): State<GatewayState<R, D, N>>,
    Extension(actor): Extension<Actor>,
    Path((org_id, branch_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<CreateCashierRequest>,
) -> TenancyResult<Json<AccountResponse>>
where
    R: TenancyStore,
    D: DirectoryProvider + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let use_case = CreateCashierUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.provisioner(),
    );

    let profile = use_case
        .execute(
            CreateCashierInput {
                org_id: Id::from_uuid(org_id),
                branch_id: Id::from_uuid(branch_id),
                display_name: req.display_name,
                pin: req.pin,
            },
            &actor,
        )
        .await?;

    Ok(Json(AccountResponse {
        ok: true,
        account_id: profile.account_id.to_string(),
        status: profile.status.code().to_string(),
        username: profile.username,
    }))
}

/// DELETE /organizations/{org_id}/branches/{branch_id}/cashiers/{cashier_id}
pub async fn delete_cashier<R, D, N>(
    State(state): State<GatewayState<R, D, N>>,
    Extension(actor): Extension<Actor>,
    Path((org_id, branch_id, cashier_id)): Path<(Uuid, Uuid, Uuid)>,
) -> TenancyResult<Json<OkResponse>>
where
    R: TenancyStore,
    D: DirectoryProvider + Clone + Send + Sync + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let use_case = DeleteCashierUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.directory.clone(),
    );

    use_case
        .execute(
            DeleteCashierInput {
                org_id: Id::from_uuid(org_id),
                branch_id: Id::from_uuid(branch_id),
                cashier_id: Id::from_uuid(cashier_id),
            },
            &actor,
        )
        .await?;

    Ok(Json(OkResponse::ok()))
}

// ============================================================================
// Helper Functions
// ============================================================================

fn session_cookie(config: &TenancyConfig, role: Role) -> CookieConfig {
    CookieConfig {
        name: config.cookie_name(role),
        secure: config.cookie_secure,
        http_only: true,
        same_site: config.cookie_same_site,
        path: "/".to_string(),
        max_age_secs: Some(config.session_ttl_secs() as i64),
    }
}
