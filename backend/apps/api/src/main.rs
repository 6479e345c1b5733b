//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use axum::{
    Router, http,
    http::{Method, header},
};
use base64::Engine;
use base64::engine::general_purpose;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tenancy::domain::repository::Notifier;
use tenancy::{
    MailApiNotifier, NoopNotifier, PgDirectory, PgTenancy, TenancyConfig, account_router,
    org_router,
};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,tenancy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Startup cleanup: reap expired sessions and invite tokens
    // Errors here should not prevent server startup
    let store_for_cleanup = PgTenancy::new(pool.clone());
    match store_for_cleanup.cleanup_expired().await {
        Ok((sessions, invites)) => {
            tracing::info!(
                sessions_deleted = sessions,
                invites_deleted = invites,
                "Tenancy cleanup completed"
            );
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Tenancy cleanup failed, continuing anyway"
            );
        }
    }

    // Tenancy configuration
    let config = if cfg!(debug_assertions) {
        TenancyConfig {
            pepper: load_pepper()?,
            ..TenancyConfig::development()
        }
    } else {
        // In production, load secrets from environment
        let secret_b64 =
            env::var("SESSION_SECRET").expect("SESSION_SECRET must be set in production");
        let secret_bytes = Engine::decode(&general_purpose::STANDARD, &secret_b64)?;
        let mut session_secret = [0u8; 32];
        session_secret.copy_from_slice(&secret_bytes);

        TenancyConfig {
            session_secret,
            pepper: load_pepper()?,
            cookie_prefix: env::var("COOKIE_PREFIX").unwrap_or_default(),
            ..TenancyConfig::default()
        }
    };
    let config = Arc::new(config);

    let repo = Arc::new(PgTenancy::new(pool.clone()));
    let directory = Arc::new(PgDirectory::new(pool.clone()));

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40922,http://127.0.0.1:40922".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router; the notifier backend depends on mail configuration
    let app = match env::var("MAIL_API_URL") {
        Ok(endpoint) => {
            let api_key = env::var("MAIL_API_KEY").unwrap_or_default();
            let link_base = env::var("SETUP_LINK_BASE")
                .unwrap_or_else(|_| "http://localhost:40922/setup".to_string());
            let notifier = Arc::new(MailApiNotifier::new(endpoint, api_key, link_base));
            build_app(repo, directory, notifier, config)
        }
        Err(_) => {
            tracing::warn!("MAIL_API_URL not set; invite delivery is disabled");
            build_app(repo, directory, Arc::new(NoopNotifier), config)
        }
    }
    .layer(TraceLayer::new_for_http())
    .layer(cors);

    // Start server
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(31114);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Assemble the application router for a concrete notifier backend
fn build_app<N>(
    repo: Arc<PgTenancy>,
    directory: Arc<PgDirectory>,
    notifier: Arc<N>,
    config: Arc<TenancyConfig>,
) -> Router
where
    N: Notifier + Clone + Send + Sync + 'static,
{
    Router::new()
        .nest(
            "/api/account",
            account_router(
                repo.clone(),
                directory.clone(),
                notifier.clone(),
                config.clone(),
            ),
        )
        .nest("/api/org", org_router(repo, directory, notifier, config))
}

/// Credential pepper from the environment (base64)
fn load_pepper() -> anyhow::Result<Option<Vec<u8>>> {
    match env::var("CREDENTIAL_PEPPER") {
        Ok(b64) => {
            let pepper = Engine::decode(&general_purpose::STANDARD, &b64)?;
            Ok(Some(pepper))
        }
        Err(_) => {
            tracing::warn!("CREDENTIAL_PEPPER not set; hashing without a pepper");
            Ok(None)
        }
    }
}
