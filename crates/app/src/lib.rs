//! HackHub application composition root
//!
//! Picks the store backend from configuration and composes the domain
//! routers into a single application.

use std::sync::Arc;

use axum::Router;
use hackhub_auth::{AuthBackend, AuthConfig};
use hackhub_common::{Config, StoreBackend};
use hackhub_lfg::{InMemoryLfgStore, LfgState, LfgStore, PgLfgStore};
use hackhub_teams::{InMemoryTeamsStore, PgTeamsStore, TeamsSettings, TeamsState, TeamsStore};
use sqlx::PgPool;

/// Store implementations shared by the domain routers
#[derive(Clone)]
pub struct Stores {
    pub teams: Arc<dyn TeamsStore>,
    pub lfg: Arc<dyn LfgStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        let teams: Arc<dyn TeamsStore> = Arc::new(InMemoryTeamsStore::new());
        Self {
            lfg: Arc::new(InMemoryLfgStore::with_teams(teams.clone())),
            teams,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            teams: Arc::new(PgTeamsStore::new(pool.clone())),
            lfg: Arc::new(PgLfgStore::new(pool)),
        }
    }
}

/// Connect the configured store backend, running migrations for Postgres
pub async fn connect_stores(config: &Config) -> Result<Stores, anyhow::Error> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory stores");
            Ok(Stores::in_memory())
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for postgres"))?;

            let pool = PgPool::connect(url)
                .await
                .map_err(|e| anyhow::anyhow!("Database connection failed: {}", e))?;
            tracing::info!("Database connection established");

            sqlx::migrate!("../../migrations").run(&pool).await?;
            tracing::info!("Database migrations applied");

            Ok(Stores::postgres(pool))
        }
    }
}

/// Create the main application router with all routes
pub fn create_app(config: &Config, stores: Stores) -> Router {
    let auth = AuthBackend::new(AuthConfig {
        jwt_secret: config.jwt_secret.clone(),
        issuer: config.jwt_issuer.clone(),
        audience: config.jwt_audience.clone(),
    });

    let teams_state = TeamsState::new(
        stores.teams.clone(),
        auth.clone(),
        TeamsSettings::with_invitation_ttl_days(config.invitation_ttl_days),
    );

    let lfg_state = LfgState {
        store: stores.lfg,
        teams: stores.teams,
        auth,
    };

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { "HackHub API v0.1.0" }),
        )
        .merge(hackhub_teams::routes().with_state(teams_state))
        .merge(hackhub_lfg::routes().with_state(lfg_state))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
