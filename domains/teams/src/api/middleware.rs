//! Teams domain state and auth backend integration

use std::sync::Arc;

use axum::extract::FromRef;
use chrono::Duration;
use hackhub_auth::AuthBackend;

use crate::repository::TeamsStore;

pub use hackhub_auth::AuthUser;

/// Tunables for the teams workflow
#[derive(Debug, Clone, Copy)]
pub struct TeamsSettings {
    /// How long a new invitation stays acceptable
    pub invitation_ttl: Duration,
}

impl TeamsSettings {
    pub fn with_invitation_ttl_days(days: i64) -> Self {
        Self {
            invitation_ttl: Duration::days(days),
        }
    }
}

impl Default for TeamsSettings {
    fn default() -> Self {
        Self::with_invitation_ttl_days(hackhub_common::config::DEFAULT_INVITATION_TTL_DAYS)
    }
}

/// Application state for the Teams domain
#[derive(Clone)]
pub struct TeamsState {
    pub store: Arc<dyn TeamsStore>,
    pub auth: AuthBackend,
    pub settings: TeamsSettings,
}

impl TeamsState {
    pub fn new(store: Arc<dyn TeamsStore>, auth: AuthBackend, settings: TeamsSettings) -> Self {
        Self {
            store,
            auth,
            settings,
        }
    }
}

impl FromRef<TeamsState> for AuthBackend {
    fn from_ref(state: &TeamsState) -> Self {
        state.auth.clone()
    }
}
