//! LFG domain state and auth backend integration

use std::sync::Arc;

use axum::extract::FromRef;
use hackhub_auth::AuthBackend;
use hackhub_teams::TeamsStore;

use crate::repository::LfgStore;

pub use hackhub_auth::AuthUser;

/// Application state for the LFG domain
#[derive(Clone)]
pub struct LfgState {
    pub store: Arc<dyn LfgStore>,
    /// Used to check team leadership for recruiting posts
    pub teams: Arc<dyn TeamsStore>,
    pub auth: AuthBackend,
}

impl FromRef<LfgState> for AuthBackend {
    fn from_ref(state: &LfgState) -> Self {
        state.auth.clone()
    }
}
