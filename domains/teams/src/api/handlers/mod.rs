//! HTTP handlers for the Teams domain

pub mod invitations;
pub mod join_requests;
pub mod members;
pub mod teams;

use hackhub_common::{Error, Result};
use uuid::Uuid;

use crate::api::middleware::TeamsState;
use crate::domain::entities::Team;

/// Load a team or answer 404
pub(crate) async fn load_team(state: &TeamsState, team_id: Uuid) -> Result<Team> {
    state
        .store
        .get_team(team_id)
        .await?
        .ok_or_else(|| Error::NotFound("Team not found".to_string()))
}

/// Reject callers who do not lead `team`
pub(crate) fn require_leader(team: &Team, user_id: Uuid, action: &str) -> Result<()> {
    if !team.is_leader(user_id) {
        return Err(Error::Authorization(format!(
            "Only the team leader can {}",
            action
        )));
    }
    Ok(())
}
