//! Team member API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hackhub_common::{Error, Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::teams::{MemberResponse, TeamResponse};
use super::{load_team, require_leader};
use crate::api::middleware::{AuthUser, TeamsState};
use crate::repository::MemberRemoval;

/// Request for handing leadership to another member
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransferLeadershipRequest {
    pub user_id: Uuid,
}

/// Outcome of leaving a team
#[derive(Debug, Serialize, Deserialize)]
pub struct LeaveTeamResponse {
    pub team_id: Uuid,
    /// The caller was the last member, so the team no longer exists
    pub team_deleted: bool,
}

/// List team members in join order
///
/// **GET /v1/teams/{team_id}/members**
pub async fn list_members(
    AuthUser(_auth): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<Vec<MemberResponse>>> {
    let team = load_team(&state, team_id).await?;
    let members = state.store.list_members(team_id).await?;

    Ok(Json(
        members
            .into_iter()
            .map(|m| MemberResponse::from_member(m, &team))
            .collect(),
    ))
}

/// Remove a member from the team
///
/// **DELETE /v1/teams/{team_id}/members/{user_id}**
///
/// Leader only. The leader leaves through `/leave` instead.
pub async fn remove_member(
    AuthUser(auth): AuthUser,
    State(state): State<TeamsState>,
    Path((team_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode> {
    let team = load_team(&state, team_id).await?;
    require_leader(&team, auth.user_id(), "remove members")?;

    if user_id == auth.user_id() {
        return Err(Error::Validation(
            "The leader cannot remove themself; leave the team instead".to_string(),
        ));
    }

    state.store.remove_member(team_id, user_id).await?;

    tracing::info!(team_id = %team_id, user_id = %user_id, "Member removed");
    Ok(StatusCode::NO_CONTENT)
}

/// Leave a team
///
/// **POST /v1/teams/{team_id}/leave**
///
/// The leader can only leave when no one else remains; the team is then
/// deleted.
pub async fn leave_team(
    AuthUser(auth): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<LeaveTeamResponse>> {
    let user_id = auth.user_id();
    let removal = state.store.remove_member(team_id, user_id).await?;
    let team_deleted = removal == MemberRemoval::TeamDeleted;

    tracing::info!(
        team_id = %team_id,
        user_id = %user_id,
        team_deleted,
        "Member left team"
    );

    Ok(Json(LeaveTeamResponse {
        team_id,
        team_deleted,
    }))
}

/// Transfer leadership
///
/// **POST /v1/teams/{team_id}/leader**
pub async fn transfer_leadership(
    AuthUser(auth): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<TransferLeadershipRequest>,
) -> Result<Json<TeamResponse>> {
    let team = load_team(&state, team_id).await?;
    require_leader(&team, auth.user_id(), "transfer leadership")?;

    let updated = state
        .store
        .transfer_leadership(team_id, request.user_id)
        .await?;

    tracing::info!(
        team_id = %team_id,
        from = %team.leader_id,
        to = %updated.leader_id,
        "Leadership transferred"
    );
    Ok(Json(updated.into()))
}
