//! Team management API handlers
//!
//! Team CRUD plus the leader-only recruiting switches (close/reopen).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use hackhub_common::{Pagination, Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{load_team, require_leader};
use crate::api::middleware::{AuthUser, TeamsState};
use crate::domain::entities::{Member, Team, TeamChange, TeamStatus, MAX_TEAM_SIZE};
use crate::repository::TeamFilter;

/// Request for creating a new team
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTeamRequest {
    /// Team display name (3-100 chars)
    #[validate(length(min = 3, max = 100))]
    pub name: String,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    /// Maximum head count, leader included
    #[validate(range(min = 1, max = MAX_TEAM_SIZE))]
    pub max_size: i32,
}

/// Request for updating a team; omitted fields stay unchanged
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateTeamRequest {
    #[validate(length(min = 3, max = 100))]
    pub name: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(range(min = 1, max = MAX_TEAM_SIZE))]
    pub max_size: Option<i32>,
}

/// Query parameters for `GET /v1/teams`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListTeamsQuery {
    pub status: Option<TeamStatus>,
    pub q: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// Team response for API operations
#[derive(Debug, Serialize, Deserialize)]
pub struct TeamResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub max_size: i32,
    pub status: TeamStatus,
    pub leader_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Team> for TeamResponse {
    fn from(team: Team) -> Self {
        Self {
            id: team.id,
            name: team.name,
            description: team.description,
            max_size: team.max_size,
            status: team.status,
            leader_id: team.leader_id,
            created_at: team.created_at,
            updated_at: team.updated_at,
        }
    }
}

/// Member entry in team responses
#[derive(Debug, Serialize, Deserialize)]
pub struct MemberResponse {
    pub user_id: Uuid,
    pub role: String,
    pub is_leader: bool,
    pub joined_at: DateTime<Utc>,
}

impl MemberResponse {
    pub fn from_member(member: Member, team: &Team) -> Self {
        Self {
            is_leader: team.is_leader(member.user_id),
            user_id: member.user_id,
            role: member.role,
            joined_at: member.joined_at,
        }
    }
}

/// Team with its ordered member list
#[derive(Debug, Serialize, Deserialize)]
pub struct TeamDetailResponse {
    #[serde(flatten)]
    pub team: TeamResponse,
    pub member_count: usize,
    pub members: Vec<MemberResponse>,
}

impl TeamDetailResponse {
    pub fn new(team: Team, members: Vec<Member>) -> Self {
        let members: Vec<MemberResponse> = members
            .into_iter()
            .map(|m| MemberResponse::from_member(m, &team))
            .collect();
        Self {
            member_count: members.len(),
            members,
            team: team.into(),
        }
    }
}

async fn detail(state: &TeamsState, team: Team) -> Result<TeamDetailResponse> {
    let members = state.store.list_members(team.id).await?;
    Ok(TeamDetailResponse::new(team, members))
}

/// Create a new team
///
/// **POST /v1/teams**
///
/// The caller becomes the leader and first member.
pub async fn create_team(
    AuthUser(auth): AuthUser,
    State(state): State<TeamsState>,
    ValidatedJson(request): ValidatedJson<CreateTeamRequest>,
) -> Result<(StatusCode, Json<TeamDetailResponse>)> {
    let team = Team::new(
        auth.user_id(),
        request.name,
        request.description,
        request.max_size,
    )?;
    let leader = Member::leader(&team);

    let created = state.store.create_team(&team, &leader).await?;

    tracing::info!(
        team_id = %created.id,
        leader_id = %created.leader_id,
        max_size = created.max_size,
        "Team created"
    );

    Ok((
        StatusCode::CREATED,
        Json(TeamDetailResponse::new(created, vec![leader])),
    ))
}

/// List teams
///
/// **GET /v1/teams?status=&q=&offset=&limit=**
pub async fn list_teams(
    AuthUser(_auth): AuthUser,
    State(state): State<TeamsState>,
    Query(query): Query<ListTeamsQuery>,
) -> Result<Json<Vec<TeamResponse>>> {
    let filter = TeamFilter {
        status: query.status,
        q: query.q,
    };
    let page = Pagination {
        offset: query.offset,
        limit: query.limit,
    };

    let teams = state.store.list_teams(&filter, page).await?;
    Ok(Json(teams.into_iter().map(TeamResponse::from).collect()))
}

/// Teams the caller belongs to
///
/// **GET /v1/me/teams**
pub async fn list_my_teams(
    AuthUser(auth): AuthUser,
    State(state): State<TeamsState>,
) -> Result<Json<Vec<TeamResponse>>> {
    let teams = state.store.list_teams_for_user(auth.user_id()).await?;
    Ok(Json(teams.into_iter().map(TeamResponse::from).collect()))
}

/// Get team details with members
///
/// **GET /v1/teams/{team_id}**
pub async fn get_team(
    AuthUser(_auth): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<TeamDetailResponse>> {
    let team = load_team(&state, team_id).await?;
    Ok(Json(detail(&state, team).await?))
}

/// Update team settings
///
/// **PATCH /v1/teams/{team_id}**
///
/// `max_size` may not drop below the current head count.
pub async fn update_team(
    AuthUser(auth): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateTeamRequest>,
) -> Result<Json<TeamDetailResponse>> {
    let team = load_team(&state, team_id).await?;
    require_leader(&team, auth.user_id(), "update the team")?;

    let change = TeamChange::Details {
        name: request.name,
        description: request.description,
        max_size: request.max_size,
    };
    let updated = state.store.update_team(team_id, change).await?;

    tracing::info!(team_id = %team_id, status = %updated.status, "Team updated");
    Ok(Json(detail(&state, updated).await?))
}

/// Delete a team
///
/// **DELETE /v1/teams/{team_id}**
pub async fn delete_team(
    AuthUser(auth): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
) -> Result<StatusCode> {
    let team = load_team(&state, team_id).await?;
    require_leader(&team, auth.user_id(), "delete the team")?;

    state.store.delete_team(team_id).await?;

    tracing::info!(team_id = %team_id, "Team deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Stop recruiting
///
/// **POST /v1/teams/{team_id}/close**
pub async fn close_team(
    AuthUser(auth): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<TeamResponse>> {
    let team = load_team(&state, team_id).await?;
    require_leader(&team, auth.user_id(), "close the team")?;

    let updated = state.store.update_team(team_id, TeamChange::Close).await?;

    tracing::info!(team_id = %team_id, from = %team.status, "Team closed");
    Ok(Json(updated.into()))
}

/// Resume recruiting
///
/// **POST /v1/teams/{team_id}/reopen**
pub async fn reopen_team(
    AuthUser(auth): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<TeamResponse>> {
    let team = load_team(&state, team_id).await?;
    require_leader(&team, auth.user_id(), "reopen the team")?;

    let updated = state.store.update_team(team_id, TeamChange::Reopen).await?;

    tracing::info!(team_id = %team_id, to = %updated.status, "Team reopened");
    Ok(Json(updated.into()))
}
