//! Join request API handlers
//!
//! A non-member applies, the team leader accepts or rejects, and the
//! requester may cancel while the request is still pending. Every resolution
//! is a one-way move out of `pending`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use hackhub_common::{Error, Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::teams::{MemberResponse, TeamResponse};
use super::{load_team, require_leader};
use crate::api::middleware::{AuthUser, TeamsState};
use crate::domain::entities::{JoinRequest, JoinRequestStatus};
use crate::domain::validation::normalize_skills;

/// Request for applying to a team
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateJoinRequest {
    #[validate(length(max = 1000))]
    pub message: Option<String>,

    /// Skill tags; trimmed and de-duplicated before storing
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Optional body for accepting a request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AcceptJoinRequest {
    /// Role label for the new member
    #[validate(length(max = 50))]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoinRequestQuery {
    pub status: Option<JoinRequestStatus>,
}

/// Join request response
#[derive(Debug, Serialize, Deserialize)]
pub struct JoinRequestResponse {
    pub id: Uuid,
    pub team_id: Uuid,
    pub requester_id: Uuid,
    pub message: String,
    pub skills: Vec<String>,
    pub status: JoinRequestStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<JoinRequest> for JoinRequestResponse {
    fn from(request: JoinRequest) -> Self {
        Self {
            id: request.id,
            team_id: request.team_id,
            requester_id: request.requester_id,
            message: request.message,
            skills: request.skills,
            status: request.status,
            created_at: request.created_at,
            resolved_at: request.resolved_at,
        }
    }
}

/// Accepted request with the resulting membership
#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptJoinRequestResponse {
    pub request: JoinRequestResponse,
    pub team: TeamResponse,
    pub member: MemberResponse,
}

async fn load_request(state: &TeamsState, request_id: Uuid) -> Result<JoinRequest> {
    state
        .store
        .get_join_request(request_id)
        .await?
        .ok_or_else(|| Error::NotFound("Join request not found".to_string()))
}

/// Apply to join a team
///
/// **POST /v1/teams/{team_id}/join-requests**
///
/// **Business Rules:**
/// - Team must be recruiting
/// - Caller must not already be a member
/// - At most one pending request per caller and team
pub async fn create_join_request(
    AuthUser(auth): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateJoinRequest>,
) -> Result<(StatusCode, Json<JoinRequestResponse>)> {
    let team = load_team(&state, team_id).await?;

    let join_request = JoinRequest::new(
        team.id,
        auth.user_id(),
        request.message,
        normalize_skills(request.skills),
    )?;
    let created = state.store.create_join_request(&join_request).await?;

    tracing::info!(
        request_id = %created.id,
        team_id = %team_id,
        requester_id = %created.requester_id,
        "Join request created"
    );

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// List a team's join requests
///
/// **GET /v1/teams/{team_id}/join-requests?status=**
pub async fn list_team_join_requests(
    AuthUser(auth): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
    Query(query): Query<JoinRequestQuery>,
) -> Result<Json<Vec<JoinRequestResponse>>> {
    let team = load_team(&state, team_id).await?;
    require_leader(&team, auth.user_id(), "view join requests")?;

    let requests = state
        .store
        .list_join_requests_for_team(team_id, query.status)
        .await?;
    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

/// The caller's own join requests
///
/// **GET /v1/me/join-requests**
pub async fn list_my_join_requests(
    AuthUser(auth): AuthUser,
    State(state): State<TeamsState>,
) -> Result<Json<Vec<JoinRequestResponse>>> {
    let requests = state
        .store
        .list_join_requests_for_user(auth.user_id())
        .await?;
    Ok(Json(requests.into_iter().map(Into::into).collect()))
}

/// Accept a join request
///
/// **POST /v1/join-requests/{request_id}/accept**
///
/// Fails with 409 when the team is full or closed, the requester already
/// joined, or the request is no longer pending.
pub async fn accept_join_request(
    AuthUser(auth): AuthUser,
    State(state): State<TeamsState>,
    Path(request_id): Path<Uuid>,
    body: Option<Json<AcceptJoinRequest>>,
) -> Result<Json<AcceptJoinRequestResponse>> {
    let Json(body) = body.unwrap_or_default();
    body.validate()
        .map_err(|e| Error::Validation(format!("Validation failed: {}", e)))?;

    let request = load_request(&state, request_id).await?;
    let team = load_team(&state, request.team_id).await?;
    require_leader(&team, auth.user_id(), "accept join requests")?;

    // Fail fast on a snapshot; the store re-checks under its lock
    let members = state.store.list_members(team.id).await?;
    let already_member = members.iter().any(|m| m.user_id == request.requester_id);
    request
        .clone()
        .accept(&team.admission_guard(members.len(), already_member))?;

    let admission = state
        .store
        .accept_join_request(request_id, body.role)
        .await?;

    tracing::info!(
        request_id = %request_id,
        team_id = %admission.team.id,
        member_id = %admission.member.user_id,
        team_status = %admission.team.status,
        "Join request accepted"
    );

    let member = MemberResponse::from_member(admission.member, &admission.team);
    Ok(Json(AcceptJoinRequestResponse {
        request: admission.resolved.into(),
        team: admission.team.into(),
        member,
    }))
}

/// Reject a join request
///
/// **POST /v1/join-requests/{request_id}/reject**
pub async fn reject_join_request(
    AuthUser(auth): AuthUser,
    State(state): State<TeamsState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<JoinRequestResponse>> {
    let mut request = load_request(&state, request_id).await?;
    let team = load_team(&state, request.team_id).await?;
    require_leader(&team, auth.user_id(), "reject join requests")?;

    request.reject()?;
    let resolved = state.store.resolve_join_request(&request).await?;

    tracing::info!(request_id = %request_id, team_id = %team.id, "Join request rejected");
    Ok(Json(resolved.into()))
}

/// Withdraw a join request
///
/// **POST /v1/join-requests/{request_id}/cancel**
pub async fn cancel_join_request(
    AuthUser(auth): AuthUser,
    State(state): State<TeamsState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<JoinRequestResponse>> {
    let mut request = load_request(&state, request_id).await?;
    if request.requester_id != auth.user_id() {
        return Err(Error::Authorization(
            "Only the requester can cancel a join request".to_string(),
        ));
    }

    request.cancel()?;
    let resolved = state.store.resolve_join_request(&request).await?;

    tracing::info!(request_id = %request_id, "Join request cancelled");
    Ok(Json(resolved.into()))
}
