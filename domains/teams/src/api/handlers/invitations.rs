//! Invitation API handlers
//!
//! The leader invites a user by id; the invitee accepts or rejects before
//! the invitation expires.

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
use crate::domain::entities::{Invitation, InvitationState};

/// Request for inviting a user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateInvitationRequest {
    pub invitee_id: Uuid,

    #[validate(length(max = 1000))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvitationQuery {
    pub status: Option<InvitationState>,
}

/// Invitation response
#[derive(Debug, Serialize, Deserialize)]
pub struct InvitationResponse {
    pub id: Uuid,
    pub team_id: Uuid,
    pub inviter_id: Uuid,
    pub invitee_id: Uuid,
    pub message: String,
    /// Observed state; lapsed pending invitations report `expired`
    pub state: InvitationState,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<Invitation> for InvitationResponse {
    fn from(invitation: Invitation) -> Self {
        Self {
            state: invitation.state(),
            id: invitation.id,
            team_id: invitation.team_id,
            inviter_id: invitation.inviter_id,
            invitee_id: invitation.invitee_id,
            message: invitation.message,
            expires_at: invitation.expires_at,
            created_at: invitation.created_at,
            resolved_at: invitation.resolved_at,
        }
    }
}

/// Accepted invitation with the resulting membership
#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptInvitationResponse {
    pub invitation: InvitationResponse,
    pub team: TeamResponse,
    pub member: MemberResponse,
}

/// Load an invitation addressed to `user_id`
async fn load_own_invitation(
    state: &TeamsState,
    invitation_id: Uuid,
    user_id: Uuid,
) -> Result<Invitation> {
    let invitation = state
        .store
        .get_invitation(invitation_id)
        .await?
        .ok_or_else(|| Error::NotFound("Invitation not found".to_string()))?;

    if invitation.invitee_id != user_id {
        return Err(Error::Authorization(
            "This invitation is not addressed to you".to_string(),
        ));
    }
    Ok(invitation)
}

/// Invite a user to the team
///
/// **POST /v1/teams/{team_id}/invitations**
///
/// **Business Rules:**
/// - Leader only; cannot invite themself
/// - Team must be recruiting
/// - Invitee must not be a member or hold another pending invitation
pub async fn create_invitation(
    AuthUser(auth): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateInvitationRequest>,
) -> Result<(StatusCode, Json<InvitationResponse>)> {
    let team = load_team(&state, team_id).await?;
    require_leader(&team, auth.user_id(), "invite members")?;

    let invitation = Invitation::new(
        team_id,
        auth.user_id(),
        request.invitee_id,
        request.message,
        state.settings.invitation_ttl,
    )?;
    let created = state.store.create_invitation(&invitation).await?;

    tracing::info!(
        invitation_id = %created.id,
        team_id = %team_id,
        invitee_id = %created.invitee_id,
        expires_at = %created.expires_at,
        "Invitation created"
    );

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// List a team's invitations
///
/// **GET /v1/teams/{team_id}/invitations?status=**
pub async fn list_team_invitations(
    AuthUser(auth): AuthUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
    Query(query): Query<InvitationQuery>,
) -> Result<Json<Vec<InvitationResponse>>> {
    let team = load_team(&state, team_id).await?;
    require_leader(&team, auth.user_id(), "view invitations")?;

    let invitations = state
        .store
        .list_invitations_for_team(team_id, query.status)
        .await?;
    Ok(Json(invitations.into_iter().map(Into::into).collect()))
}

/// Invitations addressed to the caller
///
/// **GET /v1/me/invitations**
pub async fn list_my_invitations(
    AuthUser(auth): AuthUser,
    State(state): State<TeamsState>,
) -> Result<Json<Vec<InvitationResponse>>> {
    let invitations = state
        .store
        .list_invitations_for_user(auth.user_id())
        .await?;
    Ok(Json(invitations.into_iter().map(Into::into).collect()))
}

/// Accept an invitation
///
/// **POST /v1/invitations/{invitation_id}/accept**
pub async fn accept_invitation(
    AuthUser(auth): AuthUser,
    State(state): State<TeamsState>,
    Path(invitation_id): Path<Uuid>,
) -> Result<Json<AcceptInvitationResponse>> {
    let invitation = load_own_invitation(&state, invitation_id, auth.user_id()).await?;
    let team = load_team(&state, invitation.team_id).await?;

    // Fail fast on a snapshot; the store re-checks under its lock
    let members = state.store.list_members(team.id).await?;
    let already_member = members.iter().any(|m| m.user_id == invitation.invitee_id);
    invitation
        .clone()
        .accept(&team.admission_guard(members.len(), already_member))?;

    let admission = state.store.accept_invitation(invitation_id).await?;

    tracing::info!(
        invitation_id = %invitation_id,
        team_id = %admission.team.id,
        member_id = %admission.member.user_id,
        team_status = %admission.team.status,
        "Invitation accepted"
    );

    let member = MemberResponse::from_member(admission.member, &admission.team);
    Ok(Json(AcceptInvitationResponse {
        invitation: admission.resolved.into(),
        team: admission.team.into(),
        member,
    }))
}

/// Reject an invitation
///
/// **POST /v1/invitations/{invitation_id}/reject**
pub async fn reject_invitation(
    AuthUser(auth): AuthUser,
    State(state): State<TeamsState>,
    Path(invitation_id): Path<Uuid>,
) -> Result<Json<InvitationResponse>> {
    let mut invitation = load_own_invitation(&state, invitation_id, auth.user_id()).await?;

    invitation.reject()?;
    let resolved = state.store.resolve_invitation(&invitation).await?;

    tracing::info!(invitation_id = %invitation_id, "Invitation rejected");
    Ok(Json(resolved.into()))
}
