//! PostgreSQL teams store
//!
//! Mutations that depend on head count or pending status run in a single
//! transaction holding `SELECT ... FOR UPDATE` on the team row, then apply the
//! shared membership rules to what they read.

use async_trait::async_trait;
use hackhub_common::{Error, Pagination, RepositoryError, Result};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::rules::{self, RemovalPlan};
use super::{Admission, MemberRemoval, TeamFilter, TeamsStore};
use crate::domain::entities::{
    Invitation, InvitationState, JoinRequest, JoinRequestStatus, Member, Team, TeamChange,
};

const TEAM_COLUMNS: &str =
    "id, name, description, max_size, status, leader_id, created_at, updated_at";
const MEMBER_COLUMNS: &str = "team_id, user_id, role, joined_at";
const JOIN_REQUEST_COLUMNS: &str =
    "id, team_id, requester_id, message, skills, status, created_at, resolved_at";
const INVITATION_COLUMNS: &str =
    "id, team_id, inviter_id, invitee_id, message, status, expires_at, created_at, resolved_at";

/// Map a unique-constraint violation to a conflict with `message`
fn unique_violation(err: sqlx::Error, message: &str) -> Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::Conflict(message.to_string())
        }
        _ => Error::Database(err),
    }
}

#[derive(Clone)]
pub struct PgTeamsStore {
    pool: PgPool,
}

impl PgTeamsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock the team row for the rest of the transaction
    async fn lock_team(conn: &mut PgConnection, team_id: Uuid) -> Result<Team> {
        sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1 FOR UPDATE"
        ))
        .bind(team_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| Error::NotFound("Team not found".to_string()))
    }

    async fn members_of(conn: &mut PgConnection, team_id: Uuid) -> Result<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members WHERE team_id = $1 ORDER BY joined_at, seq"
        ))
        .bind(team_id)
        .fetch_all(conn)
        .await?;
        Ok(members)
    }

    async fn is_member(conn: &mut PgConnection, team_id: Uuid, user_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM team_members WHERE team_id = $1 AND user_id = $2)",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(conn)
        .await?;
        Ok(exists)
    }

    async fn save_team(conn: &mut PgConnection, team: &Team) -> Result<Team> {
        let saved = sqlx::query_as::<_, Team>(&format!(
            r#"
            UPDATE teams
            SET name = $2, description = $3, max_size = $4, status = $5,
                leader_id = $6, updated_at = $7
            WHERE id = $1
            RETURNING {TEAM_COLUMNS}
            "#
        ))
        .bind(team.id)
        .bind(&team.name)
        .bind(&team.description)
        .bind(team.max_size)
        .bind(team.status)
        .bind(team.leader_id)
        .bind(team.updated_at)
        .fetch_one(conn)
        .await?;
        Ok(saved)
    }

    async fn insert_member(conn: &mut PgConnection, member: &Member) -> Result<()> {
        sqlx::query(
            "INSERT INTO team_members (team_id, user_id, role, joined_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(member.team_id)
        .bind(member.user_id)
        .bind(&member.role)
        .bind(member.joined_at)
        .execute(conn)
        .await
        .map_err(|e| unique_violation(e, "User is already a member of this team"))?;
        Ok(())
    }

    /// Resolve whatever the new member still has pending for this team
    async fn settle_pending_for(
        conn: &mut PgConnection,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE join_requests SET status = 'cancelled', resolved_at = NOW()
            WHERE team_id = $1 AND requester_id = $2 AND status = 'pending'
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            r#"
            UPDATE invitations SET status = 'expired', resolved_at = NOW()
            WHERE team_id = $1 AND invitee_id = $2 AND status = 'pending'
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    async fn delete_team_rows(conn: &mut PgConnection, team_id: Uuid) -> Result<u64> {
        // team_members, join_requests and invitations cascade
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(team_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TeamsStore for PgTeamsStore {
    async fn create_team(&self, team: &Team, leader: &Member) -> Result<Team> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Team>(&format!(
            r#"
            INSERT INTO teams ({TEAM_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TEAM_COLUMNS}
            "#
        ))
        .bind(team.id)
        .bind(&team.name)
        .bind(&team.description)
        .bind(team.max_size)
        .bind(team.status)
        .bind(team.leader_id)
        .bind(team.created_at)
        .bind(team.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, "Team already exists"))?;

        Self::insert_member(&mut tx, leader).await?;
        tx.commit().await?;
        Ok(created)
    }

    async fn get_team(&self, team_id: Uuid) -> Result<Option<Team>> {
        let team = sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1"
        ))
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(team)
    }

    async fn list_teams(&self, filter: &TeamFilter, page: Pagination) -> Result<Vec<Team>> {
        let teams = sqlx::query_as::<_, Team>(&format!(
            r#"
            SELECT {TEAM_COLUMNS} FROM teams
            WHERE ($1::team_status IS NULL OR status = $1)
              AND ($2::text IS NULL OR strpos(lower(name), $2) > 0)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#
        ))
        .bind(filter.status)
        .bind(filter.search_term())
        .bind(page.offset())
        .bind(page.limit())
        .fetch_all(&self.pool)
        .await?;
        Ok(teams)
    }

    async fn list_teams_for_user(&self, user_id: Uuid) -> Result<Vec<Team>> {
        let teams = sqlx::query_as::<_, Team>(
            r#"
            SELECT t.id, t.name, t.description, t.max_size, t.status, t.leader_id,
                   t.created_at, t.updated_at
            FROM teams t
            JOIN team_members m ON m.team_id = t.id
            WHERE m.user_id = $1
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(teams)
    }

    async fn update_team(&self, team_id: Uuid, change: TeamChange) -> Result<Team> {
        let mut tx = self.pool.begin().await?;
        let mut team = Self::lock_team(&mut tx, team_id).await?;
        let head_count = Self::members_of(&mut tx, team_id).await?.len();

        change.apply(&mut team, head_count)?;

        let saved = Self::save_team(&mut tx, &team).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn delete_team(&self, team_id: Uuid) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        if Self::delete_team_rows(&mut conn, team_id).await? == 0 {
            return Err(Error::NotFound("Team not found".to_string()));
        }
        Ok(())
    }

    async fn list_members(&self, team_id: Uuid) -> Result<Vec<Member>> {
        let mut conn = self.pool.acquire().await?;
        Self::members_of(&mut conn, team_id).await
    }

    async fn get_member(&self, team_id: Uuid, user_id: Uuid) -> Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members WHERE team_id = $1 AND user_id = $2"
        ))
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }

    async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> Result<MemberRemoval> {
        let mut tx = self.pool.begin().await?;
        let team = Self::lock_team(&mut tx, team_id).await?;
        let members = Self::members_of(&mut tx, team_id).await?;

        let removal = match rules::plan_removal(&team, &members, user_id)? {
            RemovalPlan::DeleteTeam => {
                Self::delete_team_rows(&mut tx, team_id).await?;
                MemberRemoval::TeamDeleted
            }
            RemovalPlan::Remove(team) => {
                sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND user_id = $2")
                    .bind(team_id)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
                MemberRemoval::Removed(Self::save_team(&mut tx, &team).await?)
            }
        };

        tx.commit().await?;
        Ok(removal)
    }

    async fn transfer_leadership(&self, team_id: Uuid, new_leader_id: Uuid) -> Result<Team> {
        let mut tx = self.pool.begin().await?;
        let team = Self::lock_team(&mut tx, team_id).await?;
        let members = Self::members_of(&mut tx, team_id).await?;

        let team = rules::plan_transfer(&team, &members, new_leader_id)?;
        let saved = Self::save_team(&mut tx, &team).await?;

        tx.commit().await?;
        Ok(saved)
    }

    async fn create_join_request(&self, request: &JoinRequest) -> Result<JoinRequest> {
        let mut tx = self.pool.begin().await?;
        let team = Self::lock_team(&mut tx, request.team_id).await?;
        let already_member = Self::is_member(&mut tx, team.id, request.requester_id).await?;
        let has_pending: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM join_requests
                WHERE team_id = $1 AND requester_id = $2 AND status = 'pending'
            )
            "#,
        )
        .bind(team.id)
        .bind(request.requester_id)
        .fetch_one(&mut *tx)
        .await?;

        rules::check_open_for_admission(&team, already_member, has_pending, "join request")?;

        let created = sqlx::query_as::<_, JoinRequest>(&format!(
            r#"
            INSERT INTO join_requests ({JOIN_REQUEST_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {JOIN_REQUEST_COLUMNS}
            "#
        ))
        .bind(request.id)
        .bind(request.team_id)
        .bind(request.requester_id)
        .bind(&request.message)
        .bind(&request.skills)
        .bind(request.status)
        .bind(request.created_at)
        .bind(request.resolved_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, "A pending join request already exists for this team"))?;

        tx.commit().await?;
        Ok(created)
    }

    async fn get_join_request(&self, request_id: Uuid) -> Result<Option<JoinRequest>> {
        let request = sqlx::query_as::<_, JoinRequest>(&format!(
            "SELECT {JOIN_REQUEST_COLUMNS} FROM join_requests WHERE id = $1"
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(request)
    }

    async fn list_join_requests_for_team(
        &self,
        team_id: Uuid,
        status: Option<JoinRequestStatus>,
    ) -> Result<Vec<JoinRequest>> {
        let requests = sqlx::query_as::<_, JoinRequest>(&format!(
            r#"
            SELECT {JOIN_REQUEST_COLUMNS} FROM join_requests
            WHERE team_id = $1 AND ($2::join_request_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(team_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn list_join_requests_for_user(&self, user_id: Uuid) -> Result<Vec<JoinRequest>> {
        let requests = sqlx::query_as::<_, JoinRequest>(&format!(
            r#"
            SELECT {JOIN_REQUEST_COLUMNS} FROM join_requests
            WHERE requester_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn accept_join_request(
        &self,
        request_id: Uuid,
        role: Option<String>,
    ) -> Result<Admission<JoinRequest>> {
        let mut tx = self.pool.begin().await?;

        let team_id: Uuid = sqlx::query_scalar("SELECT team_id FROM join_requests WHERE id = $1")
            .bind(request_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::NotFound("Join request not found".to_string()))?;

        // Lock the team before re-reading the request so concurrent accepts
        // for the same team queue up here
        let team = Self::lock_team(&mut tx, team_id).await?;
        let mut request = sqlx::query_as::<_, JoinRequest>(&format!(
            "SELECT {JOIN_REQUEST_COLUMNS} FROM join_requests WHERE id = $1 FOR UPDATE"
        ))
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await?;
        let head_count = Self::members_of(&mut tx, team_id).await?.len();
        let already_member = Self::is_member(&mut tx, team_id, request.requester_id).await?;

        let (team, member) =
            rules::admit_join_request(&team, head_count, already_member, &mut request, role)?;

        let resolved = sqlx::query_as::<_, JoinRequest>(&format!(
            r#"
            UPDATE join_requests SET status = $2, resolved_at = $3
            WHERE id = $1 AND status = 'pending'
            RETURNING {JOIN_REQUEST_COLUMNS}
            "#
        ))
        .bind(request.id)
        .bind(request.status)
        .bind(request.resolved_at)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            RepositoryError::Precondition("Join request is no longer pending".to_string())
        })?;

        Self::insert_member(&mut tx, &member).await?;
        Self::settle_pending_for(&mut tx, team_id, member.user_id).await?;
        let team = Self::save_team(&mut tx, &team).await?;

        tx.commit().await?;
        Ok(Admission {
            resolved,
            team,
            member,
        })
    }

    async fn resolve_join_request(&self, request: &JoinRequest) -> Result<JoinRequest> {
        let resolved = sqlx::query_as::<_, JoinRequest>(&format!(
            r#"
            UPDATE join_requests SET status = $2, resolved_at = $3
            WHERE id = $1 AND status = 'pending'
            RETURNING {JOIN_REQUEST_COLUMNS}
            "#
        ))
        .bind(request.id)
        .bind(request.status)
        .bind(request.resolved_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(resolved) = resolved {
            return Ok(resolved);
        }
        match self.get_join_request(request.id).await? {
            Some(_) => Err(RepositoryError::Precondition(
                "Join request is no longer pending".to_string(),
            )
            .into()),
            None => Err(Error::NotFound("Join request not found".to_string())),
        }
    }

    async fn create_invitation(&self, invitation: &Invitation) -> Result<Invitation> {
        let mut tx = self.pool.begin().await?;
        let team = Self::lock_team(&mut tx, invitation.team_id).await?;
        let already_member = Self::is_member(&mut tx, team.id, invitation.invitee_id).await?;
        let has_pending: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM invitations
                WHERE team_id = $1 AND invitee_id = $2
                  AND status = 'pending' AND expires_at > NOW()
            )
            "#,
        )
        .bind(team.id)
        .bind(invitation.invitee_id)
        .fetch_one(&mut *tx)
        .await?;

        rules::check_open_for_admission(&team, already_member, has_pending, "invitation")?;

        // Lapsed invitations are recorded as expired so the pending index stays unique
        sqlx::query(
            r#"
            UPDATE invitations SET status = 'expired', resolved_at = expires_at
            WHERE team_id = $1 AND invitee_id = $2
              AND status = 'pending' AND expires_at <= NOW()
            "#,
        )
        .bind(team.id)
        .bind(invitation.invitee_id)
        .execute(&mut *tx)
        .await?;

        let created = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            INSERT INTO invitations ({INVITATION_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {INVITATION_COLUMNS}
            "#
        ))
        .bind(invitation.id)
        .bind(invitation.team_id)
        .bind(invitation.inviter_id)
        .bind(invitation.invitee_id)
        .bind(&invitation.message)
        .bind(invitation.status)
        .bind(invitation.expires_at)
        .bind(invitation.created_at)
        .bind(invitation.resolved_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, "A pending invitation already exists for this team"))?;

        tx.commit().await?;
        Ok(created)
    }

    async fn get_invitation(&self, invitation_id: Uuid) -> Result<Option<Invitation>> {
        let invitation = sqlx::query_as::<_, Invitation>(&format!(
            "SELECT {INVITATION_COLUMNS} FROM invitations WHERE id = $1"
        ))
        .bind(invitation_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invitation)
    }

    async fn list_invitations_for_team(
        &self,
        team_id: Uuid,
        status: Option<InvitationState>,
    ) -> Result<Vec<Invitation>> {
        let invitations = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            SELECT {INVITATION_COLUMNS} FROM invitations
            WHERE team_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        // Expiry is derived from `expires_at`, so filter on the observed state
        Ok(invitations
            .into_iter()
            .filter(|i| status.map_or(true, |s| i.state() == s))
            .collect())
    }

    async fn list_invitations_for_user(&self, user_id: Uuid) -> Result<Vec<Invitation>> {
        let invitations = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            SELECT {INVITATION_COLUMNS} FROM invitations
            WHERE invitee_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(invitations)
    }

    async fn accept_invitation(&self, invitation_id: Uuid) -> Result<Admission<Invitation>> {
        let mut tx = self.pool.begin().await?;

        let team_id: Uuid = sqlx::query_scalar("SELECT team_id FROM invitations WHERE id = $1")
            .bind(invitation_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::NotFound("Invitation not found".to_string()))?;

        let team = Self::lock_team(&mut tx, team_id).await?;
        let mut invitation = sqlx::query_as::<_, Invitation>(&format!(
            "SELECT {INVITATION_COLUMNS} FROM invitations WHERE id = $1 FOR UPDATE"
        ))
        .bind(invitation_id)
        .fetch_one(&mut *tx)
        .await?;
        let head_count = Self::members_of(&mut tx, team_id).await?.len();
        let already_member = Self::is_member(&mut tx, team_id, invitation.invitee_id).await?;

        let (team, member) =
            rules::admit_invitation(&team, head_count, already_member, &mut invitation)?;

        let resolved = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            UPDATE invitations SET status = $2, resolved_at = $3
            WHERE id = $1 AND status = 'pending'
            RETURNING {INVITATION_COLUMNS}
            "#
        ))
        .bind(invitation.id)
        .bind(invitation.status)
        .bind(invitation.resolved_at)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            RepositoryError::Precondition("Invitation is no longer pending".to_string())
        })?;

        Self::insert_member(&mut tx, &member).await?;
        Self::settle_pending_for(&mut tx, team_id, member.user_id).await?;
        let team = Self::save_team(&mut tx, &team).await?;

        tx.commit().await?;
        Ok(Admission {
            resolved,
            team,
            member,
        })
    }

    async fn resolve_invitation(&self, invitation: &Invitation) -> Result<Invitation> {
        let resolved = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            UPDATE invitations SET status = $2, resolved_at = $3
            WHERE id = $1 AND status = 'pending'
            RETURNING {INVITATION_COLUMNS}
            "#
        ))
        .bind(invitation.id)
        .bind(invitation.status)
        .bind(invitation.resolved_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(resolved) = resolved {
            return Ok(resolved);
        }
        match self.get_invitation(invitation.id).await? {
            Some(_) => Err(RepositoryError::Precondition(
                "Invitation is no longer pending".to_string(),
            )
            .into()),
            None => Err(Error::NotFound("Invitation not found".to_string())),
        }
    }
}
