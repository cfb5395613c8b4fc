//! Store abstraction for the teams domain
//!
//! Handlers talk to a [`TeamsStore`]. Every mutation that depends on team
//! capacity or on a request still being pending re-checks those facts inside
//! the store's critical section (a row lock in Postgres, the mutex in memory),
//! so two racing accepts can never both take the last slot.

pub mod memory;
pub mod postgres;
mod rules;

use async_trait::async_trait;
use hackhub_common::{Pagination, Result};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::entities::{
    Invitation, InvitationState, JoinRequest, JoinRequestStatus, Member, Team, TeamChange,
    TeamStatus,
};

pub use memory::InMemoryTeamsStore;
pub use postgres::PgTeamsStore;

/// Filters for listing teams
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamFilter {
    pub status: Option<TeamStatus>,
    /// Case-insensitive substring match on the team name
    pub q: Option<String>,
}

impl TeamFilter {
    pub(crate) fn matches(&self, team: &Team) -> bool {
        if self.status.is_some_and(|s| s != team.status) {
            return false;
        }
        match self.search_term() {
            Some(q) => team.name.to_lowercase().contains(&q),
            None => true,
        }
    }

    /// Lowercased search term, `None` when blank
    pub(crate) fn search_term(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }
}

/// Result of admitting a user into a team
#[derive(Debug, Clone)]
pub struct Admission<T> {
    /// The resolved join request or invitation
    pub resolved: T,
    pub team: Team,
    pub member: Member,
}

/// Result of removing a member
#[derive(Debug, Clone, PartialEq)]
pub enum MemberRemoval {
    /// Member removed; the team with its recomputed status
    Removed(Team),
    /// The last member left, so the team was deleted
    TeamDeleted,
}

/// Persistence for teams, members, join requests and invitations
#[async_trait]
pub trait TeamsStore: Send + Sync {
    // --- Teams ---

    /// Insert a team together with its leader as first member
    async fn create_team(&self, team: &Team, leader: &Member) -> Result<Team>;

    async fn get_team(&self, team_id: Uuid) -> Result<Option<Team>>;

    /// Teams matching `filter`, newest first
    async fn list_teams(&self, filter: &TeamFilter, page: Pagination) -> Result<Vec<Team>>;

    /// Teams `user_id` belongs to, newest first
    async fn list_teams_for_user(&self, user_id: Uuid) -> Result<Vec<Team>>;

    /// Apply `change` against the team's locked head count
    async fn update_team(&self, team_id: Uuid, change: TeamChange) -> Result<Team>;

    /// Delete a team with its members, join requests and invitations
    async fn delete_team(&self, team_id: Uuid) -> Result<()>;

    // --- Members ---

    /// Members ordered by join time
    async fn list_members(&self, team_id: Uuid) -> Result<Vec<Member>>;

    async fn get_member(&self, team_id: Uuid, user_id: Uuid) -> Result<Option<Member>>;

    /// Remove a member; the leader may only leave a team they are alone in
    async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> Result<MemberRemoval>;

    /// Hand leadership to another current member
    async fn transfer_leadership(&self, team_id: Uuid, new_leader_id: Uuid) -> Result<Team>;

    // --- Join requests ---

    /// Insert a pending request; the team must be recruiting and the
    /// requester must be neither a member nor holding another pending request
    async fn create_join_request(&self, request: &JoinRequest) -> Result<JoinRequest>;

    async fn get_join_request(&self, request_id: Uuid) -> Result<Option<JoinRequest>>;

    async fn list_join_requests_for_team(
        &self,
        team_id: Uuid,
        status: Option<JoinRequestStatus>,
    ) -> Result<Vec<JoinRequest>>;

    async fn list_join_requests_for_user(&self, user_id: Uuid) -> Result<Vec<JoinRequest>>;

    /// Accept a pending request and add the requester as a member
    async fn accept_join_request(
        &self,
        request_id: Uuid,
        role: Option<String>,
    ) -> Result<Admission<JoinRequest>>;

    /// Persist a rejection or cancellation; fails if no longer pending
    async fn resolve_join_request(&self, request: &JoinRequest) -> Result<JoinRequest>;

    // --- Invitations ---

    /// Insert a pending invitation under the same rules as join requests
    async fn create_invitation(&self, invitation: &Invitation) -> Result<Invitation>;

    async fn get_invitation(&self, invitation_id: Uuid) -> Result<Option<Invitation>>;

    async fn list_invitations_for_team(
        &self,
        team_id: Uuid,
        status: Option<InvitationState>,
    ) -> Result<Vec<Invitation>>;

    async fn list_invitations_for_user(&self, user_id: Uuid) -> Result<Vec<Invitation>>;

    /// Accept a pending, unexpired invitation and add the invitee as a member
    async fn accept_invitation(&self, invitation_id: Uuid) -> Result<Admission<Invitation>>;

    /// Persist a rejection; fails if no longer pending
    async fn resolve_invitation(&self, invitation: &Invitation) -> Result<Invitation>;
}
