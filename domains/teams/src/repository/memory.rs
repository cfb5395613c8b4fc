//! In-memory teams store
//!
//! Used for local runs (`STORE_BACKEND=memory`) and tests. A single mutex
//! guards all state, which serializes every mutation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use hackhub_common::{Error, Pagination, RepositoryError, Result};
use uuid::Uuid;

use super::rules::{self, RemovalPlan};
use super::{Admission, MemberRemoval, TeamFilter, TeamsStore};
use crate::domain::entities::{
    Invitation, InvitationState, JoinRequest, JoinRequestStatus, Member, Team, TeamChange,
};

#[derive(Debug, Default)]
struct Inner {
    teams: HashMap<Uuid, Team>,
    /// Insertion order doubles as join order
    members: Vec<Member>,
    join_requests: Vec<JoinRequest>,
    invitations: Vec<Invitation>,
}

impl Inner {
    fn team(&self, team_id: Uuid) -> Result<&Team> {
        self.teams
            .get(&team_id)
            .ok_or_else(|| Error::NotFound("Team not found".to_string()))
    }

    fn members_of(&self, team_id: Uuid) -> Vec<Member> {
        self.members
            .iter()
            .filter(|m| m.team_id == team_id)
            .cloned()
            .collect()
    }

    fn head_count(&self, team_id: Uuid) -> usize {
        self.members.iter().filter(|m| m.team_id == team_id).count()
    }

    fn is_member(&self, team_id: Uuid, user_id: Uuid) -> bool {
        self.members
            .iter()
            .any(|m| m.team_id == team_id && m.user_id == user_id)
    }

    /// Resolve whatever the new member still has pending for this team
    fn settle_pending_for(&mut self, team_id: Uuid, user_id: Uuid) -> Result<()> {
        for request in self
            .join_requests
            .iter_mut()
            .filter(|r| r.team_id == team_id && r.requester_id == user_id && r.is_pending())
        {
            request.cancel()?;
        }
        for invitation in self.invitations.iter_mut().filter(|i| {
            i.team_id == team_id
                && i.invitee_id == user_id
                && i.status == InvitationState::Pending
        }) {
            invitation.expire()?;
        }
        Ok(())
    }

    fn newest_first(mut teams: Vec<Team>) -> Vec<Team> {
        teams.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        teams
    }
}

/// Mutex-backed [`TeamsStore`]
#[derive(Debug, Clone, Default)]
pub struct InMemoryTeamsStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryTeamsStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| Error::Internal("Teams store lock poisoned".to_string()))
    }
}

#[async_trait]
impl TeamsStore for InMemoryTeamsStore {
    async fn create_team(&self, team: &Team, leader: &Member) -> Result<Team> {
        let mut inner = self.lock()?;
        if inner.teams.contains_key(&team.id) {
            return Err(RepositoryError::AlreadyExists.into());
        }
        inner.teams.insert(team.id, team.clone());
        inner.members.push(leader.clone());
        Ok(team.clone())
    }

    async fn get_team(&self, team_id: Uuid) -> Result<Option<Team>> {
        Ok(self.lock()?.teams.get(&team_id).cloned())
    }

    async fn list_teams(&self, filter: &TeamFilter, page: Pagination) -> Result<Vec<Team>> {
        let inner = self.lock()?;
        let teams = inner
            .teams
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        Ok(page.window(Inner::newest_first(teams)))
    }

    async fn list_teams_for_user(&self, user_id: Uuid) -> Result<Vec<Team>> {
        let inner = self.lock()?;
        let teams = inner
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| inner.teams.get(&m.team_id).cloned())
            .collect();
        Ok(Inner::newest_first(teams))
    }

    async fn update_team(&self, team_id: Uuid, change: TeamChange) -> Result<Team> {
        let mut inner = self.lock()?;
        let mut team = inner.team(team_id)?.clone();
        change.apply(&mut team, inner.head_count(team_id))?;
        inner.teams.insert(team_id, team.clone());
        Ok(team)
    }

    async fn delete_team(&self, team_id: Uuid) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.teams.remove(&team_id).is_none() {
            return Err(Error::NotFound("Team not found".to_string()));
        }
        inner.members.retain(|m| m.team_id != team_id);
        inner.join_requests.retain(|r| r.team_id != team_id);
        inner.invitations.retain(|i| i.team_id != team_id);
        Ok(())
    }

    async fn list_members(&self, team_id: Uuid) -> Result<Vec<Member>> {
        Ok(self.lock()?.members_of(team_id))
    }

    async fn get_member(&self, team_id: Uuid, user_id: Uuid) -> Result<Option<Member>> {
        Ok(self
            .lock()?
            .members
            .iter()
            .find(|m| m.team_id == team_id && m.user_id == user_id)
            .cloned())
    }

    async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> Result<MemberRemoval> {
        let mut inner = self.lock()?;
        let team = inner.team(team_id)?.clone();
        let members = inner.members_of(team_id);

        match rules::plan_removal(&team, &members, user_id)? {
            RemovalPlan::DeleteTeam => {
                inner.teams.remove(&team_id);
                inner.members.retain(|m| m.team_id != team_id);
                inner.join_requests.retain(|r| r.team_id != team_id);
                inner.invitations.retain(|i| i.team_id != team_id);
                Ok(MemberRemoval::TeamDeleted)
            }
            RemovalPlan::Remove(team) => {
                inner
                    .members
                    .retain(|m| !(m.team_id == team_id && m.user_id == user_id));
                inner.teams.insert(team_id, team.clone());
                Ok(MemberRemoval::Removed(team))
            }
        }
    }

    async fn transfer_leadership(&self, team_id: Uuid, new_leader_id: Uuid) -> Result<Team> {
        let mut inner = self.lock()?;
        let team = inner.team(team_id)?.clone();
        let members = inner.members_of(team_id);
        let team = rules::plan_transfer(&team, &members, new_leader_id)?;
        inner.teams.insert(team_id, team.clone());
        Ok(team)
    }

    async fn create_join_request(&self, request: &JoinRequest) -> Result<JoinRequest> {
        let mut inner = self.lock()?;
        let team = inner.team(request.team_id)?;
        let has_pending = inner.join_requests.iter().any(|r| {
            r.team_id == request.team_id && r.requester_id == request.requester_id && r.is_pending()
        });
        rules::check_open_for_admission(
            team,
            inner.is_member(request.team_id, request.requester_id),
            has_pending,
            "join request",
        )?;
        inner.join_requests.push(request.clone());
        Ok(request.clone())
    }

    async fn get_join_request(&self, request_id: Uuid) -> Result<Option<JoinRequest>> {
        Ok(self
            .lock()?
            .join_requests
            .iter()
            .find(|r| r.id == request_id)
            .cloned())
    }

    async fn list_join_requests_for_team(
        &self,
        team_id: Uuid,
        status: Option<JoinRequestStatus>,
    ) -> Result<Vec<JoinRequest>> {
        let inner = self.lock()?;
        let mut requests: Vec<JoinRequest> = inner
            .join_requests
            .iter()
            .filter(|r| r.team_id == team_id && status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn list_join_requests_for_user(&self, user_id: Uuid) -> Result<Vec<JoinRequest>> {
        let inner = self.lock()?;
        let mut requests: Vec<JoinRequest> = inner
            .join_requests
            .iter()
            .filter(|r| r.requester_id == user_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn accept_join_request(
        &self,
        request_id: Uuid,
        role: Option<String>,
    ) -> Result<Admission<JoinRequest>> {
        let mut inner = self.lock()?;
        let idx = inner
            .join_requests
            .iter()
            .position(|r| r.id == request_id)
            .ok_or_else(|| Error::NotFound("Join request not found".to_string()))?;
        let mut request = inner.join_requests[idx].clone();
        let team = inner.team(request.team_id)?.clone();

        let (team, member) = rules::admit_join_request(
            &team,
            inner.head_count(team.id),
            inner.is_member(team.id, request.requester_id),
            &mut request,
            role,
        )?;

        inner.join_requests[idx] = request.clone();
        inner.settle_pending_for(team.id, member.user_id)?;
        inner.members.push(member.clone());
        inner.teams.insert(team.id, team.clone());
        Ok(Admission {
            resolved: request,
            team,
            member,
        })
    }

    async fn resolve_join_request(&self, request: &JoinRequest) -> Result<JoinRequest> {
        let mut inner = self.lock()?;
        let stored = inner
            .join_requests
            .iter_mut()
            .find(|r| r.id == request.id)
            .ok_or_else(|| Error::NotFound("Join request not found".to_string()))?;
        if !stored.is_pending() {
            return Err(RepositoryError::Precondition(
                "Join request is no longer pending".to_string(),
            )
            .into());
        }
        stored.status = request.status;
        stored.resolved_at = request.resolved_at;
        Ok(stored.clone())
    }

    async fn create_invitation(&self, invitation: &Invitation) -> Result<Invitation> {
        let mut inner = self.lock()?;
        let team = inner.team(invitation.team_id)?;
        let has_pending = inner.invitations.iter().any(|i| {
            i.team_id == invitation.team_id
                && i.invitee_id == invitation.invitee_id
                && i.state() == InvitationState::Pending
        });
        rules::check_open_for_admission(
            team,
            inner.is_member(invitation.team_id, invitation.invitee_id),
            has_pending,
            "invitation",
        )?;
        inner.invitations.push(invitation.clone());
        Ok(invitation.clone())
    }

    async fn get_invitation(&self, invitation_id: Uuid) -> Result<Option<Invitation>> {
        Ok(self
            .lock()?
            .invitations
            .iter()
            .find(|i| i.id == invitation_id)
            .cloned())
    }

    async fn list_invitations_for_team(
        &self,
        team_id: Uuid,
        status: Option<InvitationState>,
    ) -> Result<Vec<Invitation>> {
        let inner = self.lock()?;
        let mut invitations: Vec<Invitation> = inner
            .invitations
            .iter()
            .filter(|i| i.team_id == team_id && status.map_or(true, |s| i.state() == s))
            .cloned()
            .collect();
        invitations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invitations)
    }

    async fn list_invitations_for_user(&self, user_id: Uuid) -> Result<Vec<Invitation>> {
        let inner = self.lock()?;
        let mut invitations: Vec<Invitation> = inner
            .invitations
            .iter()
            .filter(|i| i.invitee_id == user_id)
            .cloned()
            .collect();
        invitations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invitations)
    }

    async fn accept_invitation(&self, invitation_id: Uuid) -> Result<Admission<Invitation>> {
        let mut inner = self.lock()?;
        let idx = inner
            .invitations
            .iter()
            .position(|i| i.id == invitation_id)
            .ok_or_else(|| Error::NotFound("Invitation not found".to_string()))?;
        let mut invitation = inner.invitations[idx].clone();
        let team = inner.team(invitation.team_id)?.clone();

        let (team, member) = rules::admit_invitation(
            &team,
            inner.head_count(team.id),
            inner.is_member(team.id, invitation.invitee_id),
            &mut invitation,
        )?;

        inner.invitations[idx] = invitation.clone();
        inner.settle_pending_for(team.id, member.user_id)?;
        inner.members.push(member.clone());
        inner.teams.insert(team.id, team.clone());
        Ok(Admission {
            resolved: invitation,
            team,
            member,
        })
    }

    async fn resolve_invitation(&self, invitation: &Invitation) -> Result<Invitation> {
        let mut inner = self.lock()?;
        let stored = inner
            .invitations
            .iter_mut()
            .find(|i| i.id == invitation.id)
            .ok_or_else(|| Error::NotFound("Invitation not found".to_string()))?;
        if stored.status != InvitationState::Pending {
            return Err(RepositoryError::Precondition(
                "Invitation is no longer pending".to_string(),
            )
            .into());
        }
        stored.status = invitation.status;
        stored.resolved_at = invitation.resolved_at;
        Ok(stored.clone())
    }
}
