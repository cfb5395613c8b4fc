//! Membership rules evaluated inside a store's critical section
//!
//! Both store implementations load a consistent snapshot (team, head count,
//! membership) under their lock and hand it to these functions, so the
//! capacity and single-resolution checks are identical across backends.

use hackhub_common::{Error, Result};
use uuid::Uuid;

use crate::domain::entities::{Invitation, JoinRequest, Member, Team};

/// Check that `user_id` may open a join request or receive an invitation
pub(crate) fn check_open_for_admission(
    team: &Team,
    already_member: bool,
    has_pending: bool,
    pending_noun: &str,
) -> Result<()> {
    if already_member {
        return Err(Error::Conflict(
            "User is already a member of this team".to_string(),
        ));
    }
    if !team.is_recruiting() {
        return Err(Error::Conflict(format!(
            "Team is {} and not accepting new members",
            team.status
        )));
    }
    if has_pending {
        return Err(Error::Conflict(format!(
            "A pending {} already exists for this team",
            pending_noun
        )));
    }
    Ok(())
}

/// Accept `request` against the team snapshot.
///
/// Returns the team with its recomputed status and the new member.
pub(crate) fn admit_join_request(
    team: &Team,
    head_count: usize,
    already_member: bool,
    request: &mut JoinRequest,
    role: Option<String>,
) -> Result<(Team, Member)> {
    let member = Member::new(team.id, request.requester_id, role)?;
    request.accept(&team.admission_guard(head_count, already_member))?;
    let mut team = team.clone();
    team.sync_status(head_count + 1)?;
    Ok((team, member))
}

/// Accept `invitation` against the team snapshot
pub(crate) fn admit_invitation(
    team: &Team,
    head_count: usize,
    already_member: bool,
    invitation: &mut Invitation,
) -> Result<(Team, Member)> {
    invitation.accept(&team.admission_guard(head_count, already_member))?;
    let member = Member::new(team.id, invitation.invitee_id, None)?;
    let mut team = team.clone();
    team.sync_status(head_count + 1)?;
    Ok((team, member))
}

/// What removing a member does to its team
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RemovalPlan {
    Remove(Team),
    DeleteTeam,
}

pub(crate) fn plan_removal(team: &Team, members: &[Member], user_id: Uuid) -> Result<RemovalPlan> {
    if !members.iter().any(|m| m.user_id == user_id) {
        return Err(Error::NotFound("Member not found".to_string()));
    }

    if team.is_leader(user_id) {
        if members.len() > 1 {
            return Err(Error::Conflict(
                "The leader must transfer leadership before leaving the team".to_string(),
            ));
        }
        return Ok(RemovalPlan::DeleteTeam);
    }

    let mut team = team.clone();
    team.sync_status(members.len() - 1)?;
    Ok(RemovalPlan::Remove(team))
}

pub(crate) fn plan_transfer(team: &Team, members: &[Member], new_leader_id: Uuid) -> Result<Team> {
    if team.is_leader(new_leader_id) {
        return Err(Error::Validation(
            "User is already the team leader".to_string(),
        ));
    }
    if !members.iter().any(|m| m.user_id == new_leader_id) {
        return Err(Error::Validation(
            "Leadership can only be transferred to a team member".to_string(),
        ));
    }
    let mut team = team.clone();
    team.leader_id = new_leader_id;
    team.updated_at = chrono::Utc::now();
    Ok(team)
}
