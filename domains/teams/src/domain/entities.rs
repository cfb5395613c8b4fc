//! Domain entities for the HackHub teams domain
//!
//! Teams, their members, join requests and invitations. Each entity carries
//! its own validation and drives status changes through the state machines
//! in [`crate::domain::state`].

use chrono::{DateTime, Duration, Utc};
use hackhub_common::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use crate::domain::state::{InvitationState, JoinRequestStatus, TeamStatus};
use crate::domain::state::{
    AdmissionGuard, InvitationEvent, InvitationGuardContext, InvitationStateMachine,
    JoinRequestEvent, JoinRequestStateMachine, TeamEvent, TeamGuardContext, TeamStateMachine,
};
pub use crate::domain::validation::MAX_TEAM_SIZE;
use crate::domain::validation::{validate_message, validate_role_label, validate_skills};

/// Team entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub max_size: i32,
    pub status: TeamStatus,
    pub leader_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    /// Create a new recruiting team led by `leader_id`
    pub fn new(
        leader_id: Uuid,
        name: String,
        description: Option<String>,
        max_size: i32,
    ) -> Result<Self> {
        let name = name.trim().to_string();
        let description = description.unwrap_or_default();
        Self::validate_details(&name, &description, max_size)?;

        let now = Utc::now();
        let mut team = Team {
            id: Uuid::new_v4(),
            name,
            description,
            max_size,
            status: TeamStatus::Recruiting,
            leader_id,
            created_at: now,
            updated_at: now,
        };
        // A solo team is full from the start
        team.sync_status(1)?;
        Ok(team)
    }

    /// Validate user-editable fields
    pub fn validate_details(name: &str, description: &str, max_size: i32) -> Result<()> {
        let name_len = name.chars().count();
        if !(3..=100).contains(&name_len) {
            return Err(Error::Validation(
                "Team name must be 3-100 characters".to_string(),
            ));
        }
        if description.chars().count() > 2000 {
            return Err(Error::Validation(
                "Team description must be at most 2000 characters".to_string(),
            ));
        }
        if !(1..=MAX_TEAM_SIZE).contains(&max_size) {
            return Err(Error::Validation(format!(
                "Team size must be between 1 and {}",
                MAX_TEAM_SIZE
            )));
        }
        Ok(())
    }

    /// Validate invariants against the current head count
    pub fn validate(&self, head_count: usize) -> Result<()> {
        Self::validate_details(&self.name, &self.description, self.max_size)?;

        if head_count as i64 > self.max_size as i64 {
            return Err(Error::Validation(
                "Team has more members than its max size".to_string(),
            ));
        }

        let at_capacity = head_count as i64 == self.max_size as i64;
        match self.status {
            TeamStatus::Full if !at_capacity => Err(Error::Validation(
                "Full team must be at max size".to_string(),
            )),
            TeamStatus::Recruiting if at_capacity => Err(Error::Validation(
                "Recruiting team must have an open slot".to_string(),
            )),
            _ => Ok(()),
        }
    }

    pub fn is_leader(&self, user_id: Uuid) -> bool {
        self.leader_id == user_id
    }

    pub fn is_closed(&self) -> bool {
        self.status == TeamStatus::Closed
    }

    /// Whether new join requests and invitations may be opened
    pub fn is_recruiting(&self) -> bool {
        self.status == TeamStatus::Recruiting
    }

    /// Admission facts for accepting one more member
    pub fn admission_guard(&self, head_count: usize, already_member: bool) -> AdmissionGuard {
        AdmissionGuard::new(self.is_closed(), head_count, self.max_size, already_member)
    }

    /// Apply a partial update from the leader
    pub fn update_details(
        &mut self,
        name: Option<String>,
        description: Option<String>,
        max_size: Option<i32>,
        head_count: usize,
    ) -> Result<()> {
        let name = name
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|| self.name.clone());
        let description = description.unwrap_or_else(|| self.description.clone());
        let max_size = max_size.unwrap_or(self.max_size);
        Self::validate_details(&name, &description, max_size)?;

        if (max_size as i64) < head_count as i64 {
            return Err(Error::Conflict(format!(
                "Team size cannot be lower than the current {} members",
                head_count
            )));
        }

        self.name = name;
        self.description = description;
        self.max_size = max_size;
        self.sync_status(head_count)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Stop recruiting
    pub fn close(&mut self, head_count: usize) -> Result<()> {
        self.status = self.apply_transition(TeamEvent::Close, head_count)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Resume recruiting; lands in `full` when there is no open slot
    pub fn reopen(&mut self, head_count: usize) -> Result<()> {
        self.status = self.apply_transition(TeamEvent::Reopen, head_count)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Recompute `recruiting`/`full` after the head count changed.
    ///
    /// Closed teams keep their status.
    pub fn sync_status(&mut self, head_count: usize) -> Result<()> {
        let at_capacity = head_count as i64 >= self.max_size as i64;
        let event = match (self.status, at_capacity) {
            (TeamStatus::Recruiting, true) => TeamEvent::Fill,
            (TeamStatus::Full, false) => TeamEvent::OpenSlot,
            _ => return Ok(()),
        };
        self.status = self.apply_transition(event, head_count)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn apply_transition(&self, event: TeamEvent, head_count: usize) -> Result<TeamStatus> {
        let context = TeamGuardContext {
            head_count,
            max_size: self.max_size,
        };
        TeamStateMachine::transition(self.status, event, &context)
            .map_err(|e| e.into_conflict("team"))
    }
}

/// Leader-initiated change to a team's settings or recruiting status
#[derive(Debug, Clone, PartialEq)]
pub enum TeamChange {
    Details {
        name: Option<String>,
        description: Option<String>,
        max_size: Option<i32>,
    },
    Close,
    Reopen,
}

impl TeamChange {
    /// Apply the change given the team's current head count
    pub fn apply(self, team: &mut Team, head_count: usize) -> Result<()> {
        match self {
            TeamChange::Details {
                name,
                description,
                max_size,
            } => team.update_details(name, description, max_size, head_count),
            TeamChange::Close => team.close(head_count),
            TeamChange::Reopen => team.reopen(head_count),
        }
    }
}

/// Team member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub team_id: Uuid,
    pub user_id: Uuid,
    /// Free-form role label, e.g. "Frontend"
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

impl Member {
    pub fn new(team_id: Uuid, user_id: Uuid, role: Option<String>) -> Result<Self> {
        let role = role.map(|r| r.trim().to_string()).unwrap_or_default();
        validate_role_label(&role)?;
        Ok(Member {
            team_id,
            user_id,
            role,
            joined_at: Utc::now(),
        })
    }

    /// The team's first member.
    ///
    /// Leadership follows `Team::leader_id`, so the role label starts empty.
    pub fn leader(team: &Team) -> Self {
        Member {
            team_id: team.id,
            user_id: team.leader_id,
            role: String::new(),
            joined_at: team.created_at,
        }
    }
}

/// A user's application to join a team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct JoinRequest {
    pub id: Uuid,
    pub team_id: Uuid,
    pub requester_id: Uuid,
    pub message: String,
    pub skills: Vec<String>,
    pub status: JoinRequestStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl JoinRequest {
    pub fn new(
        team_id: Uuid,
        requester_id: Uuid,
        message: Option<String>,
        skills: Vec<String>,
    ) -> Result<Self> {
        let message = message.unwrap_or_default();
        validate_message(&message)?;
        validate_skills(&skills)?;

        Ok(JoinRequest {
            id: Uuid::new_v4(),
            team_id,
            requester_id,
            message,
            skills,
            status: JoinRequestStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == JoinRequestStatus::Pending
    }

    /// Accept the request; `admission` describes the target team right now
    pub fn accept(&mut self, admission: &AdmissionGuard) -> Result<()> {
        self.apply_transition(JoinRequestEvent::Accept, Some(admission))
    }

    /// Reject the request (leader-initiated)
    pub fn reject(&mut self) -> Result<()> {
        self.apply_transition(JoinRequestEvent::Reject, None)
    }

    /// Withdraw the request (requester-initiated)
    pub fn cancel(&mut self) -> Result<()> {
        self.apply_transition(JoinRequestEvent::Cancel, None)
    }

    pub fn can_transition(
        &self,
        event: &JoinRequestEvent,
        admission: Option<&AdmissionGuard>,
    ) -> bool {
        JoinRequestStateMachine::can_transition(self.status, event, admission)
    }

    fn apply_transition(
        &mut self,
        event: JoinRequestEvent,
        admission: Option<&AdmissionGuard>,
    ) -> Result<()> {
        self.status = JoinRequestStateMachine::transition(self.status, event, admission)
            .map_err(|e| e.into_conflict("join request"))?;
        self.resolved_at = Some(Utc::now());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        validate_message(&self.message)?;
        validate_skills(&self.skills)?;

        match (self.status, self.resolved_at) {
            (JoinRequestStatus::Pending, Some(_)) => Err(Error::Validation(
                "Pending join request cannot have a resolution time".to_string(),
            )),
            (s, None) if s.is_terminal() => Err(Error::Validation(
                "Resolved join request must have a resolution time".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// A team's offer for a user to join
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invitation {
    pub id: Uuid,
    pub team_id: Uuid,
    pub inviter_id: Uuid,
    pub invitee_id: Uuid,
    pub message: String,
    /// Stored status; see [`Invitation::state`] for the observed one
    pub status: InvitationState,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Invitation {
    pub fn new(
        team_id: Uuid,
        inviter_id: Uuid,
        invitee_id: Uuid,
        message: Option<String>,
        ttl: Duration,
    ) -> Result<Self> {
        if inviter_id == invitee_id {
            return Err(Error::Validation("You cannot invite yourself".to_string()));
        }
        let message = message.unwrap_or_default();
        validate_message(&message)?;

        let now = Utc::now();
        Ok(Invitation {
            id: Uuid::new_v4(),
            team_id,
            inviter_id,
            invitee_id,
            message,
            status: InvitationState::Pending,
            expires_at: now + ttl,
            created_at: now,
            resolved_at: None,
        })
    }

    /// Get current invitation state, with expiry applied
    pub fn state(&self) -> InvitationState {
        match self.status {
            InvitationState::Pending if self.is_expired() => InvitationState::Expired,
            other => other,
        }
    }

    /// Check if invitation can be acted upon
    pub fn is_actionable(&self) -> bool {
        !self.state().is_terminal()
    }

    /// Check if invitation is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    /// Accept the invitation; `admission` describes the target team right now
    pub fn accept(&mut self, admission: &AdmissionGuard) -> Result<()> {
        self.apply_transition(InvitationEvent::Accept, Some(*admission))
    }

    /// Decline the invitation (invitee-initiated)
    pub fn reject(&mut self) -> Result<()> {
        self.apply_transition(InvitationEvent::Reject, None)
    }

    /// Retire a pending invitation that can no longer be used
    pub fn expire(&mut self) -> Result<()> {
        self.apply_transition(InvitationEvent::Expire, None)
    }

    /// Apply a state transition using the state machine
    fn apply_transition(
        &mut self,
        event: InvitationEvent,
        admission: Option<AdmissionGuard>,
    ) -> Result<()> {
        let context = InvitationGuardContext {
            is_expired: self.is_expired(),
            admission,
        };
        // Transition from the stored status so an expired invitation reports
        // the expiry guard rather than a terminal-state error
        self.status = InvitationStateMachine::transition(self.status, event, Some(&context))
            .map_err(|e| e.into_conflict("invitation"))?;
        self.resolved_at = Some(Utc::now());
        Ok(())
    }

    /// Check if a transition is valid without applying it
    pub fn can_transition(&self, event: &InvitationEvent) -> bool {
        let context = InvitationGuardContext {
            is_expired: self.is_expired(),
            admission: None,
        };
        InvitationStateMachine::can_transition(self.status, event, Some(&context))
    }

    pub fn validate(&self) -> Result<()> {
        validate_message(&self.message)?;

        if self.inviter_id == self.invitee_id {
            return Err(Error::Validation(
                "Invitation cannot target its inviter".to_string(),
            ));
        }

        if self.created_at >= self.expires_at {
            return Err(Error::Validation(
                "Expiration must be after creation".to_string(),
            ));
        }

        Ok(())
    }
}
