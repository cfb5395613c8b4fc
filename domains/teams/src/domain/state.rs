//! State machines for teams domain entities
//!
//! Each state machine defines:
//! - Valid states
//! - Events that trigger transitions
//! - Guard conditions for transitions
//! - Terminal states

use hackhub_common::StateError;
use serde::{Deserialize, Serialize};

// ============================================================================
// Admission guard (shared by join requests and invitations)
// ============================================================================

/// Facts about the target team checked before anyone is admitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdmissionGuard {
    pub team_closed: bool,
    pub team_full: bool,
    pub already_member: bool,
}

impl AdmissionGuard {
    pub fn new(team_closed: bool, head_count: usize, max_size: i32, already_member: bool) -> Self {
        Self {
            team_closed,
            team_full: head_count as i64 >= max_size as i64,
            already_member,
        }
    }

    fn check(&self) -> Result<(), StateError> {
        if self.team_closed {
            return Err(StateError::GuardFailed(
                "Team is closed and not accepting members".to_string(),
            ));
        }
        if self.already_member {
            return Err(StateError::GuardFailed(
                "User is already a member of this team".to_string(),
            ));
        }
        if self.team_full {
            return Err(StateError::GuardFailed("Team is full".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Team State Machine
// ============================================================================

/// Team recruiting states
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default,
)]
#[sqlx(type_name = "team_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TeamStatus {
    #[default]
    Recruiting,
    Full,
    Closed,
}

impl TeamStatus {
    /// Teams never reach a terminal state; a closed team can be reopened.
    pub fn is_terminal(&self) -> bool {
        false
    }

    pub fn valid_transitions(&self) -> &'static [TeamStatus] {
        match self {
            Self::Recruiting => &[Self::Full, Self::Closed],
            Self::Full => &[Self::Recruiting, Self::Closed],
            Self::Closed => &[Self::Recruiting, Self::Full],
        }
    }
}

impl std::fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recruiting => write!(f, "recruiting"),
            Self::Full => write!(f, "full"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Events that trigger team status transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TeamEvent {
    /// Head count reached max size
    Fill,
    /// A member left a full team
    OpenSlot,
    /// Leader stops recruiting
    Close,
    /// Leader resumes recruiting
    Reopen,
}

impl std::fmt::Display for TeamEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fill => write!(f, "fill"),
            Self::OpenSlot => write!(f, "open_slot"),
            Self::Close => write!(f, "close"),
            Self::Reopen => write!(f, "reopen"),
        }
    }
}

/// Guard context for team transitions
#[derive(Debug, Clone, Copy)]
pub struct TeamGuardContext {
    pub head_count: usize,
    pub max_size: i32,
}

impl TeamGuardContext {
    fn at_capacity(&self) -> bool {
        self.head_count as i64 >= self.max_size as i64
    }
}

/// Team state machine
pub struct TeamStateMachine;

impl TeamStateMachine {
    pub fn transition(
        current: TeamStatus,
        event: TeamEvent,
        context: &TeamGuardContext,
    ) -> Result<TeamStatus, StateError> {
        let next = match (current, event) {
            (TeamStatus::Recruiting, TeamEvent::Fill) => {
                if !context.at_capacity() {
                    return Err(StateError::GuardFailed(
                        "Team cannot be full below its max size".to_string(),
                    ));
                }
                TeamStatus::Full
            }
            (TeamStatus::Full, TeamEvent::OpenSlot) => {
                if context.at_capacity() {
                    return Err(StateError::GuardFailed(
                        "Team has no open slot".to_string(),
                    ));
                }
                TeamStatus::Recruiting
            }
            (TeamStatus::Recruiting | TeamStatus::Full, TeamEvent::Close) => TeamStatus::Closed,
            (TeamStatus::Closed, TeamEvent::Reopen) => {
                if context.at_capacity() {
                    TeamStatus::Full
                } else {
                    TeamStatus::Recruiting
                }
            }
            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    to: "unknown".to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }
}

// ============================================================================
// Join Request State Machine
// ============================================================================

/// Join request states
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default,
)]
#[sqlx(type_name = "join_request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JoinRequestStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl JoinRequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn valid_transitions(&self) -> &'static [JoinRequestStatus] {
        match self {
            Self::Pending => &[Self::Accepted, Self::Rejected, Self::Cancelled],
            Self::Accepted | Self::Rejected | Self::Cancelled => &[],
        }
    }
}

impl std::fmt::Display for JoinRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected => write!(f, "rejected"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Events that trigger join request transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JoinRequestEvent {
    /// Leader admits the requester
    Accept,
    /// Leader turns the requester down
    Reject,
    /// Requester withdraws
    Cancel,
}

impl std::fmt::Display for JoinRequestEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accept => write!(f, "accept"),
            Self::Reject => write!(f, "reject"),
            Self::Cancel => write!(f, "cancel"),
        }
    }
}

/// Join request state machine
pub struct JoinRequestStateMachine;

impl JoinRequestStateMachine {
    /// Attempt a transition. `admission` is consulted only for `Accept`.
    pub fn transition(
        current: JoinRequestStatus,
        event: JoinRequestEvent,
        admission: Option<&AdmissionGuard>,
    ) -> Result<JoinRequestStatus, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        let next = match event {
            JoinRequestEvent::Accept => {
                if let Some(guard) = admission {
                    guard.check()?;
                }
                JoinRequestStatus::Accepted
            }
            JoinRequestEvent::Reject => JoinRequestStatus::Rejected,
            JoinRequestEvent::Cancel => JoinRequestStatus::Cancelled,
        };

        Ok(next)
    }

    pub fn can_transition(
        current: JoinRequestStatus,
        event: &JoinRequestEvent,
        admission: Option<&AdmissionGuard>,
    ) -> bool {
        Self::transition(current, *event, admission).is_ok()
    }
}

// ============================================================================
// Invitation State Machine
// ============================================================================

/// Invitation states
///
/// `Expired` is observed rather than written by a user action: a pending
/// invitation past its `expires_at` reports itself as expired.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default,
)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationState {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Expired,
}

impl InvitationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn valid_transitions(&self) -> &'static [InvitationState] {
        match self {
            Self::Pending => &[Self::Accepted, Self::Rejected, Self::Expired],
            Self::Accepted | Self::Rejected | Self::Expired => &[],
        }
    }
}

impl std::fmt::Display for InvitationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected => write!(f, "rejected"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// Events that trigger invitation state transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvitationEvent {
    /// Invitee accepts
    Accept,
    /// Invitee declines
    Reject,
    /// Invitation passes `expires_at`
    Expire,
}

impl std::fmt::Display for InvitationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accept => write!(f, "accept"),
            Self::Reject => write!(f, "reject"),
            Self::Expire => write!(f, "expire"),
        }
    }
}

/// Guard context for invitation transitions
#[derive(Debug, Clone, Copy, Default)]
pub struct InvitationGuardContext {
    /// Whether the invitation has expired (expires_at < now)
    pub is_expired: bool,
    pub admission: Option<AdmissionGuard>,
}

/// Invitation state machine
pub struct InvitationStateMachine;

impl InvitationStateMachine {
    pub fn transition(
        current: InvitationState,
        event: InvitationEvent,
        context: Option<&InvitationGuardContext>,
    ) -> Result<InvitationState, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        let next = match event {
            InvitationEvent::Accept => {
                if let Some(ctx) = context {
                    if ctx.is_expired {
                        return Err(StateError::GuardFailed(
                            "Cannot accept expired invitation".to_string(),
                        ));
                    }
                    if let Some(guard) = &ctx.admission {
                        guard.check()?;
                    }
                }
                InvitationState::Accepted
            }
            InvitationEvent::Reject => {
                if context.is_some_and(|ctx| ctx.is_expired) {
                    return Err(StateError::GuardFailed(
                        "Cannot reject expired invitation".to_string(),
                    ));
                }
                InvitationState::Rejected
            }
            InvitationEvent::Expire => InvitationState::Expired,
        };

        Ok(next)
    }

    pub fn can_transition(
        current: InvitationState,
        event: &InvitationEvent,
        context: Option<&InvitationGuardContext>,
    ) -> bool {
        Self::transition(current, *event, context).is_ok()
    }
}

// ============================================================================
// Tests
// ============================================================================
