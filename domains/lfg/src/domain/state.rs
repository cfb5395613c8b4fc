//! State machine for LFG posts
//!
//! A post is `open` until its author closes it; `closed` is terminal.

use hackhub_common::StateError;
use serde::{Deserialize, Serialize};

/// LFG post states
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default,
)]
#[sqlx(type_name = "lfg_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LfgStatus {
    #[default]
    Open,
    Closed,
}

impl LfgStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn valid_transitions(&self) -> &'static [LfgStatus] {
        match self {
            Self::Open => &[Self::Closed],
            Self::Closed => &[],
        }
    }
}

impl std::fmt::Display for LfgStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Events that trigger LFG post transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LfgEvent {
    /// Author takes the post down
    Close,
}

impl std::fmt::Display for LfgEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Close => write!(f, "close"),
        }
    }
}

/// LFG post state machine
pub struct LfgStateMachine;

impl LfgStateMachine {
    pub fn transition(current: LfgStatus, event: LfgEvent) -> Result<LfgStatus, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        match (current, event) {
            (LfgStatus::Open, LfgEvent::Close) => Ok(LfgStatus::Closed),
            (from, event) => Err(StateError::InvalidTransition {
                from: from.to_string(),
                to: "unknown".to_string(),
                event: event.to_string(),
            }),
        }
    }

    pub fn can_transition(current: LfgStatus, event: &LfgEvent) -> bool {
        Self::transition(current, *event).is_ok()
    }
}
