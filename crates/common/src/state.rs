//! Common state machine error types
//!
//! Shared across all domain crates that implement state machines.

use thiserror::Error;

use crate::Error;

/// Errors that can occur during state transitions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Invalid transition: cannot transition from {from} to {to} via {event}")]
    InvalidTransition {
        from: String,
        to: String,
        event: String,
    },

    #[error("Guard condition failed: {0}")]
    GuardFailed(String),

    #[error("Terminal state: {0} is a terminal state and cannot transition")]
    TerminalState(String),
}

impl StateError {
    /// Convert into an API error for an entity of the given kind.
    ///
    /// State violations are precondition failures, never server faults.
    pub fn into_conflict(self, entity: &str) -> Error {
        match self {
            StateError::InvalidTransition { from, event, .. } => Error::Conflict(format!(
                "Invalid {} transition: cannot apply '{}' event from '{}' state",
                entity, event, from
            )),
            StateError::TerminalState(state) => Error::Conflict(format!(
                "{} is in terminal state '{}' and cannot transition",
                capitalize(entity),
                state
            )),
            StateError::GuardFailed(msg) => Error::Conflict(msg),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
