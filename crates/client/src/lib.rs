//! HackHub API client
//!
//! A thin typed wrapper over the `/v1` HTTP API. Every call maps one route,
//! sends a plain payload and returns the decoded response or a [`ClientError`]
//! carrying a message fit to show the user. Failed calls are not retried.

pub mod client;

use serde::Deserialize;
use thiserror::Error;

pub use client::HackhubClient;

// Wire types shared with the server
pub use hackhub_lfg::api::handlers::{CreatePostRequest, ListPostsQuery, PostResponse};
pub use hackhub_lfg::LfgKind;
pub use hackhub_teams::api::handlers::{
    invitations::{AcceptInvitationResponse, CreateInvitationRequest, InvitationResponse},
    join_requests::{
        AcceptJoinRequest, AcceptJoinRequestResponse, CreateJoinRequest, JoinRequestResponse,
    },
    members::{LeaveTeamResponse, TransferLeadershipRequest},
    teams::{
        CreateTeamRequest, ListTeamsQuery, MemberResponse, TeamDetailResponse, TeamResponse,
        UpdateTeamRequest,
    },
};
pub use hackhub_teams::{InvitationState, JoinRequestStatus, TeamStatus};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HackHub request error: {0}")]
    Request(String),

    #[error("HackHub API returned {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("HackHub response decode error: {0}")]
    Decode(String),
}

impl ClientError {
    /// Text to show the user when a call fails
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Request(_) => {
                "Could not reach HackHub. Check your connection and try again.".to_string()
            }
            ClientError::Api { message, .. } => message.clone(),
            ClientError::Decode(_) => "HackHub sent a response we could not read.".to_string(),
        }
    }

    /// HTTP status for API errors
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}

/// Error envelope returned by the API: `{"error": {"code", "message"}}`
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_uses_api_message() {
        let err = ClientError::Api {
            status: 409,
            code: "CONFLICT".to_string(),
            message: "Team is full".to_string(),
        };
        assert_eq!(err.user_message(), "Team is full");
        assert!(err.is_conflict());
    }

    #[test]
    fn test_transport_errors_have_generic_message() {
        let err = ClientError::Request("connection refused".to_string());
        assert!(err.user_message().contains("Could not reach HackHub"));
        assert_eq!(err.status(), None);
    }
}
