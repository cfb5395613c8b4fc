//! HackHub HTTP client implementation

use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::{
    AcceptInvitationResponse, AcceptJoinRequest, AcceptJoinRequestResponse, ClientError,
    CreateInvitationRequest, CreateJoinRequest, CreatePostRequest, CreateTeamRequest,
    ErrorEnvelope, InvitationResponse, InvitationState, JoinRequestResponse, JoinRequestStatus,
    LeaveTeamResponse, ListPostsQuery, ListTeamsQuery, MemberResponse, PostResponse,
    TeamDetailResponse, TeamResponse, TransferLeadershipRequest, UpdateTeamRequest,
};

/// HTTP client for the HackHub API, authenticated with a bearer token.
#[derive(Clone)]
pub struct HackhubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for HackhubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HackhubClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl HackhubClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Authenticate subsequent calls with `token`
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => ClientError::Api {
                status: status.as_u16(),
                code: envelope.error.code,
                message: envelope.error.message,
            },
            Err(_) => ClientError::Api {
                status: status.as_u16(),
                code: "UNKNOWN".to_string(),
                message: format!("Request failed with status {}", status),
            },
        };
        tracing::debug!(status = status.as_u16(), error = %error, "HackHub API call failed");
        Err(error)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        self.execute(builder)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ClientError> {
        self.execute(builder).await.map(|_| ())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.request(Method::POST, path)).await
    }

    // Teams

    /// Create a team led by the caller
    pub async fn create_team(
        &self,
        request: &CreateTeamRequest,
    ) -> Result<TeamDetailResponse, ClientError> {
        self.post("/v1/teams", request).await
    }

    pub async fn list_teams(
        &self,
        query: &ListTeamsQuery,
    ) -> Result<Vec<TeamResponse>, ClientError> {
        self.send(self.request(Method::GET, "/v1/teams").query(query))
            .await
    }

    pub async fn get_team(&self, team_id: Uuid) -> Result<TeamDetailResponse, ClientError> {
        self.get(&format!("/v1/teams/{}", team_id)).await
    }

    pub async fn update_team(
        &self,
        team_id: Uuid,
        request: &UpdateTeamRequest,
    ) -> Result<TeamDetailResponse, ClientError> {
        self.send(
            self.request(Method::PATCH, &format!("/v1/teams/{}", team_id))
                .json(request),
        )
        .await
    }

    pub async fn delete_team(&self, team_id: Uuid) -> Result<(), ClientError> {
        self.send_empty(self.request(Method::DELETE, &format!("/v1/teams/{}", team_id)))
            .await
    }

    pub async fn close_team(&self, team_id: Uuid) -> Result<TeamResponse, ClientError> {
        self.post_empty(&format!("/v1/teams/{}/close", team_id))
            .await
    }

    pub async fn reopen_team(&self, team_id: Uuid) -> Result<TeamResponse, ClientError> {
        self.post_empty(&format!("/v1/teams/{}/reopen", team_id))
            .await
    }

    pub async fn my_teams(&self) -> Result<Vec<TeamResponse>, ClientError> {
        self.get("/v1/me/teams").await
    }

    // Members

    pub async fn list_members(&self, team_id: Uuid) -> Result<Vec<MemberResponse>, ClientError> {
        self.get(&format!("/v1/teams/{}/members", team_id)).await
    }

    pub async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> Result<(), ClientError> {
        self.send_empty(self.request(
            Method::DELETE,
            &format!("/v1/teams/{}/members/{}", team_id, user_id),
        ))
        .await
    }

    pub async fn leave_team(&self, team_id: Uuid) -> Result<LeaveTeamResponse, ClientError> {
        self.post_empty(&format!("/v1/teams/{}/leave", team_id))
            .await
    }

    pub async fn transfer_leadership(
        &self,
        team_id: Uuid,
        new_leader: Uuid,
    ) -> Result<TeamResponse, ClientError> {
        let request = TransferLeadershipRequest {
            user_id: new_leader,
        };
        self.post(&format!("/v1/teams/{}/leader", team_id), &request)
            .await
    }

    // Join requests

    pub async fn request_to_join(
        &self,
        team_id: Uuid,
        request: &CreateJoinRequest,
    ) -> Result<JoinRequestResponse, ClientError> {
        self.post(&format!("/v1/teams/{}/join-requests", team_id), request)
            .await
    }

    pub async fn list_team_join_requests(
        &self,
        team_id: Uuid,
        status: Option<JoinRequestStatus>,
    ) -> Result<Vec<JoinRequestResponse>, ClientError> {
        let mut builder = self.request(
            Method::GET,
            &format!("/v1/teams/{}/join-requests", team_id),
        );
        if let Some(status) = status {
            builder = builder.query(&[("status", status)]);
        }
        self.send(builder).await
    }

    pub async fn my_join_requests(&self) -> Result<Vec<JoinRequestResponse>, ClientError> {
        self.get("/v1/me/join-requests").await
    }

    /// Accept a join request, optionally labelling the new member's role
    pub async fn accept_join_request(
        &self,
        request_id: Uuid,
        role: Option<String>,
    ) -> Result<AcceptJoinRequestResponse, ClientError> {
        self.post(
            &format!("/v1/join-requests/{}/accept", request_id),
            &AcceptJoinRequest { role },
        )
        .await
    }

    pub async fn reject_join_request(
        &self,
        request_id: Uuid,
    ) -> Result<JoinRequestResponse, ClientError> {
        self.post_empty(&format!("/v1/join-requests/{}/reject", request_id))
            .await
    }

    pub async fn cancel_join_request(
        &self,
        request_id: Uuid,
    ) -> Result<JoinRequestResponse, ClientError> {
        self.post_empty(&format!("/v1/join-requests/{}/cancel", request_id))
            .await
    }

    // Invitations

    pub async fn invite(
        &self,
        team_id: Uuid,
        request: &CreateInvitationRequest,
    ) -> Result<InvitationResponse, ClientError> {
        self.post(&format!("/v1/teams/{}/invitations", team_id), request)
            .await
    }

    pub async fn list_team_invitations(
        &self,
        team_id: Uuid,
        state: Option<InvitationState>,
    ) -> Result<Vec<InvitationResponse>, ClientError> {
        let mut builder = self.request(
            Method::GET,
            &format!("/v1/teams/{}/invitations", team_id),
        );
        if let Some(state) = state {
            builder = builder.query(&[("status", state)]);
        }
        self.send(builder).await
    }

    pub async fn my_invitations(&self) -> Result<Vec<InvitationResponse>, ClientError> {
        self.get("/v1/me/invitations").await
    }

    pub async fn accept_invitation(
        &self,
        invitation_id: Uuid,
    ) -> Result<AcceptInvitationResponse, ClientError> {
        self.post_empty(&format!("/v1/invitations/{}/accept", invitation_id))
            .await
    }

    pub async fn reject_invitation(
        &self,
        invitation_id: Uuid,
    ) -> Result<InvitationResponse, ClientError> {
        self.post_empty(&format!("/v1/invitations/{}/reject", invitation_id))
            .await
    }

    // LFG posts

    pub async fn create_post(
        &self,
        request: &CreatePostRequest,
    ) -> Result<PostResponse, ClientError> {
        self.post("/v1/lfg", request).await
    }

    pub async fn list_posts(
        &self,
        query: &ListPostsQuery,
    ) -> Result<Vec<PostResponse>, ClientError> {
        self.send(self.request(Method::GET, "/v1/lfg").query(query))
            .await
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<PostResponse, ClientError> {
        self.get(&format!("/v1/lfg/{}", post_id)).await
    }

    pub async fn close_post(&self, post_id: Uuid) -> Result<PostResponse, ClientError> {
        self.post_empty(&format!("/v1/lfg/{}/close", post_id))
            .await
    }
}
