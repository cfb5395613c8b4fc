//! Route definitions for Teams domain API

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers::{invitations, join_requests, members, teams};
use super::middleware::TeamsState;

/// Create team management routes
fn team_routes() -> Router<TeamsState> {
    Router::new()
        .route("/v1/teams", get(teams::list_teams).post(teams::create_team))
        .route(
            "/v1/teams/{team_id}",
            get(teams::get_team)
                .patch(teams::update_team)
                .delete(teams::delete_team),
        )
        .route("/v1/teams/{team_id}/close", post(teams::close_team))
        .route("/v1/teams/{team_id}/reopen", post(teams::reopen_team))
        .route("/v1/me/teams", get(teams::list_my_teams))
}

/// Create team member routes
fn member_routes() -> Router<TeamsState> {
    Router::new()
        .route("/v1/teams/{team_id}/members", get(members::list_members))
        .route(
            "/v1/teams/{team_id}/members/{user_id}",
            delete(members::remove_member),
        )
        .route("/v1/teams/{team_id}/leave", post(members::leave_team))
        .route(
            "/v1/teams/{team_id}/leader",
            post(members::transfer_leadership),
        )
}

/// Create join request routes
fn join_request_routes() -> Router<TeamsState> {
    Router::new()
        .route(
            "/v1/teams/{team_id}/join-requests",
            get(join_requests::list_team_join_requests).post(join_requests::create_join_request),
        )
        .route(
            "/v1/me/join-requests",
            get(join_requests::list_my_join_requests),
        )
        .route(
            "/v1/join-requests/{request_id}/accept",
            post(join_requests::accept_join_request),
        )
        .route(
            "/v1/join-requests/{request_id}/reject",
            post(join_requests::reject_join_request),
        )
        .route(
            "/v1/join-requests/{request_id}/cancel",
            post(join_requests::cancel_join_request),
        )
}

/// Create invitation routes
fn invitation_routes() -> Router<TeamsState> {
    Router::new()
        .route(
            "/v1/teams/{team_id}/invitations",
            get(invitations::list_team_invitations).post(invitations::create_invitation),
        )
        .route("/v1/me/invitations", get(invitations::list_my_invitations))
        .route(
            "/v1/invitations/{invitation_id}/accept",
            post(invitations::accept_invitation),
        )
        .route(
            "/v1/invitations/{invitation_id}/reject",
            post(invitations::reject_invitation),
        )
}

/// Create all Teams domain routes
pub fn routes() -> Router<TeamsState> {
    Router::new()
        .merge(team_routes())
        .merge(member_routes())
        .merge(join_request_routes())
        .merge(invitation_routes())
}
