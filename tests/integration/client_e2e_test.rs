//! End-to-end tests for the typed API client against a live server

use hackhub_client::{
    ClientError, CreateInvitationRequest, CreateJoinRequest, CreatePostRequest,
    CreateTeamRequest, HackhubClient, InvitationState, JoinRequestStatus, LfgKind,
    ListPostsQuery, ListTeamsQuery, TeamStatus,
};
use uuid::Uuid;

use crate::common::spawn_server;

#[tokio::test]
async fn test_client_drives_join_and_invite_flows() {
    let (base_url, app) = spawn_server().await.unwrap();
    let leader_id = Uuid::new_v4();
    let applicant_id = Uuid::new_v4();
    let invitee_id = Uuid::new_v4();

    let leader = HackhubClient::new(&base_url).with_token(app.token(leader_id));
    let applicant = HackhubClient::new(&base_url).with_token(app.token(applicant_id));
    let invitee = HackhubClient::new(&base_url).with_token(app.token(invitee_id));

    let team = leader
        .create_team(&CreateTeamRequest {
            name: "Borrowed Time".to_string(),
            description: Some("Weekend hack".to_string()),
            max_size: 3,
        })
        .await
        .unwrap();
    let team_id = team.team.id;
    assert_eq!(team.member_count, 1);

    let request = applicant
        .request_to_join(
            team_id,
            &CreateJoinRequest {
                message: Some("I write parsers".to_string()),
                skills: vec!["Rust".to_string(), "nom".to_string()],
            },
        )
        .await
        .unwrap();
    assert_eq!(request.status, JoinRequestStatus::Pending);

    let pending = leader
        .list_team_join_requests(team_id, Some(JoinRequestStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);

    let accepted = leader
        .accept_join_request(request.id, Some("Parser wrangler".to_string()))
        .await
        .unwrap();
    assert_eq!(accepted.member.role, "Parser wrangler");
    assert_eq!(accepted.team.status, TeamStatus::Recruiting);

    let invitation = leader
        .invite(
            team_id,
            &CreateInvitationRequest {
                invitee_id,
                message: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(invitation.state, InvitationState::Pending);

    let inbox = invitee.my_invitations().await.unwrap();
    assert_eq!(inbox.len(), 1);

    let joined = invitee.accept_invitation(invitation.id).await.unwrap();
    assert_eq!(joined.team.status, TeamStatus::Full);

    let detail = applicant.get_team(team_id).await.unwrap();
    assert_eq!(detail.member_count, 3);

    let full = leader
        .list_teams(&ListTeamsQuery {
            status: Some(TeamStatus::Full),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(full.iter().any(|t| t.id == team_id));
}

#[tokio::test]
async fn test_client_surfaces_user_facing_errors() {
    let (base_url, app) = spawn_server().await.unwrap();
    let leader_id = Uuid::new_v4();
    let outsider_id = Uuid::new_v4();

    let leader = HackhubClient::new(&base_url).with_token(app.token(leader_id));
    let outsider = HackhubClient::new(&base_url).with_token(app.token(outsider_id));

    let team = leader
        .create_team(&CreateTeamRequest {
            name: "Gatekeepers".to_string(),
            description: None,
            max_size: 2,
        })
        .await
        .unwrap();

    let err = outsider.close_team(team.team.id).await.unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert_eq!(err.user_message(), "Only the team leader can close the team");

    let err = outsider.get_team(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.user_message(), "Team not found");

    let anonymous = HackhubClient::new(&base_url);
    let err = anonymous.my_teams().await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(matches!(err, ClientError::Api { .. }));
}

#[tokio::test]
async fn test_client_lfg_posts() {
    let (base_url, app) = spawn_server().await.unwrap();
    let author_id = Uuid::new_v4();
    let author = HackhubClient::new(&base_url).with_token(app.token(author_id));

    let post = author
        .create_post(&CreatePostRequest {
            kind: LfgKind::LookingForTeam,
            team_id: None,
            title: "Embedded dev looking for a team".to_string(),
            body: Some("Comfortable with no_std".to_string()),
            skills: vec!["Rust".to_string(), "Embedded".to_string()],
        })
        .await
        .unwrap();

    let found = author
        .list_posts(&ListPostsQuery {
            skill: Some("embedded".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, post.id);

    author.close_post(post.id).await.unwrap();
    let err = author.close_post(post.id).await.unwrap_err();
    assert!(err.is_conflict());
}

mod common;
