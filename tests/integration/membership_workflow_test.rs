//! Team membership workflow integration tests
//!
//! Drives the composed application through complete join request,
//! invitation and membership lifecycles.

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use crate::common::{id_of, TestApp};

#[tokio::test]
async fn test_join_request_lifecycle_until_team_is_full() {
    let app = TestApp::new();
    let leader = Uuid::new_v4();
    let team_id = app.create_team(leader, "Async Avengers", 3).await;

    // Two applicants fill the remaining slots
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let alice_request = app.request_to_join(team_id, alice).await;
    let bob_request = app.request_to_join(team_id, bob).await;

    let (_, pending) = app
        .get(
            &format!("/v1/teams/{team_id}/join-requests?status=pending"),
            leader,
        )
        .await;
    assert_eq!(pending.as_array().unwrap().len(), 2);

    let (status, body) = app.accept_request(alice_request, leader).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["request"]["status"], "accepted");
    assert_eq!(body["team"]["status"], "recruiting");

    let (status, body) = app.accept_request(bob_request, leader).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["team"]["status"], "full");

    // Full teams stop taking applications
    let (status, body) = app
        .post(
            &format!("/v1/teams/{team_id}/join-requests"),
            Uuid::new_v4(),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (_, detail) = app.get(&format!("/v1/teams/{team_id}"), alice).await;
    assert_eq!(detail["member_count"], 3);
    let members = detail["members"].as_array().unwrap();
    assert_eq!(members[0]["user_id"], leader.to_string());
    assert_eq!(members[0]["is_leader"], true);
    assert_eq!(members[1]["user_id"], alice.to_string());
    assert_eq!(members[2]["user_id"], bob.to_string());

    let (_, mine) = app.get("/v1/me/teams", bob).await;
    assert_eq!(mine[0]["id"], team_id.to_string());
}

#[tokio::test]
async fn test_requester_cancels_and_can_apply_again() {
    let app = TestApp::new();
    let leader = Uuid::new_v4();
    let applicant = Uuid::new_v4();
    let team_id = app.create_team(leader, "Pattern Matchers", 5).await;

    let request_id = app.request_to_join(team_id, applicant).await;

    let (status, _) = app
        .post(
            &format!("/v1/join-requests/{request_id}/cancel"),
            leader,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post(
            &format!("/v1/join-requests/{request_id}/cancel"),
            applicant,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    // A cancelled request frees the pending slot for a new application
    let second = app.request_to_join(team_id, applicant).await;
    assert_ne!(second, request_id);

    let (_, mine) = app.get("/v1/me/join-requests", applicant).await;
    assert_eq!(mine.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_invitation_lifecycle() {
    let app = TestApp::new();
    let leader = Uuid::new_v4();
    let invitee = Uuid::new_v4();
    let team_id = app.create_team(leader, "Zero Cost Crew", 4).await;

    let (status, invitation) = app
        .post(
            &format!("/v1/teams/{team_id}/invitations"),
            leader,
            Some(json!({ "invitee_id": invitee, "message": "We need a Rustacean" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{invitation}");
    let invitation_id = id_of(&invitation);

    let (_, inbox) = app.get("/v1/me/invitations", invitee).await;
    assert_eq!(inbox[0]["state"], "pending");
    assert_eq!(inbox[0]["message"], "We need a Rustacean");

    let (status, body) = app
        .post(
            &format!("/v1/invitations/{invitation_id}/accept"),
            invitee,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["invitation"]["state"], "accepted");
    assert_eq!(body["member"]["user_id"], invitee.to_string());

    // Members cannot be invited again
    let (status, _) = app
        .post(
            &format!("/v1/teams/{team_id}/invitations"),
            leader,
            Some(json!({ "invitee_id": invitee })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    assert_eq!(app.member_count(team_id, leader).await, 2);
}

#[tokio::test]
async fn test_configured_invitation_lifetime() {
    let app = TestApp::with_env(&[("INVITATION_TTL_DAYS", "2")]);
    let leader = Uuid::new_v4();
    let team_id = app.create_team(leader, "Short Notice", 4).await;

    let before = chrono::Utc::now();
    let (_, invitation) = app
        .post(
            &format!("/v1/teams/{team_id}/invitations"),
            leader,
            Some(json!({ "invitee_id": Uuid::new_v4() })),
        )
        .await;

    let expires_at: chrono::DateTime<chrono::Utc> =
        invitation["expires_at"].as_str().unwrap().parse().unwrap();
    let lifetime = expires_at - before;
    assert!(lifetime >= chrono::Duration::days(2));
    assert!(lifetime < chrono::Duration::days(2) + chrono::Duration::minutes(1));
}

#[tokio::test]
async fn test_leadership_transfer_and_leaving() {
    let app = TestApp::new();
    let leader = Uuid::new_v4();
    let team_id = app.create_team(leader, "Trait Objects", 4).await;
    let members = app.fill_with_members(team_id, leader, 1).await;
    let successor = members[0];

    // The leader cannot walk away from a team with other members
    let (status, _) = app
        .post(&format!("/v1/teams/{team_id}/leave"), leader, None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .post(
            &format!("/v1/teams/{team_id}/leader"),
            leader,
            Some(json!({ "user_id": successor })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["leader_id"], successor.to_string());

    let (status, body) = app
        .post(&format!("/v1/teams/{team_id}/leave"), leader, None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["team_deleted"], false);

    // The sole remaining leader leaving deletes the team
    let (status, body) = app
        .post(&format!("/v1/teams/{team_id}/leave"), successor, None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["team_deleted"], true);

    let (status, _) = app.get(&format!("/v1/teams/{team_id}"), successor).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_removing_a_member_reopens_a_full_team() {
    let app = TestApp::new();
    let leader = Uuid::new_v4();
    let team_id = app.create_team(leader, "Full House", 2).await;
    let members = app.fill_with_members(team_id, leader, 1).await;

    let (_, team) = app.get(&format!("/v1/teams/{team_id}"), leader).await;
    assert_eq!(team["status"], "full");

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/v1/teams/{team_id}/members/{}", members[0]),
            leader,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, team) = app.get(&format!("/v1/teams/{team_id}"), leader).await;
    assert_eq!(team["status"], "recruiting");
    assert_eq!(team["member_count"], 1);
}

#[tokio::test]
async fn test_close_reopen_and_settings() {
    let app = TestApp::new();
    let leader = Uuid::new_v4();
    let team_id = app.create_team(leader, "Unsafe Blocks", 3).await;
    app.fill_with_members(team_id, leader, 1).await;

    let (status, body) = app
        .post(&format!("/v1/teams/{team_id}/close"), leader, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "closed");

    let (status, _) = app
        .post(
            &format!("/v1/teams/{team_id}/join-requests"),
            Uuid::new_v4(),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .post(&format!("/v1/teams/{team_id}/reopen"), leader, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "recruiting");

    // Shrinking below the current head count is refused
    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/v1/teams/{team_id}"),
            leader,
            Some(json!({ "max_size": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/v1/teams/{team_id}"),
            leader,
            Some(json!({ "max_size": 2, "description": "Two is company" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "full");
    assert_eq!(body["description"], "Two is company");

    let (_, listed) = app.get("/v1/teams?status=full&q=unsafe", leader).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_lfg_post_for_a_team() {
    let app = TestApp::new();
    let leader = Uuid::new_v4();
    let team_id = app.create_team(leader, "Macro Magicians", 4).await;

    let (status, post) = app
        .post(
            "/v1/lfg",
            leader,
            Some(json!({
                "kind": "looking_for_members",
                "team_id": team_id,
                "title": "Looking for a designer",
                "skills": ["Figma", "figma", "CSS"],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{post}");
    assert_eq!(post["skills"], json!(["Figma", "CSS"]));

    let (_, found) = app
        .get("/v1/lfg?kind=looking_for_members&skill=css", Uuid::new_v4())
        .await;
    assert_eq!(found[0]["team_id"], team_id.to_string());

    let (status, _) = app
        .post("/v1/lfg", Uuid::new_v4(), Some(post_body(team_id)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deleting_a_team_removes_its_lfg_posts() {
    let app = TestApp::new();
    let leader = Uuid::new_v4();
    let team_id = app.create_team(leader, "Short Lived", 4).await;

    let (status, post) = app.post("/v1/lfg", leader, Some(post_body(team_id))).await;
    assert_eq!(status, StatusCode::CREATED, "{post}");
    let post_id = id_of(&post);

    let (status, _) = app
        .send(Method::DELETE, &format!("/v1/teams/{team_id}"), leader, None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/v1/lfg/{post_id}"), leader).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, listed) = app.get("/v1/lfg?kind=looking_for_members", leader).await;
    assert!(listed
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["id"] != post_id.to_string()));
}

fn post_body(team_id: Uuid) -> serde_json::Value {
    json!({
        "kind": "looking_for_members",
        "team_id": team_id,
        "title": "Hijacking another team",
    })
}

mod common;
