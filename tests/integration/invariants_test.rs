//! Business invariant validation tests
//!
//! Capacity, terminal resolution and concurrent acceptance checked against
//! the composed application.

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::common::{id_of, TestApp};

mod capacity {
    use super::*;

    #[tokio::test]
    async fn test_team_of_four_rejects_fifth_member() {
        let app = TestApp::new();
        let leader = Uuid::new_v4();
        let team_id = app.create_team(leader, "Fearless Four", 4).await;

        // Collect the late request before the team fills up
        let latecomer = Uuid::new_v4();
        let late_request = app.request_to_join(team_id, latecomer).await;
        app.fill_with_members(team_id, leader, 2).await;
        let invitee = Uuid::new_v4();
        let (_, invitation) = app
            .post(
                &format!("/v1/teams/{team_id}/invitations"),
                leader,
                Some(json!({ "invitee_id": invitee })),
            )
            .await;
        app.fill_with_members(team_id, leader, 1).await;
        assert_eq!(app.member_count(team_id, leader).await, 4);

        let (status, body) = app.accept_request(late_request, leader).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["message"], "Team is full");

        let (status, _) = app
            .post(
                &format!("/v1/invitations/{}/accept", id_of(&invitation)),
                invitee,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        // The failed accepts leave both offers pending
        let (_, requests) = app
            .get(
                &format!("/v1/teams/{team_id}/join-requests?status=pending"),
                leader,
            )
            .await;
        assert_eq!(requests[0]["id"], late_request.to_string());
        assert_eq!(app.member_count(team_id, leader).await, 4);
    }

    #[tokio::test]
    async fn test_single_seat_team_starts_full() {
        let app = TestApp::new();
        let leader = Uuid::new_v4();
        let team_id = app.create_team(leader, "Solo Act", 1).await;

        let (_, team) = app.get(&format!("/v1/teams/{team_id}"), leader).await;
        assert_eq!(team["status"], "full");
    }
}

mod terminal_states {
    use super::*;

    #[tokio::test]
    async fn test_resolved_join_request_never_transitions_again() {
        let app = TestApp::new();
        let leader = Uuid::new_v4();
        let applicant = Uuid::new_v4();
        let team_id = app.create_team(leader, "Once Only", 4).await;
        let request_id = app.request_to_join(team_id, applicant).await;

        let (status, _) = app
            .post(
                &format!("/v1/join-requests/{request_id}/reject"),
                leader,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        for action in ["accept", "reject"] {
            let (status, _) = app
                .post(
                    &format!("/v1/join-requests/{request_id}/{action}"),
                    leader,
                    None,
                )
                .await;
            assert_eq!(status, StatusCode::CONFLICT, "{action}");
        }
        let (status, _) = app
            .post(
                &format!("/v1/join-requests/{request_id}/cancel"),
                applicant,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, mine) = app.get("/v1/me/join-requests", applicant).await;
        assert_eq!(mine[0]["status"], "rejected");
        assert!(mine[0]["resolved_at"].is_string());
    }

    #[tokio::test]
    async fn test_accepted_invitation_cannot_be_rejected() {
        let app = TestApp::new();
        let leader = Uuid::new_v4();
        let invitee = Uuid::new_v4();
        let team_id = app.create_team(leader, "No Take Backs", 4).await;

        let (_, invitation) = app
            .post(
                &format!("/v1/teams/{team_id}/invitations"),
                leader,
                Some(json!({ "invitee_id": invitee })),
            )
            .await;
        let invitation_id = id_of(&invitation);

        let (status, _) = app
            .post(
                &format!("/v1/invitations/{invitation_id}/accept"),
                invitee,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .post(
                &format!("/v1/invitations/{invitation_id}/reject"),
                invitee,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}

mod concurrency {
    use super::*;

    #[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
    async fn test_concurrent_accepts_for_last_slot() {
        let app = Arc::new(TestApp::new());
        let leader = Uuid::new_v4();
        let team_id = app.create_team(leader, "Race Condition", 3).await;
        app.fill_with_members(team_id, leader, 1).await;

        let mut request_ids = Vec::new();
        for _ in 0..4 {
            request_ids.push(app.request_to_join(team_id, Uuid::new_v4()).await);
        }

        let handles: Vec<_> = request_ids
            .into_iter()
            .map(|request_id| {
                let app = Arc::clone(&app);
                tokio::spawn(async move { app.accept_request(request_id, leader).await.0 })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                StatusCode::OK => accepted += 1,
                StatusCode::CONFLICT => {}
                other => panic!("unexpected status {other}"),
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(app.member_count(team_id, leader).await, 3);

        let (_, team) = app.get(&format!("/v1/teams/{team_id}"), leader).await;
        assert_eq!(team["status"], "full");
    }
}

mod common;
