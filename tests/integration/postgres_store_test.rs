//! PostgreSQL store integration tests
//!
//! Exercise the transactional paths of the Postgres stores against a real
//! database. Run with `TEST_DATABASE_URL` pointing at a disposable database:
//!
//! ```text
//! cargo test -p hackhub-integration-tests --test postgres_store_test -- --ignored
//! ```

use chrono::{Duration, Utc};
use hackhub_common::Error;
use hackhub_teams::{
    Invitation, InvitationState, JoinRequest, JoinRequestStatus, Member, MemberRemoval,
    PgTeamsStore, Team, TeamChange, TeamStatus, TeamsStore,
};
use uuid::Uuid;

use crate::common::test_pool;

/// Name that cannot collide with rows left by earlier runs
fn unique_name(prefix: &str) -> String {
    format!("{} {}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

async fn teams_store() -> PgTeamsStore {
    PgTeamsStore::new(test_pool().await.expect("test database"))
}

async fn seeded_team(store: &PgTeamsStore, max_size: i32) -> Team {
    let team = Team::new(Uuid::new_v4(), unique_name("Pg Team"), None, max_size).unwrap();
    store
        .create_team(&team, &Member::leader(&team))
        .await
        .unwrap()
}

async fn apply(store: &PgTeamsStore, team: &Team) -> JoinRequest {
    let request = JoinRequest::new(team.id, Uuid::new_v4(), None, vec![]).unwrap();
    store.create_join_request(&request).await.unwrap()
}

fn invitation_for(team: &Team, invitee: Uuid) -> Invitation {
    Invitation::new(team.id, team.leader_id, invitee, None, Duration::days(7)).unwrap()
}

mod teams_store {
    use super::*;

    #[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
    #[ignore] // Requires database setup
    async fn test_concurrent_accepts_for_last_slot() {
        let store = teams_store().await;
        let team = seeded_team(&store, 3).await;
        let first = apply(&store, &team).await;
        store.accept_join_request(first.id, None).await.unwrap();

        let mut request_ids = Vec::new();
        for _ in 0..4 {
            request_ids.push(apply(&store, &team).await.id);
        }

        let handles: Vec<_> = request_ids
            .into_iter()
            .map(|request_id| {
                let store = store.clone();
                tokio::spawn(async move { store.accept_join_request(request_id, None).await })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(admission) => {
                    assert_eq!(admission.team.status, TeamStatus::Full);
                    accepted += 1;
                }
                Err(Error::Conflict(message)) => assert_eq!(message, "Team is full"),
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(store.list_members(team.id).await.unwrap().len(), 3);
        let pending = store
            .list_join_requests_for_team(team.id, Some(JoinRequestStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 3);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_one_pending_request_and_invitation_per_user() {
        let store = teams_store().await;
        let team = seeded_team(&store, 4).await;
        let request = apply(&store, &team).await;

        let duplicate = JoinRequest::new(team.id, request.requester_id, None, vec![]).unwrap();
        assert!(matches!(
            store.create_join_request(&duplicate).await,
            Err(Error::Conflict(_))
        ));

        let mut cancelled = request.clone();
        cancelled.cancel().unwrap();
        store.resolve_join_request(&cancelled).await.unwrap();
        assert!(store.create_join_request(&duplicate).await.is_ok());

        let invitee = Uuid::new_v4();
        store
            .create_invitation(&invitation_for(&team, invitee))
            .await
            .unwrap();
        assert!(matches!(
            store.create_invitation(&invitation_for(&team, invitee)).await,
            Err(Error::Conflict(_))
        ));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_reinvite_after_expiry() {
        let store = teams_store().await;
        let team = seeded_team(&store, 4).await;
        let invitee = Uuid::new_v4();

        let mut stale = invitation_for(&team, invitee);
        stale.expires_at = Utc::now() - Duration::minutes(1);
        store.create_invitation(&stale).await.unwrap();

        let fresh = store
            .create_invitation(&invitation_for(&team, invitee))
            .await
            .unwrap();
        assert_eq!(fresh.state(), InvitationState::Pending);

        let stored = store.get_invitation(stale.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InvitationState::Expired);
        assert!(matches!(
            store.accept_invitation(stale.id).await,
            Err(Error::Conflict(_))
        ));

        let admission = store.accept_invitation(fresh.id).await.unwrap();
        assert_eq!(admission.member.user_id, invitee);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_joining_settles_other_pending_offers() {
        let store = teams_store().await;
        let team = seeded_team(&store, 4).await;
        let request = apply(&store, &team).await;
        let user = request.requester_id;
        let invitation = store
            .create_invitation(&invitation_for(&team, user))
            .await
            .unwrap();

        store.accept_join_request(request.id, None).await.unwrap();
        let settled = store.get_invitation(invitation.id).await.unwrap().unwrap();
        assert_eq!(settled.status, InvitationState::Expired);

        store.remove_member(team.id, user).await.unwrap();
        assert!(matches!(
            store.accept_invitation(invitation.id).await,
            Err(Error::Conflict(_))
        ));
        assert_eq!(store.list_members(team.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_settings_close_and_reopen() {
        let store = teams_store().await;
        let team = seeded_team(&store, 3).await;
        let request = apply(&store, &team).await;
        store.accept_join_request(request.id, None).await.unwrap();

        let shrink = |max_size| TeamChange::Details {
            name: None,
            description: None,
            max_size: Some(max_size),
        };
        assert!(matches!(
            store.update_team(team.id, shrink(1)).await,
            Err(Error::Conflict(_))
        ));
        let updated = store.update_team(team.id, shrink(2)).await.unwrap();
        assert_eq!(updated.status, TeamStatus::Full);

        let closed = store.update_team(team.id, TeamChange::Close).await.unwrap();
        assert_eq!(closed.status, TeamStatus::Closed);
        let late = JoinRequest::new(team.id, Uuid::new_v4(), None, vec![]).unwrap();
        assert!(matches!(
            store.create_join_request(&late).await,
            Err(Error::Conflict(_))
        ));

        let reopened = store.update_team(team.id, TeamChange::Reopen).await.unwrap();
        assert_eq!(reopened.status, TeamStatus::Full);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_transfer_then_leave_until_deleted() {
        let store = teams_store().await;
        let team = seeded_team(&store, 4).await;
        let request = apply(&store, &team).await;
        let successor = request.requester_id;
        store.accept_join_request(request.id, None).await.unwrap();

        assert!(matches!(
            store.remove_member(team.id, team.leader_id).await,
            Err(Error::Conflict(_))
        ));

        let transferred = store.transfer_leadership(team.id, successor).await.unwrap();
        assert_eq!(transferred.leader_id, successor);

        let removal = store.remove_member(team.id, team.leader_id).await.unwrap();
        assert!(
            matches!(removal, MemberRemoval::Removed(ref t) if t.status == TeamStatus::Recruiting)
        );

        let removal = store.remove_member(team.id, successor).await.unwrap();
        assert_eq!(removal, MemberRemoval::TeamDeleted);
        assert!(store.get_team(team.id).await.unwrap().is_none());
        assert!(store.get_join_request(request.id).await.unwrap().is_none());
    }
}

mod lfg_store {
    use super::*;
    use hackhub_common::Pagination;
    use hackhub_lfg::{LfgFilter, LfgKind, LfgPost, LfgStore, PgLfgStore};

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_skill_filter_close_and_team_cascade() {
        let pool = test_pool().await.unwrap();
        let teams = PgTeamsStore::new(pool.clone());
        let store = PgLfgStore::new(pool);
        let team = seeded_team(&teams, 4).await;
        let skill = format!("zig{}", &Uuid::new_v4().simple().to_string()[..12]);

        let recruiting = LfgPost::new(
            team.leader_id,
            LfgKind::LookingForMembers,
            Some(team.id),
            "Recruiting a systems dev".to_string(),
            None,
            vec![skill.to_uppercase()],
        )
        .unwrap();
        store.create_post(&recruiting).await.unwrap();
        let solo = LfgPost::new(
            Uuid::new_v4(),
            LfgKind::LookingForTeam,
            None,
            "Systems dev looking for a team".to_string(),
            None,
            vec![skill.clone(), "Rust".to_string()],
        )
        .unwrap();
        store.create_post(&solo).await.unwrap();

        let by_skill = LfgFilter {
            skill: Some(skill.clone()),
            ..Default::default()
        };
        let found = store
            .list_posts(&by_skill, Pagination::default())
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, solo.id);

        let members_only = LfgFilter {
            kind: Some(LfgKind::LookingForMembers),
            ..by_skill.clone()
        };
        let found = store
            .list_posts(&members_only, Pagination::default())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, recruiting.id);

        let mut closed = solo.clone();
        closed.close().unwrap();
        store.close_post(&closed).await.unwrap();
        assert!(matches!(
            store.close_post(&closed).await,
            Err(Error::Conflict(_))
        ));
        let open = store
            .list_posts(&by_skill, Pagination::default())
            .await
            .unwrap();
        assert_eq!(open.len(), 1);
        let everything = LfgFilter {
            include_closed: true,
            ..by_skill.clone()
        };
        assert_eq!(
            store
                .list_posts(&everything, Pagination::default())
                .await
                .unwrap()
                .len(),
            2
        );

        teams.delete_team(team.id).await.unwrap();
        assert!(store.get_post(recruiting.id).await.unwrap().is_none());
    }
}

mod http {
    use super::*;
    use axum::http::StatusCode;
    use hackhub_app::Stores;

    use crate::common::TestApp;

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_membership_workflow_over_postgres() {
        let pool = test_pool().await.unwrap();
        let app = TestApp::with_stores(Stores::postgres(pool));
        let leader = Uuid::new_v4();
        let team_id = app
            .create_team(leader, &unique_name("Pg Workflow"), 2)
            .await;

        let members = app.fill_with_members(team_id, leader, 1).await;
        let (status, team) = app.get(&format!("/v1/teams/{team_id}"), members[0]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(team["status"], "full");
        assert_eq!(team["member_count"], 2);
        assert_eq!(team["members"][0]["is_leader"], true);

        let (status, _) = app
            .post(&format!("/v1/teams/{team_id}/leave"), leader, None)
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app
            .post(&format!("/v1/teams/{team_id}/leave"), members[0], None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let (_, team) = app.get(&format!("/v1/teams/{team_id}"), leader).await;
        assert_eq!(team["status"], "recruiting");
    }
}

mod common;
