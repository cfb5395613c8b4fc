//! LFG post API handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use hackhub_common::{Error, Pagination, Result, ValidatedJson};
use hackhub_teams::normalize_skills;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::middleware::{AuthUser, LfgState};
use crate::domain::entities::{LfgKind, LfgPost, LfgStatus};
use crate::repository::LfgFilter;

/// Request for publishing a post
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePostRequest {
    pub kind: LfgKind,

    /// Required for `looking_for_members`; the caller must lead this team
    pub team_id: Option<Uuid>,

    #[validate(length(min = 3, max = 120))]
    pub title: String,

    #[validate(length(max = 4000))]
    pub body: Option<String>,

    #[serde(default)]
    pub skills: Vec<String>,
}

/// Query parameters for `GET /v1/lfg`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPostsQuery {
    pub kind: Option<LfgKind>,
    pub skill: Option<String>,
    #[serde(default)]
    pub include_closed: bool,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// LFG post response
#[derive(Debug, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub kind: LfgKind,
    pub team_id: Option<Uuid>,
    pub title: String,
    pub body: String,
    pub skills: Vec<String>,
    pub status: LfgStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LfgPost> for PostResponse {
    fn from(post: LfgPost) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            kind: post.kind,
            team_id: post.team_id,
            title: post.title,
            body: post.body,
            skills: post.skills,
            status: post.status,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

async fn load_post(state: &LfgState, post_id: Uuid) -> Result<LfgPost> {
    state
        .store
        .get_post(post_id)
        .await?
        .ok_or_else(|| Error::NotFound("LFG post not found".to_string()))
}

/// Publish a post
///
/// **POST /v1/lfg**
pub async fn create_post(
    AuthUser(auth): AuthUser,
    State(state): State<LfgState>,
    ValidatedJson(request): ValidatedJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>)> {
    let post = LfgPost::new(
        auth.user_id(),
        request.kind,
        request.team_id,
        request.title,
        request.body,
        normalize_skills(request.skills),
    )?;

    if let Some(team_id) = post.team_id {
        let team = state
            .teams
            .get_team(team_id)
            .await?
            .ok_or_else(|| Error::NotFound("Team not found".to_string()))?;
        if !team.is_leader(auth.user_id()) {
            return Err(Error::Authorization(
                "Only the team leader can recruit for the team".to_string(),
            ));
        }
    }

    let created = state.store.create_post(&post).await?;

    tracing::info!(
        post_id = %created.id,
        author_id = %created.author_id,
        kind = %created.kind,
        "LFG post created"
    );

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Browse posts
///
/// **GET /v1/lfg?kind=&skill=&include_closed=&offset=&limit=**
pub async fn list_posts(
    AuthUser(_auth): AuthUser,
    State(state): State<LfgState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<Vec<PostResponse>>> {
    let filter = LfgFilter {
        kind: query.kind,
        skill: query.skill,
        include_closed: query.include_closed,
    };
    let page = Pagination {
        offset: query.offset,
        limit: query.limit,
    };

    let posts = state.store.list_posts(&filter, page).await?;
    Ok(Json(posts.into_iter().map(Into::into).collect()))
}

/// **GET /v1/lfg/{post_id}**
pub async fn get_post(
    AuthUser(_auth): AuthUser,
    State(state): State<LfgState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<PostResponse>> {
    Ok(Json(load_post(&state, post_id).await?.into()))
}

/// Close a post
///
/// **POST /v1/lfg/{post_id}/close**
pub async fn close_post(
    AuthUser(auth): AuthUser,
    State(state): State<LfgState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<PostResponse>> {
    let mut post = load_post(&state, post_id).await?;
    if post.author_id != auth.user_id() {
        return Err(Error::Authorization(
            "Only the author can close this post".to_string(),
        ));
    }

    post.close()?;
    let closed = state.store.close_post(&post).await?;

    tracing::info!(post_id = %post_id, "LFG post closed");
    Ok(Json(closed.into()))
}
