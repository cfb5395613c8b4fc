//! PostgreSQL LFG store

use async_trait::async_trait;
use hackhub_common::{Error, Pagination, RepositoryError, Result};
use sqlx::PgPool;
use uuid::Uuid;

use super::{LfgFilter, LfgStore};
use crate::domain::entities::LfgPost;

const POST_COLUMNS: &str =
    "id, author_id, kind, team_id, title, body, skills, status, created_at, updated_at";

#[derive(Clone)]
pub struct PgLfgStore {
    pool: PgPool,
}

impl PgLfgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LfgStore for PgLfgStore {
    async fn create_post(&self, post: &LfgPost) -> Result<LfgPost> {
        let created = sqlx::query_as::<_, LfgPost>(&format!(
            r#"
            INSERT INTO lfg_posts ({POST_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(post.id)
        .bind(post.author_id)
        .bind(post.kind)
        .bind(post.team_id)
        .bind(&post.title)
        .bind(&post.body)
        .bind(&post.skills)
        .bind(post.status)
        .bind(post.created_at)
        .bind(post.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get_post(&self, post_id: Uuid) -> Result<Option<LfgPost>> {
        let post = sqlx::query_as::<_, LfgPost>(&format!(
            "SELECT {POST_COLUMNS} FROM lfg_posts WHERE id = $1"
        ))
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn list_posts(&self, filter: &LfgFilter, page: Pagination) -> Result<Vec<LfgPost>> {
        let posts = sqlx::query_as::<_, LfgPost>(&format!(
            r#"
            SELECT {POST_COLUMNS} FROM lfg_posts
            WHERE ($1 OR status = 'open')
              AND ($2::lfg_kind IS NULL OR kind = $2)
              AND ($3::text IS NULL OR EXISTS (
                    SELECT 1 FROM unnest(skills) AS s WHERE lower(s) = lower($3)
                  ))
            ORDER BY created_at DESC
            OFFSET $4 LIMIT $5
            "#
        ))
        .bind(filter.include_closed)
        .bind(filter.kind)
        .bind(filter.skill_term())
        .bind(page.offset())
        .bind(page.limit())
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn close_post(&self, post: &LfgPost) -> Result<LfgPost> {
        let closed = sqlx::query_as::<_, LfgPost>(&format!(
            r#"
            UPDATE lfg_posts SET status = $2, updated_at = $3
            WHERE id = $1 AND status = 'open'
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(post.id)
        .bind(post.status)
        .bind(post.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(closed) = closed {
            return Ok(closed);
        }
        match self.get_post(post.id).await? {
            Some(_) => Err(
                RepositoryError::Precondition("LFG post is already closed".to_string()).into(),
            ),
            None => Err(Error::NotFound("LFG post not found".to_string())),
        }
    }
}
