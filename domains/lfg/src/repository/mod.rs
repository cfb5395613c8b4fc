//! Store abstraction for LFG posts

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use hackhub_common::{Pagination, Result};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::entities::{LfgKind, LfgPost};

pub use memory::InMemoryLfgStore;
pub use postgres::PgLfgStore;

/// Filters for browsing posts
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LfgFilter {
    pub kind: Option<LfgKind>,
    /// Only posts advertising this skill (case-insensitive)
    pub skill: Option<String>,
    /// Closed posts are hidden unless set
    #[serde(default)]
    pub include_closed: bool,
}

impl LfgFilter {
    pub(crate) fn matches(&self, post: &LfgPost) -> bool {
        if !self.include_closed && !post.is_open() {
            return false;
        }
        if self.kind.is_some_and(|k| k != post.kind) {
            return false;
        }
        match self.skill_term() {
            Some(skill) => post.has_skill(&skill),
            None => true,
        }
    }

    pub(crate) fn skill_term(&self) -> Option<String> {
        self.skill
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Persistence for LFG posts
#[async_trait]
pub trait LfgStore: Send + Sync {
    async fn create_post(&self, post: &LfgPost) -> Result<LfgPost>;

    async fn get_post(&self, post_id: Uuid) -> Result<Option<LfgPost>>;

    /// Posts matching `filter`, newest first
    async fn list_posts(&self, filter: &LfgFilter, page: Pagination) -> Result<Vec<LfgPost>>;

    /// Persist a close; fails if the post was already closed
    async fn close_post(&self, post: &LfgPost) -> Result<LfgPost>;
}
