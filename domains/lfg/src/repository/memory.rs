//! In-memory LFG store

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use hackhub_common::{Error, Pagination, RepositoryError, Result};
use hackhub_teams::TeamsStore;
use uuid::Uuid;

use super::{LfgFilter, LfgStore};
use crate::domain::entities::{LfgPost, LfgStatus};

/// Mutex-backed [`LfgStore`]
#[derive(Clone, Default)]
pub struct InMemoryLfgStore {
    posts: Arc<Mutex<Vec<LfgPost>>>,
    /// When set, posts of deleted teams are dropped on access
    teams: Option<Arc<dyn TeamsStore>>,
}

impl InMemoryLfgStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose team posts go away with their team, like the
    /// `ON DELETE CASCADE` on `lfg_posts.team_id`
    pub fn with_teams(teams: Arc<dyn TeamsStore>) -> Self {
        Self {
            posts: Arc::default(),
            teams: Some(teams),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<LfgPost>>> {
        self.posts
            .lock()
            .map_err(|_| Error::Internal("LFG store lock poisoned".to_string()))
    }

    async fn prune_orphans(&self) -> Result<()> {
        let Some(teams) = &self.teams else {
            return Ok(());
        };

        let team_ids: HashSet<Uuid> = self.lock()?.iter().filter_map(|p| p.team_id).collect();
        let mut gone = HashSet::new();
        for team_id in team_ids {
            if teams.get_team(team_id).await?.is_none() {
                gone.insert(team_id);
            }
        }

        if !gone.is_empty() {
            tracing::debug!(teams = gone.len(), "Dropping LFG posts of deleted teams");
            self.lock()?
                .retain(|p| p.team_id.map_or(true, |id| !gone.contains(&id)));
        }
        Ok(())
    }
}

#[async_trait]
impl LfgStore for InMemoryLfgStore {
    async fn create_post(&self, post: &LfgPost) -> Result<LfgPost> {
        let mut posts = self.lock()?;
        if posts.iter().any(|p| p.id == post.id) {
            return Err(RepositoryError::AlreadyExists.into());
        }
        posts.push(post.clone());
        Ok(post.clone())
    }

    async fn get_post(&self, post_id: Uuid) -> Result<Option<LfgPost>> {
        self.prune_orphans().await?;
        Ok(self.lock()?.iter().find(|p| p.id == post_id).cloned())
    }

    async fn list_posts(&self, filter: &LfgFilter, page: Pagination) -> Result<Vec<LfgPost>> {
        self.prune_orphans().await?;
        let posts = self.lock()?;
        let mut matching: Vec<LfgPost> = posts
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page.window(matching))
    }

    async fn close_post(&self, post: &LfgPost) -> Result<LfgPost> {
        self.prune_orphans().await?;
        let mut posts = self.lock()?;
        let stored = posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or_else(|| Error::NotFound("LFG post not found".to_string()))?;
        if stored.status != LfgStatus::Open {
            return Err(
                RepositoryError::Precondition("LFG post is already closed".to_string()).into(),
            );
        }
        stored.status = post.status;
        stored.updated_at = post.updated_at;
        Ok(stored.clone())
    }
}
