//! Domain entities for LFG (looking for group) posts

use chrono::{DateTime, Utc};
use hackhub_common::{Error, Result};
use hackhub_teams::validate_skills;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::state::{LfgEvent, LfgStateMachine};
pub use crate::domain::state::LfgStatus;

/// What the author is looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "lfg_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LfgKind {
    /// An individual looking for a team to join
    LookingForTeam,
    /// A team leader recruiting for their team
    LookingForMembers,
}

impl std::fmt::Display for LfgKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LfgKind::LookingForTeam => write!(f, "looking_for_team"),
            LfgKind::LookingForMembers => write!(f, "looking_for_members"),
        }
    }
}

/// LFG post entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LfgPost {
    pub id: Uuid,
    pub author_id: Uuid,
    pub kind: LfgKind,
    /// Team being recruited for; set only for `looking_for_members`
    pub team_id: Option<Uuid>,
    pub title: String,
    pub body: String,
    pub skills: Vec<String>,
    pub status: LfgStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LfgPost {
    pub fn new(
        author_id: Uuid,
        kind: LfgKind,
        team_id: Option<Uuid>,
        title: String,
        body: Option<String>,
        skills: Vec<String>,
    ) -> Result<Self> {
        let now = Utc::now();
        let post = LfgPost {
            id: Uuid::new_v4(),
            author_id,
            kind,
            team_id,
            title: title.trim().to_string(),
            body: body.unwrap_or_default(),
            skills,
            status: LfgStatus::Open,
            created_at: now,
            updated_at: now,
        };
        post.validate()?;
        Ok(post)
    }

    pub fn is_open(&self) -> bool {
        self.status == LfgStatus::Open
    }

    /// Whether the post advertises `skill` (case-insensitive)
    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s.eq_ignore_ascii_case(skill.trim()))
    }

    /// Take the post down
    pub fn close(&mut self) -> Result<()> {
        self.status = LfgStateMachine::transition(self.status, LfgEvent::Close)
            .map_err(|e| e.into_conflict("LFG post"))?;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let title_len = self.title.chars().count();
        if !(3..=120).contains(&title_len) {
            return Err(Error::Validation(
                "Title must be 3-120 characters".to_string(),
            ));
        }
        if self.body.chars().count() > 4000 {
            return Err(Error::Validation(
                "Body must be at most 4000 characters".to_string(),
            ));
        }
        validate_skills(&self.skills)?;

        match (self.kind, self.team_id) {
            (LfgKind::LookingForMembers, None) => Err(Error::Validation(
                "A looking_for_members post must name its team".to_string(),
            )),
            (LfgKind::LookingForTeam, Some(_)) => Err(Error::Validation(
                "A looking_for_team post cannot name a team".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
