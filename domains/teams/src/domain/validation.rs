//! Validation helpers and constants for team entities and API handlers

use hackhub_common::{Error, Result};
use regex::Regex;

/// Upper bound on team size
pub const MAX_TEAM_SIZE: i32 = 20;

/// Maximum number of skills attached to a join request or LFG post
pub const MAX_SKILLS: usize = 20;

/// Maximum length of a single skill tag
pub const MAX_SKILL_LEN: usize = 50;

/// Maximum length of a member's role label
pub const MAX_ROLE_LEN: usize = 50;

/// Maximum length of join request and invitation messages
pub const MAX_MESSAGE_LEN: usize = 1000;

lazy_static::lazy_static! {
    /// Skill tag validation regex
    /// Printable text without control characters, no leading/trailing space
    pub static ref SKILL_REGEX: Regex =
        Regex::new(r"^[^\s\p{Cc}](?:[^\p{Cc}]*[^\s\p{Cc}])?$").unwrap();
}

/// Validate a single skill tag
pub fn validate_skill(skill: &str) -> bool {
    let len = skill.chars().count();
    (1..=MAX_SKILL_LEN).contains(&len) && SKILL_REGEX.is_match(skill)
}

/// Validate a list of skill tags
pub fn validate_skills(skills: &[String]) -> Result<()> {
    if skills.len() > MAX_SKILLS {
        return Err(Error::Validation(format!(
            "At most {} skills are allowed",
            MAX_SKILLS
        )));
    }
    if let Some(bad) = skills.iter().find(|s| !validate_skill(s)) {
        return Err(Error::Validation(format!(
            "Invalid skill '{}': must be 1-{} characters without leading or trailing spaces",
            bad, MAX_SKILL_LEN
        )));
    }
    Ok(())
}

/// Validate a free-form member role label such as "Frontend"
pub fn validate_role_label(role: &str) -> Result<()> {
    if role.chars().count() > MAX_ROLE_LEN {
        return Err(Error::Validation(format!(
            "Role must be at most {} characters",
            MAX_ROLE_LEN
        )));
    }
    Ok(())
}

/// Validate a request or invitation message
pub fn validate_message(message: &str) -> Result<()> {
    if message.chars().count() > MAX_MESSAGE_LEN {
        return Err(Error::Validation(format!(
            "Message must be at most {} characters",
            MAX_MESSAGE_LEN
        )));
    }
    Ok(())
}

/// Trim and drop empty tags, keeping first occurrence order
pub fn normalize_skills(skills: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(skills.len());
    for skill in skills {
        let trimmed = skill.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !seen.iter().any(|s| s.eq_ignore_ascii_case(trimmed)) {
            seen.push(trimmed.to_string());
        }
    }
    seen
}
