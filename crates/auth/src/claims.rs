//! JWT claims types

use serde::{Deserialize, Serialize};

/// Profile fields the identity provider copies into the token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Claims carried by a HackHub access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Email
    #[serde(default)]
    pub email: Option<String>,
    /// Issued at
    pub iat: u64,
    /// Expires at
    pub exp: u64,
    /// Audience
    #[serde(default)]
    pub aud: String,
    /// Role (authenticated user)
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}
