//! Identity of the caller of a request

use uuid::Uuid;

/// Identity decoded from a validated token
#[derive(Debug, Clone, PartialEq)]
pub struct AuthIdentity {
    pub id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Represents an authenticated user context
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: AuthIdentity,
}

impl AuthContext {
    pub fn new(user: AuthIdentity) -> Self {
        Self { user }
    }

    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}
