//! Concrete authentication backend
//!
//! Validates bearer tokens and turns their claims into an `AuthContext`.
//! Profiles live with the identity provider, so no database lookup happens here.

use uuid::Uuid;

use crate::config::AuthConfig;
use crate::context::{AuthContext, AuthIdentity};
use crate::error::AuthError;
use crate::jwt::validate_jwt_token;

/// Concrete authentication backend.
///
/// Domain states expose this via `FromRef`:
/// ```ignore
/// impl FromRef<MyDomainState> for AuthBackend {
///     fn from_ref(state: &MyDomainState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone, Debug)]
pub struct AuthBackend {
    config: AuthConfig,
}

impl AuthBackend {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Validate a JWT and build the caller's context from its claims.
    pub async fn authenticate_jwt(&self, token: &str) -> Result<AuthContext, AuthError> {
        let claims = validate_jwt_token(token, &self.config)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
            tracing::debug!(sub = %claims.sub, "JWT subject is not a UUID");
            AuthError::InvalidUserId
        })?;

        Ok(AuthContext::new(AuthIdentity {
            id: user_id,
            email: claims.email,
            name: claims.user_metadata.full_name,
        }))
    }
}
