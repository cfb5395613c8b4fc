//! Authentication middleware for the HackHub API
//!
//! Provides JWT validation and axum extractors that work with any domain
//! state implementing `FromRef<S>` for `AuthBackend`.

mod backend;
mod claims;
mod config;
mod context;
mod error;
mod extractors;
mod jwt;

pub use backend::AuthBackend;
pub use claims::{TokenClaims, UserMetadata};
pub use config::AuthConfig;
pub use context::{AuthContext, AuthIdentity};
pub use error::AuthError;
pub use extractors::AuthUser;

#[cfg(any(test, feature = "test-support"))]
pub use jwt::issue_token;
