//! Teams domain: teams, members, join requests, invitations

pub mod api;
pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::*;
pub use domain::state::{
    AdmissionGuard, InvitationEvent, InvitationGuardContext, InvitationStateMachine,
    JoinRequestEvent, JoinRequestStateMachine, TeamEvent, TeamGuardContext, TeamStateMachine,
};
pub use domain::validation::{normalize_skills, validate_skills, MAX_SKILLS};

// Re-export repository types
pub use repository::{
    Admission, InMemoryTeamsStore, MemberRemoval, PgTeamsStore, TeamFilter, TeamsStore,
};

// Re-export API types
pub use api::routes;
pub use api::{TeamsSettings, TeamsState};
