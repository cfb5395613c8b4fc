//! LFG domain: looking-for-team and looking-for-members posts

pub mod api;
pub mod domain;
pub mod repository;

pub use domain::entities::{LfgKind, LfgPost, LfgStatus};
pub use domain::state::{LfgEvent, LfgStateMachine};
pub use repository::{InMemoryLfgStore, LfgFilter, LfgStore, PgLfgStore};

pub use api::routes;
pub use api::LfgState;
