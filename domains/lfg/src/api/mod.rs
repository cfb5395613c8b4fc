//! API layer for the LFG domain

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use middleware::LfgState;
pub use routes::routes;
