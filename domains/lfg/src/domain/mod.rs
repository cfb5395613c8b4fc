//! LFG domain layer: posts and their state machine

pub mod entities;
pub mod state;
