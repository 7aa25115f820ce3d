//! Shared types for the chatgate crates: conversation turns, the workspace
//! error type, configuration and structured trace events.

pub mod config;
pub mod error;
pub mod trace;
pub mod turn;

pub use turn::{Turn, TurnRole};
