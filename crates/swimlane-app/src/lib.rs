//! Application layer logic for swimlane.
//!
//! This crate provides the optimistic board store, the remote-store
//! contract, session scoping, and configuration shared by frontends.

pub mod board;
pub mod config;
pub mod remote;
pub mod session;

// Re-exports for convenience
pub use board::{BoardError, BoardStore, BoardSubscription};
pub use config::{BoardConfig, DragConfig};
pub use remote::{RemoteTaskStore, TaskFeed};
pub use session::{
    SessionController, SessionWatch, default_user, session_channel, user_from_env,
};
