//! Ordering and synchronization engine for a kanban-style board.
//!
//! Cards live in ordered columns. Drags are applied to local state right
//! away and then written to the store; when a write fails the board is
//! rolled back and reloaded so it never drifts from storage for long.

pub mod config;
pub mod error;
pub mod executor;
pub mod history;
pub mod position;
pub mod session;
pub mod state;
pub mod storage;
pub mod sync;
pub mod tags;
pub mod types;
pub mod validate;

pub use config::EngineConfig;
pub use error::{EngineError, ValidationError};
pub use session::BoardSession;
pub use storage::{BoardStore, StoreError};
