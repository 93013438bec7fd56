//! SQLite storage layer.
//!
//! - One connection per [`TodoStore`], opened lazily or at startup
//! - WAL journal mode; checkpoints on demand for snapshot export
//! - Scoped close/reopen through [`DetachedStore`]
//!
//! # Submodules
//!
//! - [`detach`] - Close/reopen guard
//! - [`ids`] - Task id generation
//! - [`schema`] - Database schema definition
//! - [`sqlite`] - Store implementation

pub mod detach;
pub mod ids;
pub mod schema;
pub mod sqlite;

pub use detach::DetachedStore;
pub use ids::{ClockIds, IdGenerator, SequentialIds};
pub use sqlite::{CheckpointStats, ConnectionState, IntegrityReport, TodoStore};
