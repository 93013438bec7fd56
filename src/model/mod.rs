//! Data models for the to-do store.
//!
//! - Task (the only persisted entity)
//! - RemoteTodo (read-only items from the remote list)

pub mod task;

pub use task::{RemoteTodo, Task};
