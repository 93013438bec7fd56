//! Offline todo list backed by SQLite, with consistent snapshot export.
//!
//! This crate provides the core functionality for the `todos` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (Task, RemoteTodo)
//! - [`storage`] - SQLite task store and its connection lifecycle
//! - [`export`] - Snapshot export, share targets and diagnostics
//! - [`remote`] - Read-only client for the remote todo list
//! - [`config`] - Configuration and path resolution
//! - [`validate`] - Input validation
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod remote;
pub mod storage;
pub mod validate;

pub use error::{Error, Result};
