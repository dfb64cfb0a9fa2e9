//! Core library for the TaskHub client
//!
//! This crate contains the session-aware data-access layer:
//! - Session credential storage
//! - Authenticated HTTP client construction
//! - Task CRUD against the remote service
//! - In-memory task state with derived statistics

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod task;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
