//! Task module
//!
//! This module contains task-related types, remote data access, and the
//! local state container.

mod model;
mod remote;
mod repository;
mod state;

pub use model::{Task, TaskDraft, TaskPatch, TaskStats, TaskStatus};
pub use remote::HttpTaskStore;
pub use repository::TaskRepository;
pub use state::{StateChange, TaskState};
