//! Task repository trait
//!
//! Defines the interface for task data access.

use async_trait::async_trait;

use super::model::{Task, TaskDraft, TaskPatch};
use crate::Result;

/// Repository interface for task CRUD operations.
///
/// Implementations classify their failures into [`crate::Error`] kinds and
/// never leak raw transport errors. Mutations return the server's canonical
/// record, which callers must adopt in place of their local input.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Get all tasks
    async fn list(&self) -> Result<Vec<Task>>;

    /// Get a task by ID
    async fn get(&self, id: &str) -> Result<Task>;

    /// Create a new task
    async fn create(&self, draft: TaskDraft) -> Result<Task>;

    /// Update an existing task
    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task>;

    /// Delete a task by ID
    async fn delete(&self, id: &str) -> Result<()>;
}
