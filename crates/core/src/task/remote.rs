//! HTTP-backed task repository
//!
//! Translates repository calls into authenticated requests against the
//! remote task service and classifies every failure.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Response;
use tracing::{debug, warn};

use super::model::{Task, TaskDraft, TaskPatch};
use super::repository::TaskRepository;
use crate::http::ClientFactory;
use crate::session::SessionStore;
use crate::{Error, Result};

/// Task repository backed by the remote service.
///
/// Auth is delegated entirely to the client factory: whatever credential the
/// session store holds rides along, including none. A 401 on any call clears
/// the stored credential before the failure is surfaced.
pub struct HttpTaskStore {
    factory: ClientFactory,
    session: Arc<SessionStore>,
}

impl HttpTaskStore {
    pub fn new(factory: ClientFactory, session: Arc<SessionStore>) -> Self {
        Self { factory, session }
    }

    fn task_url(&self, id: &str) -> String {
        self.factory
            .url(&format!("/tasks/{}", urlencoding::encode(id)))
    }

    async fn fail(&self, response: Response) -> Error {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let error = Error::from_response(status, &body);
        match &error {
            Error::Unauthorized => {
                warn!("Session expired, clearing stored credential");
                self.session.clear().await;
            }
            Error::Unknown(detail) => warn!(status, detail = %detail, "Unclassified service failure"),
            _ => {}
        }
        error
    }
}

#[async_trait]
impl TaskRepository for HttpTaskStore {
    async fn list(&self) -> Result<Vec<Task>> {
        let client = self.factory.build().await?;
        debug!("Fetching task list");
        let response = client
            .get(self.factory.url("/tasks"))
            .send()
            .await
            .map_err(network_error)?;
        if !response.status().is_success() {
            return Err(self.fail(response).await);
        }
        response.json().await.map_err(decode_error)
    }

    async fn get(&self, id: &str) -> Result<Task> {
        let client = self.factory.build().await?;
        debug!(id, "Fetching task");
        let response = client
            .get(self.task_url(id))
            .send()
            .await
            .map_err(network_error)?;
        if !response.status().is_success() {
            return Err(self.fail(response).await);
        }
        response.json().await.map_err(decode_error)
    }

    async fn create(&self, draft: TaskDraft) -> Result<Task> {
        if !draft.is_complete() {
            return Err(Error::Validation("all fields are required".to_string()));
        }
        let client = self.factory.build().await?;
        debug!(title = %draft.title, "Creating task");
        let response = client
            .post(self.factory.url("/tasks"))
            .json(&draft)
            .send()
            .await
            .map_err(network_error)?;
        if !response.status().is_success() {
            return Err(self.fail(response).await);
        }
        response.json().await.map_err(decode_error)
    }

    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        if patch.is_empty() {
            return Err(Error::Validation("no fields to update".to_string()));
        }
        let client = self.factory.build().await?;
        debug!(id, "Updating task");
        let response = client
            .put(self.task_url(id))
            .json(&patch)
            .send()
            .await
            .map_err(network_error)?;
        if !response.status().is_success() {
            return Err(self.fail(response).await);
        }
        response.json().await.map_err(decode_error)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let client = self.factory.build().await?;
        debug!(id, "Deleting task");
        let response = client
            .delete(self.task_url(id))
            .send()
            .await
            .map_err(network_error)?;
        if !response.status().is_success() {
            return Err(self.fail(response).await);
        }
        Ok(())
    }
}

fn network_error(err: reqwest::Error) -> Error {
    Error::Network(err.to_string())
}

fn decode_error(err: reqwest::Error) -> Error {
    Error::Unknown(format!("failed to decode response: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use chrono::NaiveDate;

    fn store() -> HttpTaskStore {
        let session = Arc::new(SessionStore::new());
        let config = ClientConfig::new("http://localhost:3001");
        let factory = ClientFactory::new(&config, Arc::clone(&session));
        HttpTaskStore::new(factory, session)
    }

    #[test]
    fn test_task_url_escapes_opaque_ids() {
        let store = store();
        assert_eq!(
            store.task_url("a b/c"),
            "http://localhost:3001/tasks/a%20b%2Fc"
        );
    }

    #[tokio::test]
    async fn test_incomplete_draft_fails_without_a_request() {
        let store = store();
        let draft = TaskDraft::new("", "", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let err = store.create(draft).await.unwrap_err();
        assert_eq!(err, Error::Validation("all fields are required".to_string()));
    }

    #[tokio::test]
    async fn test_empty_patch_fails_without_a_request() {
        let store = store();
        let err = store.update("1", TaskPatch::default()).await.unwrap_err();
        assert_eq!(err, Error::Validation("no fields to update".to_string()));
    }
}
