//! Bearer credential storage

use tokio::sync::RwLock;

/// Process-wide holder for the current bearer credential.
///
/// The token is owned exclusively by this store. Components that need it
/// read it on demand, so a set or clear between two operations takes effect
/// immediately. The store performs no validation of token content.
#[derive(Debug, Default)]
pub struct SessionStore {
    token: RwLock<Option<String>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a credential, replacing any prior value.
    pub async fn set(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    /// The current credential, if any.
    pub async fn get(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Drop the stored credential.
    pub async fn clear(&self) {
        *self.token.write().await = None;
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }
}
