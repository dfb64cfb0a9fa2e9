//! Login, registration, and session transitions

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::http::ClientFactory;
use crate::session::SessionStore;
use crate::{Error, Result};

/// Authentication state derived from the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    Unauthenticated,
    Authenticated,
}

#[derive(Debug, Serialize)]
struct CredentialsRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
}

/// Login/register calls that drive the session store.
///
/// The only transitions are a successful login (stores the token) and
/// logout or a 401 on any authenticated call (clears it). Registration
/// never yields a token; a login must follow.
#[derive(Clone)]
pub struct AuthFlow {
    factory: ClientFactory,
    session: Arc<SessionStore>,
}

impl AuthFlow {
    pub fn new(factory: ClientFactory, session: Arc<SessionStore>) -> Self {
        Self { factory, session }
    }

    pub async fn stage(&self) -> AuthStage {
        if self.session.is_authenticated().await {
            AuthStage::Authenticated
        } else {
            AuthStage::Unauthenticated
        }
    }

    /// Exchange credentials for a bearer token and store it.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let client = self.factory.build().await?;
        let response = client
            .post(self.factory.url("/auth/login"))
            .json(&CredentialsRequest { username, password })
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.fail(response).await);
        }

        let payload: LoginResponse = response
            .json()
            .await
            .map_err(|e| Error::Unknown(format!("failed to decode login response: {e}")))?;
        self.session.set(payload.access_token).await;
        info!(username, "Logged in");
        Ok(())
    }

    /// Create an account. Does not authenticate; the caller logs in next.
    pub async fn register(&self, username: &str, password: &str) -> Result<()> {
        let client = self.factory.build().await?;
        let response = client
            .post(self.factory.url("/auth/register"))
            .json(&CredentialsRequest { username, password })
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.fail(response).await);
        }
        info!(username, "Registered");
        Ok(())
    }

    /// Drop the stored credential.
    pub async fn logout(&self) {
        self.session.clear().await;
        debug!("Logged out");
    }

    async fn fail(&self, response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let error = Error::from_response(status, &body);
        match &error {
            Error::Unauthorized => self.session.clear().await,
            Error::Unknown(detail) => warn!(status, detail = %detail, "Unclassified service failure"),
            _ => {}
        }
        error
    }
}
