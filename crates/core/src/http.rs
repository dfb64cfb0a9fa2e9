//! Authenticated HTTP client construction

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;

use crate::config::ClientConfig;
use crate::session::SessionStore;
use crate::{Error, Result};

/// Builds request clients bound to the service address and the current
/// session credential.
///
/// A client is built fresh for every logical operation, re-reading the
/// session store each time, so a token set or cleared between calls is
/// picked up without restart. The factory is a transport concern only and
/// never interprets response status codes.
#[derive(Clone)]
pub struct ClientFactory {
    base_url: String,
    session: Arc<SessionStore>,
}

impl ClientFactory {
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> Self {
        Self {
            base_url: config.base_url.clone(),
            session,
        }
    }

    /// Build a client carrying the JSON content type and, if a credential
    /// is stored, a bearer authorization header.
    pub async fn build(&self) -> Result<Client> {
        let headers = request_headers(self.session.get().await.as_deref())?;
        Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Unknown(format!("failed to build HTTP client: {e}")))
    }

    /// Absolute URL for a service path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn request_headers(token: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = token {
        // Tokens are opaque strings from the service; reject ones that
        // cannot ride in a header instead of panicking.
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::Unknown("credential is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_without_token_have_no_authorization() {
        let headers = request_headers(None).unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn test_headers_with_token_carry_bearer() {
        let headers = request_headers(Some("abc123")).unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc123");
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        assert!(request_headers(Some("line\nbreak")).is_err());
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let config = ClientConfig::new("http://localhost:3001/");
        let factory = ClientFactory::new(&config, Arc::new(SessionStore::new()));
        assert_eq!(factory.url("/tasks"), "http://localhost:3001/tasks");
    }
}
