//! Error types for the client core

use serde::Deserialize;
use thiserror::Error;

/// Classified failure surfaced by every remote operation.
///
/// Raw transport errors never leave the data-access layer; callers only see
/// one of these kinds, with the server's human-readable message preserved
/// where one was provided.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unauthorized, please log in again")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl Error {
    /// Classify a non-success HTTP response from the service.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = extract_message(body);
        match status {
            401 => Self::Unauthorized,
            404 => Self::NotFound(message.unwrap_or_else(|| "resource not found".to_string())),
            400..=499 => match message {
                Some(message) => Self::Validation(message),
                None => Self::Unknown(format!("request failed: HTTP {status}")),
            },
            _ => Self::Unknown(message.unwrap_or_else(|| format!("request failed: HTTP {status}"))),
        }
    }

    /// Whether this failure is the session-expiry signal.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Error body shape used by the service: a single message string, or a list
/// of per-field error lists.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: ErrorMessage,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorMessage {
    Text(String),
    Fields(Vec<FieldErrors>),
}

#[derive(Debug, Deserialize)]
struct FieldErrors {
    errors: Vec<String>,
}

fn extract_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let message = match parsed.message {
        ErrorMessage::Text(text) => text,
        ErrorMessage::Fields(fields) => fields
            .into_iter()
            .flat_map(|field| field.errors)
            .collect::<Vec<_>>()
            .join("\n"),
    };
    let message = message.trim().to_string();
    if message.is_empty() {
        None
    } else {
        Some(message)
    }
}
