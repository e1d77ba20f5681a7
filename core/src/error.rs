//! Error types for the dog service client.
//!
//! # Design
//! `ApiError` is the internal taxonomy: it keeps the raw status and body so
//! the user-facing text can be derived later. Presentation never sees the
//! variants, only the string produced by [`ApiError::user_message`], which
//! applies one fixed precedence: server `detail`, then server `message`,
//! then the transport-level text, then a generic per-operation message.

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;

/// Message shown when the client-wide timeout aborts a request.
pub const TIMEOUT_MESSAGE: &str = "Request timed out. Please try again.";

/// The client operations, used to pick a generic failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SearchText,
    SearchImage,
    Upload,
    ListDogs,
    GetDog,
    Health,
}

impl Operation {
    /// Last-resort message when nothing more specific is available.
    pub fn generic_message(&self) -> &'static str {
        match self {
            Operation::SearchText => "Search failed",
            Operation::SearchImage => "Image search failed",
            Operation::Upload => "Upload failed",
            Operation::ListDogs => "Failed to fetch dogs",
            Operation::GetDog => "Failed to fetch dog",
            Operation::Health => "Connection test failed",
        }
    }

    /// Message for a 404 without a server detail.
    pub fn not_found_message(&self) -> Option<&'static str> {
        match self {
            Operation::GetDog => Some("Dog not found"),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::SearchText => "search_text",
            Operation::SearchImage => "search_image",
            Operation::Upload => "upload_photos",
            Operation::ListDogs => "list_dogs",
            Operation::GetDog => "get_dog",
            Operation::Health => "health",
        };
        f.write_str(name)
    }
}

/// Errors produced while building, sending or parsing a request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound { body: String },

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    Server { status: u16, body: String },

    /// No response was received.
    #[error("network error: {0}")]
    Network(String),

    /// The client-wide timeout elapsed.
    #[error("request timed out")]
    Timeout,

    /// The caller supplied nothing to send; caught before any I/O.
    #[error("{0}")]
    EmptyInput(&'static str),

    /// A local image could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ApiError {
    /// Text that reaches the user for a failed `op`.
    pub fn user_message(&self, op: Operation) -> String {
        let message = match self {
            ApiError::NotFound { body } => server_detail(body).unwrap_or_else(|| {
                op.not_found_message()
                    .map_or_else(|| status_text(404), str::to_string)
            }),
            ApiError::Server { status, body } => {
                server_detail(body).unwrap_or_else(|| status_text(*status))
            }
            ApiError::Network(text) => text.trim().to_string(),
            ApiError::Timeout => TIMEOUT_MESSAGE.to_string(),
            other => other.to_string(),
        };

        if message.is_empty() {
            op.generic_message().to_string()
        } else {
            message
        }
    }
}

fn status_text(status: u16) -> String {
    format!("Request failed with status code {status}")
}

/// Extract `detail`, falling back to `message`, from a JSON error body.
///
/// FastAPI-style validation errors carry `detail` as a list of objects with a
/// `msg` field; those are joined with "; ".
pub fn server_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    object
        .get("detail")
        .and_then(detail_text)
        .or_else(|| object.get("message").and_then(non_empty_str))
}

fn detail_text(detail: &Value) -> Option<String> {
    match detail {
        Value::String(_) => non_empty_str(detail),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(map) => map.get("msg").and_then(non_empty_str),
                    other => non_empty_str(other),
                })
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        Value::Null | Value::Bool(false) => None,
        other => Some(other.to_string()),
    }
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
