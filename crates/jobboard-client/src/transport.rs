//! Transport port between client operations and the REST server.
//!
//! Operations build an [`ApiRequest`] and hand it to a [`Transport`]. The
//! production adapter is [`crate::http::HttpTransport`]; tests swap in
//! in-memory servers.

use async_trait::async_trait;
use jobboard_core::Credential;
use jobboard_core::models::{ApplicationForm, FileUpload};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// Request body encodings the API accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    /// `application/x-www-form-urlencoded` pairs.
    Form(Vec<(String, String)>),
    /// Application submission with its resume file.
    Multipart(ApplicationForm),
    /// Multipart body holding a single file under `field`.
    File {
        field: &'static str,
        file: FileUpload,
    },
}

/// One REST call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Body,
    /// Bearer credential, attached for authenticated endpoints.
    pub credential: Option<Credential>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Body::Empty,
            credential: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn json(mut self, value: Value) -> Self {
        self.body = Body::Json(value);
        self
    }

    #[must_use]
    pub fn form(mut self, pairs: &[(&str, &str)]) -> Self {
        self.body = Body::Form(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        );
        self
    }

    #[must_use]
    pub fn multipart(mut self, form: ApplicationForm) -> Self {
        self.body = Body::Multipart(form);
        self
    }

    #[must_use]
    pub fn file(mut self, field: &'static str, file: FileUpload) -> Self {
        self.body = Body::File { field, file };
        self
    }

    #[must_use]
    pub fn bearer(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Query value for `key`, if present.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Transport-level failures, before classification into `ApiError`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("network error: {0}")]
    Network(String),

    /// A success response whose body was not JSON.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("transport configuration error: {0}")]
    Config(String),
}

/// Sends requests to the job board API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request. Success bodies are returned as JSON; an empty
    /// success body is `Value::Null`.
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError>;
}
