//! reqwest-backed transport for the job board REST API.

use std::time::Duration;

use async_trait::async_trait;
use jobboard_core::config::ApiConfig;
use jobboard_core::models::FileUpload;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::debug;
use url::Url;
use url::form_urlencoded;

use crate::transport::{ApiRequest, Body, Method, Transport, TransportError};

fn file_part(file: FileUpload) -> Result<Part, TransportError> {
    Part::bytes(file.bytes)
        .file_name(file.filename)
        .mime_str(&file.content_type)
        .map_err(|e| TransportError::Config(format!("invalid content type: {e}")))
}

/// HTTP transport talking to a live server.
#[derive(Debug)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for the configured API base.
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        if config.base_url.trim().is_empty() {
            return Err(TransportError::Config("base_url is empty".into()));
        }
        Url::parse(&config.base_url)
            .map_err(|e| TransportError::Config(format!("invalid base_url: {e}")))?;

        // reqwest is built with rustls-no-provider; an Err means one is already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Config(e.to_string()))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// Absolute URL for a request path and query.
    pub(crate) fn url_for(&self, path: &str, query: &[(String, String)]) -> Result<Url, TransportError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| TransportError::Config(format!("invalid request path {path}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }

    fn method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Pull the server's `detail` message out of an error body.
pub(crate) fn error_detail(body: &[u8], fallback: &str) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => fallback.to_string(),
        },
        _ => fallback.to_string(),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, TransportError> {
        let url = self.url_for(&request.path, &request.query)?;
        debug!(method = request.method.as_str(), %url, "Sending request");

        let mut builder = self.http.request(Self::method(request.method), url);
        if let Some(credential) = &request.credential {
            builder = builder.header(AUTHORIZATION, credential.bearer());
        }
        builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Form(pairs) => {
                let encoded = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs.iter())
                    .finish();
                builder
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(encoded)
            }
            Body::Multipart(form) => {
                let mut multipart = Form::new().part("resume", file_part(form.resume)?);
                if let Some(cover_letter) = form.cover_letter {
                    multipart = multipart.text("cover_letter", cover_letter);
                }
                builder.multipart(multipart)
            }
            Body::File { field, file } => {
                builder.multipart(Form::new().part(field, file_part(file)?))
            }
        };

        let resp = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("Unknown");
            return Err(TransportError::Status {
                status: status.as_u16(),
                detail: error_detail(&bytes, reason),
            });
        }
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
    }
}
