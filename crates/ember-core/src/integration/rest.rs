//! REST transport boundary.
//!
//! Managers never talk HTTP themselves. They call a [`RestClient`], which is
//! responsible for URLs, authentication, rate limiting and retries, and get
//! back the parsed response body.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;

use crate::error::{ApiError, ApiResult};

/// HTTP method of a REST request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Upper-case method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file uploaded as one part of a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    /// Form field name.
    pub key: String,
    /// File name sent to the server.
    pub name: String,
    /// Raw contents.
    pub data: Vec<u8>,
    /// MIME type, if known.
    pub content_type: Option<String>,
}

impl FileAttachment {
    /// Creates an attachment under the `file` form key.
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            key: "file".into(),
            name: name.into(),
            data: data.into(),
            content_type: None,
        }
    }

    /// Sets the form field name.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Sets the MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Everything a request carries besides its method and route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// JSON body, or the form fields of a multipart request.
    pub data: Option<Value>,
    /// Files to upload. A non-empty list makes the request multipart.
    pub files: Vec<FileAttachment>,
    /// Audit log reason.
    pub reason: Option<String>,
    /// Query string pairs.
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    /// Options with no body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with a JSON body.
    pub fn json(data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    /// Sets the audit log reason.
    pub fn with_reason(mut self, reason: Option<impl Into<String>>) -> Self {
        self.reason = reason.map(Into::into);
        self
    }

    /// Adds a query pair.
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Attaches files, sending `data` as plain form fields.
    pub fn with_files(mut self, files: Vec<FileAttachment>) -> Self {
        self.files = files;
        self
    }

    /// Whether this request needs a multipart body.
    pub fn is_multipart(&self) -> bool {
        !self.files.is_empty()
    }
}

/// The REST transport.
///
/// `route` is the path below the versioned API root, e.g.
/// `/guilds/1/members/2`. Implementations resolve it against their base URL.
///
/// # Returns
///
/// The parsed response body, or [`Value::Null`] for empty responses.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Sends a request.
    async fn request(
        &self,
        method: Method,
        route: &str,
        options: RequestOptions,
    ) -> ApiResult<Value>;
}

/// A transport that rejects every request.
///
/// Useful for clients that only consume gateway events.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledRestClient;

#[async_trait]
impl RestClient for DisabledRestClient {
    async fn request(
        &self,
        method: Method,
        route: &str,
        _options: RequestOptions,
    ) -> ApiResult<Value> {
        trace!(%method, route, "REST disabled, rejecting request");
        Err(ApiError::NotSupported)
    }
}
