//! HTTP implementation of [`RestClient`].

use std::time::Duration;

use async_trait::async_trait;
use ember_core::{ApiError, ApiResult, FileAttachment, Method, RequestOptions, RestClient};
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, ClientBuilder, RequestBuilder, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, info, trace};

/// Header carrying the URL encoded audit log reason.
const AUDIT_LOG_REASON: &str = "X-Audit-Log-Reason";

/// Connection settings of an [`HttpRestClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRestConfig {
    /// Versioned API root, e.g. `https://discord.com/api/v9`.
    pub api_root: String,
    /// Bot token, sent as `Authorization: Bot <token>`.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// A [`RestClient`] backed by `reqwest`.
pub struct HttpRestClient {
    client: Client,
    config: HttpRestConfig,
}

impl HttpRestClient {
    /// Creates a client with its own connection pool.
    pub fn new(config: HttpRestConfig) -> ApiResult<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        info!(api_root = %config.api_root, "HTTP REST client ready");
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpRestConfig {
        &self.config
    }

    fn url(&self, route: &str, query: &[(String, String)]) -> ApiResult<Url> {
        let raw = format!("{}{route}", self.config.api_root.trim_end_matches('/'));
        let mut url =
            Url::parse(&raw).map_err(|e| ApiError::Transport(format!("invalid URL {raw}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn build(
        &self,
        method: Method,
        route: &str,
        options: RequestOptions,
    ) -> ApiResult<RequestBuilder> {
        let RequestOptions {
            data,
            files,
            reason,
            query,
        } = options;

        let mut request = self
            .client
            .request(http_method(method), self.url(route, &query)?);
        if let Some(token) = &self.config.token {
            request = request.header(AUTHORIZATION, format!("Bot {token}"));
        }
        if let Some(reason) = &reason {
            request = request.header(AUDIT_LOG_REASON, urlencoding::encode(reason).into_owned());
        }

        if !files.is_empty() {
            request = request.multipart(multipart_form(data, files)?);
        } else if let Some(data) = &data {
            request = request.json(data);
        }
        Ok(request)
    }
}

impl std::fmt::Debug for HttpRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRestClient")
            .field("api_root", &self.config.api_root)
            .field("timeout", &self.config.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RestClient for HttpRestClient {
    async fn request(
        &self,
        method: Method,
        route: &str,
        options: RequestOptions,
    ) -> ApiResult<Value> {
        let request = self.build(method, route, options)?;
        trace!(%method, route, "Sending HTTP request");

        let response = request.send().await.map_err(map_reqwest)?;
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let body = response.text().await.map_err(map_reqwest)?;
        if !status.is_success() {
            debug!(%method, route, status = status.as_u16(), "HTTP request failed");
            return Err(http_error(status, &body));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(ApiError::from)
    }
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Builds a multipart body: one part per file, then one text part per
/// top-level field of `data`.
fn multipart_form(data: Option<Value>, files: Vec<FileAttachment>) -> ApiResult<Form> {
    let mut form = Form::new();
    for file in files {
        let mut part = Part::bytes(file.data).file_name(file.name);
        if let Some(content_type) = &file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| ApiError::Transport(e.to_string()))?;
        }
        form = form.part(file.key, part);
    }

    if let Some(Value::Object(fields)) = data {
        for (key, value) in fields {
            let text = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            form = form.text(key, text);
        }
    }
    Ok(form)
}

fn map_reqwest(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Transport(err.to_string())
    }
}

/// Maps an error response. The platform sends `{ "code", "message" }`.
fn http_error(status: StatusCode, body: &str) -> ApiError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let field = |key: &str| parsed.as_ref().and_then(|v| v.get(key).cloned());
    let message = field("message")
        .and_then(|m| m.as_str().map(str::to_string))
        .or_else(|| (!body.is_empty()).then(|| body.to_string()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());
    ApiError::Http {
        status: status.as_u16(),
        code: field("code").and_then(|c| c.as_i64()),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> HttpRestClient {
        HttpRestClient::new(HttpRestConfig {
            api_root: format!("{}/api/v9", server.uri()),
            token: Some("secret".into()),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn sends_auth_query_and_reason() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v9/channels/1/messages/2"))
            .and(header("authorization", "Bot secret"))
            .and(header("x-audit-log-reason", "spam%20%26%20abuse"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let response = client(&server)
            .request(
                Method::Delete,
                "/channels/1/messages/2",
                RequestOptions::new()
                    .with_reason(Some("spam & abuse"))
                    .with_query("limit", 5),
            )
            .await
            .unwrap();

        assert_eq!(response, Value::Null);
    }

    #[tokio::test]
    async fn json_bodies_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/v9/channels/1"))
            .and(body_json(json!({ "name": "renamed" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "1", "name": "renamed" })))
            .mount(&server)
            .await;

        let response = client(&server)
            .request(
                Method::Patch,
                "/channels/1",
                RequestOptions::json(json!({ "name": "renamed" })),
            )
            .await
            .unwrap();

        assert_eq!(response["name"], "renamed");
    }

    #[tokio::test]
    async fn error_bodies_become_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v9/channels/404"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({ "code": 10003, "message": "Unknown Channel" })),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .request(Method::Get, "/channels/404", RequestOptions::new())
            .await
            .unwrap_err();

        match err {
            ApiError::Http {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 404);
                assert_eq!(code, Some(10003));
                assert_eq!(message, "Unknown Channel");
            }
            other => panic!("expected HTTP error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn multipart_uploads_send_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v9/guilds/1/stickers"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "5" })))
            .mount(&server)
            .await;

        let options = RequestOptions::json(json!({ "name": "wave", "tags": "hi" }))
            .with_files(vec![
                FileAttachment::new("wave.png", vec![0x89, 0x50]).with_content_type("image/png"),
            ]);
        client(&server)
            .request(Method::Post, "/guilds/1/stickers", options)
            .await
            .unwrap();

        let received = server.received_requests().await.unwrap();
        let request = &received[0];
        let content_type = request.headers.get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
        let body = String::from_utf8_lossy(&request.body);
        assert!(body.contains("name=\"name\""));
        assert!(body.contains("wave"));
        assert!(body.contains("filename=\"wave.png\""));
    }

    #[test]
    fn routes_join_the_api_root() {
        let client = HttpRestClient::new(HttpRestConfig {
            api_root: "https://example.com/api/v9/".into(),
            token: None,
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        let url = client
            .url("/users/1", &[("with_counts".into(), "true".into())])
            .unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/v9/users/1?with_counts=true");
    }
}
