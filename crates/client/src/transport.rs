//! HTTP transport and response discrimination.
//!
//! [`Transport`] is the only seam that touches the network.  Everything
//! above it works on [`HttpResponse`] values, which keeps the clients
//! testable with a scripted fake.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use reqwest::header::{CACHE_CONTROL, HeaderMap, HeaderValue, PRAGMA};
use serde_json::Value;
use tracing::debug;

use occuview_config::ServerConfig;

use crate::envelope::Envelope;
use crate::error::{ClientError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    /// Path relative to the server origin, e.g. `/capacity`.
    pub path: String,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request.  Only failures that produce no response at all
    /// are errors here; status codes are judged by the caller.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

// ── reqwest-backed transport ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        if config.no_cache {
            headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
            headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ClientError::InvalidUrl(format!("{path}: {err}")))
    }
}

/// Parse the configured origin, forcing a trailing slash so relative joins
/// keep any path prefix.
fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&normalized).map_err(|err| ClientError::InvalidUrl(format!("{raw}: {err}")))
}

fn reason_phrase(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown Status")
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = self.endpoint(&request.path)?;
        debug!(method = ?request.method, %url, "sending request");

        let builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };
        let builder = match request.body {
            Some(body) => builder.body(body),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: reason_phrase(status).to_string(),
            body,
        })
    }
}

// ── Discrimination ───────────────────────────────────────────────────────────

/// Send `request` and decode the body as JSON without looking at `state`.
/// Used for `GET /current_config`, which returns the bare document.
pub async fn fetch_raw<T: Transport + ?Sized>(transport: &T, request: HttpRequest) -> Result<Value> {
    let path = request.path.clone();
    let response = transport.send(request).await?;
    if !response.is_success() {
        debug!(%path, status = response.status, "non-success status");
        return Err(ClientError::Status {
            status: response.status,
            reason: response.reason,
        });
    }
    Ok(serde_json::from_str(&response.body)?)
}

/// Send `request`, decode it and unwrap the `{state, message}` envelope.
/// Transport, decode and application failures all come back as `Err`; only
/// an explicit `"error"` state counts as an application failure.
pub async fn exchange<T: Transport + ?Sized>(transport: &T, request: HttpRequest) -> Result<Value> {
    let value = fetch_raw(transport, request).await?;
    Envelope::from_value(value).into_result()
}

/// Like [`exchange`], but the reply must carry `state == "ok"`.
pub async fn exchange_ok<T: Transport + ?Sized>(transport: &T, request: HttpRequest) -> Result<Value> {
    let value = fetch_raw(transport, request).await?;
    Envelope::require_ok(value).into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::testing::ScriptedTransport;
    use serde_json::json;

    #[test]
    fn base_url_keeps_path_prefix() {
        let config = ServerConfig {
            base_url: "http://device.local:3080/counter".to_string(),
            ..ServerConfig::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(
            transport.endpoint("/capacity").unwrap().as_str(),
            "http://device.local:3080/counter/capacity"
        );
        assert_eq!(
            transport.endpoint("cmd").unwrap().as_str(),
            "http://device.local:3080/counter/cmd"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let config = ServerConfig {
            base_url: "not a url".to_string(),
            ..ServerConfig::default()
        };
        let err = HttpTransport::new(&config).unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn exchange_returns_payload_on_ok_state() {
        let transport = ScriptedTransport::new();
        transport.push_json(200, json!({"state": "ok", "capacity": 4}));

        let payload = exchange(&transport, HttpRequest::get("/capacity")).await.unwrap();
        assert_eq!(payload["capacity"], 4);
    }

    #[tokio::test]
    async fn exchange_maps_non_success_status() {
        let transport = ScriptedTransport::new();
        transport.push_status(503, "Service Unavailable");

        let err = exchange(&transport, HttpRequest::get("/capacity")).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
        assert_eq!(err.to_string(), "Server answer: 503 - Service Unavailable");
    }

    #[tokio::test]
    async fn exchange_maps_error_state() {
        let transport = ScriptedTransport::new();
        transport.push_json(200, json!({"state": "error", "message": "at capacity"}));

        let err = exchange(&transport, HttpRequest::post("/cmd", "{}")).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Application);
        assert_eq!(err.to_string(), "at capacity");
    }

    #[tokio::test]
    async fn exchange_accepts_unrecognised_state_but_exchange_ok_does_not() {
        let transport = ScriptedTransport::new();
        transport.push_json(200, json!({"state": "done"}));
        transport.push_json(200, json!({"state": "done"}));

        let payload = exchange(&transport, HttpRequest::post("/cmd", "{}")).await.unwrap();
        assert_eq!(payload["state"], "done");

        let err = exchange_ok(&transport, HttpRequest::get("/capacity")).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Application);
        assert_eq!(err.to_string(), "unexpected response state 'done'");
    }

    #[test]
    fn non_standard_status_still_has_a_reason() {
        assert_eq!(reason_phrase(StatusCode::NOT_FOUND), "Not Found");
        let odd = StatusCode::from_u16(599).unwrap();
        assert_eq!(reason_phrase(odd), "Unknown Status");
        let err = ClientError::Status {
            status: 599,
            reason: reason_phrase(odd).to_string(),
        };
        assert_eq!(err.to_string(), "Server answer: 599 - Unknown Status");
    }

    #[tokio::test]
    async fn exchange_maps_bad_body_to_decode() {
        let transport = ScriptedTransport::new();
        transport.push_body(200, "<html>oops</html>");

        let err = exchange(&transport, HttpRequest::get("/capacity")).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Decode);
    }

    #[tokio::test]
    async fn fetch_raw_ignores_state_field() {
        let transport = ScriptedTransport::new();
        transport.push_json(200, json!({"state": "error", "note": "user data"}));

        let value = fetch_raw(&transport, HttpRequest::get("/current_config")).await.unwrap();
        assert_eq!(value["note"], "user data");
    }

    #[tokio::test]
    async fn network_failure_propagates() {
        let transport = ScriptedTransport::new();
        transport.push_network_error("connection refused");

        let err = fetch_raw(&transport, HttpRequest::get("/current_config")).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
        assert!(err.to_string().contains("connection refused"));
    }
}
