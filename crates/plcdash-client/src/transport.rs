//! HTTP transport to the remote variable service.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use plcdash_core::SyncError;
use plcdash_protocol::{check_reply, parse_body, HttpRequest, Method};

/// Sends one request and returns the decoded JSON reply.
///
/// Implementations return the reply body even when it carries an error
/// field; the codec layer interprets it. Only failures to obtain a JSON
/// body at all are reported as errors here.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<serde_json::Value, SyncError>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for `base_url` (e.g. `http://localhost:5000/api`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &HttpRequest) -> Result<serde_json::Value, SyncError> {
        let url = self.url(&request.path);
        debug!("{} -> {}", request, url);

        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| {
            warn!("{} failed: {}", request, e);
            SyncError::Transport(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        let reply = match parse_body(&text) {
            Ok(reply) => reply,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => return Err(SyncError::Transport(format!("HTTP {}", status))),
        };

        if !status.is_success() {
            // error payload wins; otherwise report the status itself
            check_reply(&reply)?;
            return Err(SyncError::Service(format!("HTTP {}", status)));
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let transport =
            HttpTransport::new("http://localhost:5000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:5000/api");
        assert_eq!(
            transport.url("/bool/read"),
            "http://localhost:5000/api/bool/read"
        );
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport =
            HttpTransport::new(format!("http://{}/api", addr), Duration::from_secs(2)).unwrap();
        let result = transport.send(&HttpRequest::get("/status")).await;
        assert!(matches!(result, Err(SyncError::Transport(_))));
    }
}
