//! Client for the upstream conversation service.
//!
//! Shared by the tools that proxy requests upstream. One attempt per call:
//! no retries and no backoff.

use std::time::Duration;

use axum::Json;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use crate::domains::tools::{ApiError, ApiResult, success};

/// Errors talking to the upstream service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection failure, timeout, non-2xx status or undecodable body.
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// HTTP client bound to one upstream base URL.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl UpstreamClient {
    /// Create a client. `token`, when set, is sent as a bearer token.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(UpstreamError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// POST a JSON payload to `path` and decode the JSON reply.
    pub async fn post(
        &self,
        path: &str,
        payload: &Value,
        member_id: Option<&str>,
    ) -> Result<Value, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let mut request = self.client.post(&url).json(payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(member_id) = member_id {
            request = request.query(&[("member_id", member_id)]);
        }

        let into_error = |source| UpstreamError::Request {
            url: url.clone(),
            source,
        };

        request
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(into_error)?
            .json::<Value>()
            .await
            .map_err(into_error)
    }

    /// [`post`](Self::post) at the handler boundary: the failure is logged
    /// and surfaced as a 502 naming `label`.
    pub async fn forward(
        &self,
        label: &str,
        path: &str,
        payload: &Value,
        member_id: Option<&str>,
    ) -> ApiResult<Value> {
        self.post(path, payload, member_id).await.map_err(|e| {
            error!("Failed to contact upstream {}: {}", path, e);
            ApiError::upstream(label)
        })
    }
}

/// Relay an upstream reply to the client.
///
/// Replies that already carry a `success` flag pass through untouched; any
/// other reply is wrapped in a success envelope.
pub fn relay(reply: Value) -> Json<Value> {
    if reply.get("success").is_some() {
        Json(reply)
    } else {
        success(reply)
    }
}
