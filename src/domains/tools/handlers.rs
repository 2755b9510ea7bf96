//! Handler boundary shared by every tool endpoint.
//!
//! Every response a tool produces is JSON with an explicit `success` flag.
//! Handlers return [`ApiResult`]; the error side maps onto the status code
//! of its category so that no failure reaches the transport unhandled.

use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Result type for tool HTTP handlers.
pub type ApiResult<T = Json<Value>> = Result<T, ApiError>;

/// Errors surfaced to clients by tool and host endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required request field is absent or empty. No downstream call is made.
    #[error("missing {0}")]
    MissingField(String),

    /// The request is malformed in some other way.
    #[error("{0}")]
    BadRequest(String),

    /// The addressed tool, endpoint or record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The path exists but does not accept this method.
    #[error("Method {method} not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },

    /// A downstream service failed. The label names the upstream operation;
    /// the underlying error is only logged.
    #[error("Failed to contact upstream {0}")]
    Upstream(String),

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn upstream(label: impl Into<String>) -> Self {
        Self::Upstream(label.into())
    }

    pub fn internal(msg: impl ToString) -> Self {
        Self::Internal(msg.to_string())
    }

    /// HTTP status for this error category.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingField(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "success": false, "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

/// Method fallback for routers: a path matched but its method did not.
pub async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::MethodNotAllowed {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}

/// Wrap a payload in a success envelope.
///
/// Object payloads are merged next to the flag (`{success, members: [...]}`);
/// anything else is placed under `data`.
pub fn success(payload: Value) -> Json<Value> {
    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    match payload {
        Value::Object(fields) => body.extend(fields),
        other => {
            body.insert("data".to_string(), other);
        }
    }
    Json(Value::Object(body))
}

/// Loose truthiness: absent, null, false, 0, "" and empty
/// collections all count as "not provided".
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// A JSON object request body.
///
/// The content type is not checked and an empty body reads as `{}`.
#[derive(Debug, Clone, Default)]
pub struct JsonPayload(pub Map<String, Value>);

impl JsonPayload {
    pub fn parse(bytes: &[u8]) -> Result<Self, ApiError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(_) => Err(ApiError::bad_request("request body must be a JSON object")),
            Err(e) => Err(ApiError::bad_request(format!("invalid JSON body: {e}"))),
        }
    }

    /// The field's value, or `null` when absent.
    pub fn get(&self, field: &str) -> Value {
        self.0.get(field).cloned().unwrap_or(Value::Null)
    }

    /// The field's value, or `default` when the field is absent.
    pub fn get_or(&self, field: &str, default: Value) -> Value {
        self.0.get(field).cloned().unwrap_or(default)
    }

    /// The field's value if it is present and truthy.
    pub fn get_truthy(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| is_truthy(v))
    }

    /// The field's value, or a `missing <field>` error.
    pub fn require(&self, field: &str) -> Result<&Value, ApiError> {
        self.get_truthy(field).ok_or_else(|| ApiError::missing(field))
    }
}

impl<S> FromRequest<S> for JsonPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        Self::parse(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(ApiError::missing("group_id").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::upstream("x").status(), StatusCode::BAD_GATEWAY);
        let wrong_method = ApiError::MethodNotAllowed {
            method: "DELETE".to_string(),
            path: "/api/tools".to_string(),
        };
        assert_eq!(wrong_method.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(wrong_method.to_string(), "Method DELETE not allowed on /api/tools");
        assert_eq!(
            ApiError::internal("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(ApiError::missing("group_id").to_string(), "missing group_id");
        assert_eq!(
            ApiError::upstream("members/list").to_string(),
            "Failed to contact upstream members/list"
        );
    }

    #[test]
    fn test_success_envelope() {
        let Json(body) = success(json!({ "members": [1, 2] }));
        assert_eq!(body, json!({ "success": true, "members": [1, 2] }));

        let Json(body) = success(json!([1, 2]));
        assert_eq!(body, json!({ "success": true, "data": [1, 2] }));
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!([])));
        assert!(is_truthy(&json!("g1")));
        assert!(is_truthy(&json!(3)));
        assert!(is_truthy(&json!({ "a": 1 })));
    }

    #[test]
    fn test_payload_parsing() {
        assert!(JsonPayload::parse(b"").unwrap().0.is_empty());
        assert!(JsonPayload::parse(b"  \n").unwrap().0.is_empty());
        assert!(JsonPayload::parse(b"[1]").is_err());
        assert!(JsonPayload::parse(b"{bad").is_err());

        let payload = JsonPayload::parse(br#"{"group_id": "g1", "empty": ""}"#).unwrap();
        assert_eq!(payload.require("group_id").unwrap(), "g1");
        assert!(matches!(
            payload.require("empty"),
            Err(ApiError::MissingField(f)) if f == "empty"
        ));
        assert_eq!(payload.get("absent"), Value::Null);
        assert_eq!(payload.get_or("absent", json!(10)), json!(10));
        assert_eq!(payload.get_or("empty", json!(10)), json!(""));
    }
}
