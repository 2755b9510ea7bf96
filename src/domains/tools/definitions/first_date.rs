//! First date tool definition.
//!
//! Serves the member roster shipped with the tool package and proxies
//! registration and session calls to the upstream service. Upstream calls
//! are unauthenticated.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    extract::{Path as UrlPath, State, rejection::PathRejection},
    routing::{get, post},
};
use serde_json::{Value, json};
use tracing::{debug, info, instrument};

use super::upstream::{UpstreamClient, relay};
use crate::domains::tools::{
    ApiError, ApiResult, JsonPayload, RouteScope, ToolError, ToolPlugin, is_truthy, success,
};

/// Roster file inside the tool package.
pub const MEMBERS_FILE: &str = "members.json";

/// Timeout for upstream calls made by this tool.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

const REGISTRATION_SERVICE: &str = "registration service";
const CONVERSATION_SERVICE: &str = "conversation service";
const DEFAULT_MAX_AGENTS: u64 = 2;
const DEFAULT_MAX_MESSAGES: u64 = 50;

// ============================================================================
// Tool Definition
// ============================================================================

/// First date tool - member roster plus upstream registration proxy.
pub struct FirstDateTool {
    upstream_url: String,
}

/// State shared by the tool's handlers.
struct FirstDateState {
    members: Vec<Value>,
    upstream: UpstreamClient,
}

type SharedState = State<Arc<FirstDateState>>;

impl FirstDateTool {
    /// Directory name of the tool package.
    pub const TOOL_ID: &'static str = "dev-tool-first-date";

    pub fn new(upstream_url: impl Into<String>) -> Self {
        Self {
            upstream_url: upstream_url.into(),
        }
    }
}

impl ToolPlugin for FirstDateTool {
    fn tool_id(&self) -> &'static str {
        Self::TOOL_ID
    }

    fn register_routes(&self, scope: &mut RouteScope) -> Result<(), ToolError> {
        let members = load_members(scope.tool_dir())?;
        info!("Loaded {} member(s) for {}", members.len(), scope.tool_id());

        let upstream = UpstreamClient::new(&self.upstream_url, None, UPSTREAM_TIMEOUT)
            .map_err(|e| ToolError::registration_failed(e.to_string()))?;
        let state = Arc::new(FirstDateState { members, upstream });

        scope
            .route(
                "get_members",
                "/members",
                get(get_members).with_state(state.clone()),
            )?
            .route(
                "get_member",
                "/members/{member_id}",
                get(get_member).with_state(state.clone()),
            )?
            .route(
                "check_registered",
                "/registered",
                post(check_registered).with_state(state.clone()),
            )?
            .route(
                "do_register",
                "/register",
                post(do_register).with_state(state.clone()),
            )?
            .route(
                "do_unregister",
                "/unregister",
                post(do_unregister).with_state(state.clone()),
            )?
            .route(
                "do_connect",
                "/connect",
                post(do_connect).with_state(state.clone()),
            )?
            .route(
                "do_disconnect",
                "/disconnect",
                post(do_disconnect).with_state(state.clone()),
            )?
            .route(
                "conversation_start",
                "/conversation_start",
                post(conversation_start).with_state(state),
            )?;
        Ok(())
    }
}

/// Read the roster. A missing or malformed file fails registration.
fn load_members(tool_dir: &Path) -> Result<Vec<Value>, ToolError> {
    let path = tool_dir.join(MEMBERS_FILE);
    let failed = |e: &dyn std::fmt::Display| {
        ToolError::registration_failed(format!(
            "Failed to load members from {}: {e}",
            path.display()
        ))
    };

    let raw = fs::read_to_string(&path).map_err(|e| failed(&e))?;
    serde_json::from_str(&raw).map_err(|e| failed(&e))
}

/// Find a member profile by name: exact match first, then case-insensitive
/// with surrounding whitespace ignored.
fn find_profile<'a>(members: &'a [Value], name: &str) -> Option<&'a Value> {
    let name_of = |m: &Value| m.get("name").and_then(Value::as_str).map(str::to_string);

    members
        .iter()
        .find(|m| name_of(m).as_deref() == Some(name))
        .or_else(|| {
            let wanted = name.trim().to_lowercase();
            members
                .iter()
                .find(|m| name_of(m).is_some_and(|n| n.trim().to_lowercase() == wanted))
        })
}

/// Both `group_name` and `member_nick_name` must be present.
fn require_member(payload: &JsonPayload) -> ApiResult<(Value, Value)> {
    match (
        payload.get_truthy("group_name"),
        payload.get_truthy("member_nick_name"),
    ) {
        (Some(group), Some(nick)) => Ok((group.clone(), nick.clone())),
        _ => Err(ApiError::bad_request(
            "missing group_name or member_nick_name",
        )),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// `GET /members`
async fn get_members(State(state): SharedState) -> Json<Value> {
    success(json!({ "members": state.members }))
}

/// `GET /members/{member_id}`
async fn get_member(
    State(state): SharedState,
    member_id: Result<UrlPath<i64>, PathRejection>,
) -> ApiResult {
    let not_found = || ApiError::not_found("Member not found");
    let UrlPath(member_id) = member_id.map_err(|_| not_found())?;

    state
        .members
        .iter()
        .find(|m| m.get("id").and_then(Value::as_i64) == Some(member_id))
        .map(|member| success(json!({ "member": member })))
        .ok_or_else(not_found)
}

/// `POST /registered`
#[instrument(skip_all)]
async fn check_registered(State(state): SharedState, payload: JsonPayload) -> ApiResult {
    let (group_name, nick) = require_member(&payload)?;
    let reply = state
        .upstream
        .forward(
            REGISTRATION_SERVICE,
            "/api/registered",
            &json!({ "group_name": group_name, "member_nick_name": nick }),
            None,
        )
        .await?;

    match reply.get("registered") {
        Some(registered) => Ok(success(json!({ "registered": is_truthy(registered) }))),
        None => Ok(relay(reply)),
    }
}

/// `POST /register`
#[instrument(skip_all)]
async fn do_register(State(state): SharedState, payload: JsonPayload) -> ApiResult {
    let (group_name, nick) = require_member(&payload)?;
    let profile = nick
        .as_str()
        .and_then(|name| find_profile(&state.members, name))
        .ok_or_else(|| ApiError::bad_request("member profile not found"))?;

    let reply = state
        .upstream
        .forward(
            REGISTRATION_SERVICE,
            "/api/register",
            &json!({
                "group_name": group_name,
                "member_nick_name": nick,
                "member_profile": profile,
            }),
            None,
        )
        .await?;
    Ok(relay(reply))
}

/// `POST /unregister`
async fn do_unregister(State(state): SharedState, payload: JsonPayload) -> ApiResult {
    let (group_name, nick) = require_member(&payload)?;
    let reply = state
        .upstream
        .forward(
            REGISTRATION_SERVICE,
            "/api/unregister",
            &json!({ "group_name": group_name, "member_nick_name": nick }),
            None,
        )
        .await?;
    Ok(relay(reply))
}

/// `POST /connect`
async fn do_connect(State(state): SharedState, payload: JsonPayload) -> ApiResult {
    let (group_name, nick) = require_member(&payload)?;
    let reply = state
        .upstream
        .forward(
            REGISTRATION_SERVICE,
            "/api/connect",
            &json!({ "group_name": group_name, "member_nick_name": nick }),
            None,
        )
        .await?;
    Ok(relay(reply))
}

/// `POST /disconnect`
async fn do_disconnect(State(state): SharedState, payload: JsonPayload) -> ApiResult {
    let reply = state
        .upstream
        .forward(
            REGISTRATION_SERVICE,
            "/api/disconnect",
            &json!({ "session_id": payload.get("session_id") }),
            None,
        )
        .await?;
    Ok(relay(reply))
}

/// `POST /conversation_start`
///
/// Only the group and the two limits are forwarded; anything else the
/// caller sends is ignored.
#[instrument(skip_all)]
async fn conversation_start(State(state): SharedState, payload: JsonPayload) -> ApiResult {
    let group_name = payload.require("group_name")?.clone();
    let request = json!({
        "group_name": group_name,
        "max_agents": payload.get_or("max_agents", json!(DEFAULT_MAX_AGENTS)),
        "max_messages": payload.get_or("max_messages", json!(DEFAULT_MAX_MESSAGES)),
    });
    debug!("Proxying conversation_create with payload: {}", request);

    let reply = state
        .upstream
        .forward(CONVERSATION_SERVICE, "/api/conversation_create", &request, None)
        .await?;
    Ok(relay(reply))
}
