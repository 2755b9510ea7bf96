//! Conversations tool definition.
//!
//! A table of proxy routes to the upstream service. Every route is a POST
//! that validates its required fields, builds the upstream payload and
//! relays the upstream reply. Calls carry the configured bearer token.

use std::sync::Arc;

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    routing::post,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::instrument;

use super::upstream::{UpstreamClient, relay};
use crate::core::config::UpstreamConfig;
use crate::domains::tools::{ApiError, ApiResult, JsonPayload, RouteScope, ToolError, ToolPlugin};

type Body = Map<String, Value>;

/// One proxied endpoint.
pub struct ProxyRoute {
    /// Handler name inside the tool.
    pub handler: &'static str,
    /// Path under the tool's base path.
    pub path: &'static str,
    /// Path on the upstream service.
    pub upstream: &'static str,
    /// Names the upstream operation in 502 replies.
    pub label: &'static str,
    /// Validates the request and builds the upstream payload.
    pub build: fn(&JsonPayload) -> ApiResult<Body>,
}

// ============================================================================
// Route Table
// ============================================================================

pub const ROUTES: &[ProxyRoute] = &[
    // Status
    ProxyRoute {
        handler: "status_queue_state",
        path: "/status_queue_state",
        upstream: "/api/status_queue_state",
        label: "status_queue_state service",
        build: empty,
    },
    ProxyRoute {
        handler: "queue_pause",
        path: "/status_queue_pause",
        upstream: "/api/status_queue_pause",
        label: "status_queue_pause service",
        build: empty,
    },
    ProxyRoute {
        handler: "queue_resume",
        path: "/status_queue_resume",
        upstream: "/api/status_queue_resume",
        label: "status_queue_resume service",
        build: empty,
    },
    ProxyRoute {
        handler: "status_conversation_timeline",
        path: "/status_conversation_timeline",
        upstream: "/api/status_conversation_timeline",
        label: "status_conversation_timeline service",
        build: |p| {
            Ok(present(
                p,
                &[
                    "group_id",
                    "conversation_type",
                    "instructions_key",
                    "states",
                    "hours_back",
                    "interval",
                    "aggregation_levels",
                ],
            ))
        },
    },
    // Groups
    ProxyRoute {
        handler: "groups_list",
        path: "/groups_list",
        upstream: "/api/groups/list",
        label: "groups/list",
        build: empty,
    },
    ProxyRoute {
        handler: "groups_get",
        path: "/groups_get",
        upstream: "/api/groups/get",
        label: "groups/get",
        build: |p| {
            p.require("group_id")?;
            Ok(fields(p, &["group_id"]))
        },
    },
    ProxyRoute {
        handler: "groups_add",
        path: "/groups_add",
        upstream: "/api/groups/add",
        label: "groups/add",
        build: |p| {
            p.require("group_name")?;
            let mut body = fields(p, &["group_name", "group_key"]);
            body.insert("description".to_string(), p.get("group_description"));
            Ok(body)
        },
    },
    ProxyRoute {
        handler: "groups_delete",
        path: "/groups_delete",
        upstream: "/api/groups/delete",
        label: "groups/delete",
        build: |p| {
            p.require("group_id")?;
            Ok(fields(p, &["group_id"]))
        },
    },
    ProxyRoute {
        handler: "groups_update",
        path: "/groups_update",
        upstream: "/api/groups/update",
        label: "groups/update",
        build: |p| {
            p.require("group_id")?;
            Ok(fields(p, &["group_id", "group_name", "group_description"]))
        },
    },
    // Instructions
    ProxyRoute {
        handler: "instructions_list",
        path: "/instructions_list",
        upstream: "/api/instructions/list",
        label: "instructions/list",
        build: |p| {
            p.require("group_id")?;
            let mut body = fields(p, &["group_id"]);
            body.extend(truthy(p, &["conversation_type"]));
            Ok(body)
        },
    },
    ProxyRoute {
        handler: "instructions_delete",
        path: "/instructions_delete",
        upstream: "/api/instructions/delete",
        label: "instructions/delete",
        build: |p| {
            require_all(p, &["group_id", "instructions_key"])?;
            Ok(fields(p, &["group_id", "instructions_key"]))
        },
    },
    ProxyRoute {
        handler: "instructions_add",
        path: "/instructions_add",
        upstream: "/api/instructions/add",
        label: "instructions/add",
        build: |p| {
            require_all(p, &["group_id", "instructions", "feedback_def", "info"])?;
            Ok(fields(
                p,
                &[
                    "group_id",
                    "instructions_key",
                    "instructions",
                    "feedback_def",
                    "info",
                ],
            ))
        },
    },
    ProxyRoute {
        handler: "instructions_update",
        path: "/instructions_update",
        upstream: "/api/instructions/update",
        label: "instructions/update",
        build: |p| {
            let names = [
                "group_id",
                "instructions_key",
                "instructions",
                "feedback_def",
                "info",
            ];
            require_all(p, &names)?;
            Ok(fields(p, &names))
        },
    },
    // Members
    ProxyRoute {
        handler: "get_members",
        path: "/members_list",
        upstream: "/api/members/list",
        label: "members/list",
        build: |p| {
            p.require("group_id")?;
            Ok(fields(p, &["group_id"]))
        },
    },
    ProxyRoute {
        handler: "members_add",
        path: "/members_add",
        upstream: "/api/members/add",
        label: "members/add",
        build: |p| {
            p.require("group_id")?;
            p.require("members_profiles")
                .map_err(|_| ApiError::missing("members"))?;
            Ok(fields(p, &["group_id", "members_profiles"]))
        },
    },
    ProxyRoute {
        handler: "members_conversations_list",
        path: "/members_conversations_list",
        upstream: "/api/members/conversations/list",
        label: "members/conversations/list",
        build: |p| {
            let names = ["group_id", "member_nick_name"];
            require_all(p, &names)?;
            let mut body = fields(p, &names);
            body.extend(truthy(p, &["conversation_type", "only_last"]));
            Ok(body)
        },
    },
    // Conversations
    ProxyRoute {
        handler: "conversation_add",
        path: "/conversations_add",
        upstream: "/api/conversations/add",
        label: "conversation service",
        build: |p| {
            require_all(p, &["group_id", "instructions_key"])?;
            let mut body = fields(
                p,
                &[
                    "group_id",
                    "participant_members_nick_names",
                    "instructions_key",
                    "conversation_type",
                ],
            );
            body.insert("max_messages".to_string(), p.get_or("max_messages", json!(10)));
            body.insert("debug".to_string(), p.get_or("debug", json!([])));
            Ok(body)
        },
    },
    ProxyRoute {
        handler: "conversations_messages_list",
        path: "/conversations_messages_list",
        upstream: "/api/conversations/messages/list",
        label: "conversations/messages/list service",
        build: |p| {
            p.require("conversation_id")?;
            Ok(fields(p, &["conversation_id"]))
        },
    },
];

// ============================================================================
// Payload Builders
// ============================================================================

fn empty(_: &JsonPayload) -> ApiResult<Body> {
    Ok(Body::new())
}

/// Check required fields in order; the first missing one is reported.
fn require_all(payload: &JsonPayload, names: &[&str]) -> ApiResult<()> {
    names
        .iter()
        .try_for_each(|name| payload.require(name).map(|_| ()))
}

/// Copy fields, sending `null` for absent ones.
fn fields(payload: &JsonPayload, names: &[&str]) -> Body {
    names
        .iter()
        .map(|name| (name.to_string(), payload.get(name)))
        .collect()
}

/// Copy the fields that are present and not `null`.
fn present(payload: &JsonPayload, names: &[&str]) -> Body {
    names
        .iter()
        .filter_map(|name| {
            payload
                .0
                .get(*name)
                .filter(|v| !v.is_null())
                .map(|v| (name.to_string(), v.clone()))
        })
        .collect()
}

/// Copy the fields that are present and truthy.
fn truthy(payload: &JsonPayload, names: &[&str]) -> Body {
    names
        .iter()
        .filter_map(|name| {
            payload
                .get_truthy(name)
                .map(|v| (name.to_string(), v.clone()))
        })
        .collect()
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Conversations tool - group, member, instruction and conversation
/// management through the upstream service.
pub struct ConversationsTool {
    upstream: UpstreamConfig,
}

/// Optional query parameters accepted by every proxy route.
#[derive(Debug, Default, Deserialize)]
struct ProxyQuery {
    member_id: Option<String>,
}

#[derive(Clone)]
struct ProxyState {
    client: Arc<UpstreamClient>,
    route: &'static ProxyRoute,
}

impl ConversationsTool {
    /// Directory name of the tool package.
    pub const TOOL_ID: &'static str = "dev-tool-conversations";

    pub fn new(upstream: UpstreamConfig) -> Self {
        Self { upstream }
    }
}

impl ToolPlugin for ConversationsTool {
    fn tool_id(&self) -> &'static str {
        Self::TOOL_ID
    }

    fn register_routes(&self, scope: &mut RouteScope) -> Result<(), ToolError> {
        let client = UpstreamClient::new(
            &self.upstream.base_url,
            Some(self.upstream.token.clone()),
            self.upstream.timeout(),
        )
        .map_err(|e| ToolError::registration_failed(e.to_string()))?;
        let client = Arc::new(client);

        for route in ROUTES {
            let state = ProxyState {
                client: client.clone(),
                route,
            };
            scope.route(route.handler, route.path, post(proxy).with_state(state))?;
        }
        Ok(())
    }
}

#[instrument(skip_all, fields(handler))]
async fn proxy(
    State(state): State<ProxyState>,
    query: Result<Query<ProxyQuery>, QueryRejection>,
    payload: JsonPayload,
) -> ApiResult {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let route = state.route;
    tracing::Span::current().record("handler", route.handler);
    let body = (route.build)(&payload)?;

    let reply = state
        .client
        .forward(
            route.label,
            route.upstream,
            &Value::Object(body),
            query.member_id.as_deref(),
        )
        .await?;
    Ok(relay(reply))
}
