//! Welcome tool definition.
//!
//! Answers with a fixed greeting and the server's local time. Makes no
//! downstream calls.

use axum::{Json, routing::get};
use chrono::{DateTime, Local, TimeZone};
use serde_json::{Value, json};
use tracing::info;

use crate::domains::tools::{RouteScope, ToolError, ToolPlugin, success};

// ============================================================================
// Tool Definition
// ============================================================================

/// Welcome tool - a hardcoded greeting from the server.
pub struct WelcomeTool;

impl WelcomeTool {
    /// Directory name of the tool package.
    pub const TOOL_ID: &'static str = "dev-tool-welcome";

    pub const MESSAGE: &'static str = "Welcome to the Dev Tools Application! 🎉";

    pub const SUBTITLE: &'static str =
        "Your comprehensive development utilities platform is ready to assist you.";

    /// Build the greeting for a given moment.
    pub fn message<Tz: TimeZone>(now: &DateTime<Tz>) -> Value
    where
        Tz::Offset: std::fmt::Display,
    {
        json!({
            "message": Self::MESSAGE,
            "subtitle": Self::SUBTITLE,
            "server_time": now.format("%B %d, %Y at %I:%M %p").to_string(),
            "status": "Server running smoothly",
            "timestamp": now.format("%Y-%m-%d").to_string(),
        })
    }

    /// `GET /message`
    async fn get_welcome_message() -> Json<Value> {
        info!("Welcome message requested");
        success(json!({ "data": Self::message(&Local::now()) }))
    }
}

impl ToolPlugin for WelcomeTool {
    fn tool_id(&self) -> &'static str {
        Self::TOOL_ID
    }

    fn register_routes(&self, scope: &mut RouteScope) -> Result<(), ToolError> {
        scope.route(
            "get_welcome_message",
            "/message",
            get(Self::get_welcome_message),
        )?;
        Ok(())
    }
}
