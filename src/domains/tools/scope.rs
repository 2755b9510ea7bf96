//! Scoped route registration.
//!
//! Every tool registers into its own [`RouteScope`], which owns a private
//! axum [`Router`] and prefixes each declared path with the tool's base path.
//! Endpoint identifiers are qualified with the tool id, so two tools may use
//! the same handler name without touching each other's routes. Nothing global
//! is mutated during registration.

use std::path::{Path, PathBuf};

use axum::{Router, routing::MethodRouter};
use serde::Serialize;

use super::error::ToolError;
use super::handlers::{ApiError, method_not_allowed};

/// A route a tool declared, as seen from outside the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    /// Qualified identifier: `<tool-id>.<handler>`.
    pub id: String,
    /// Full request path, including the tool's base path.
    pub path: String,
}

/// The routes a tool ended up with after registration.
#[derive(Clone)]
pub struct ToolRoutes {
    router: Router,
    endpoints: Vec<Endpoint>,
}

impl ToolRoutes {
    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }
}

impl std::fmt::Debug for ToolRoutes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRoutes")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

/// Registration context handed to a tool plugin for one registration call.
pub struct RouteScope {
    tool_id: String,
    base_path: String,
    tool_dir: PathBuf,
    router: Router,
    endpoints: Vec<Endpoint>,
}

impl std::fmt::Debug for RouteScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteScope")
            .field("tool_id", &self.tool_id)
            .field("tool_dir", &self.tool_dir)
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

impl RouteScope {
    pub fn new(tool_id: impl Into<String>, tool_dir: impl Into<PathBuf>) -> Self {
        let tool_id = tool_id.into();
        Self {
            base_path: format!("/api/{tool_id}"),
            tool_id,
            tool_dir: tool_dir.into(),
            router: Router::new(),
            endpoints: Vec::new(),
        }
    }

    pub fn tool_id(&self) -> &str {
        &self.tool_id
    }

    /// Prefix under which every route of this tool is mounted.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// The tool package directory, for tools that ship data files.
    pub fn tool_dir(&self) -> &Path {
        &self.tool_dir
    }

    /// Declare a route under the tool's base path.
    ///
    /// `handler` names the endpoint inside this tool and must be unique
    /// within the scope; `path` is relative to the base path and must start
    /// with `/`. Handlers that need state attach it with
    /// `MethodRouter::with_state` before calling this.
    pub fn route(
        &mut self,
        handler: &str,
        path: &str,
        method_router: MethodRouter,
    ) -> Result<&mut Self, ToolError> {
        if !path.starts_with('/') {
            return Err(ToolError::registration_failed(format!(
                "route path '{path}' for handler '{handler}' must start with '/'"
            )));
        }

        let id = format!("{}.{}", self.tool_id, handler);
        if self.endpoints.iter().any(|e| e.id == id) {
            return Err(ToolError::DuplicateEndpoint(id));
        }

        let full_path = format!("{}{}", self.base_path, path);
        self.router = std::mem::take(&mut self.router).route(&full_path, method_router);
        self.endpoints.push(Endpoint {
            id,
            path: full_path,
        });
        Ok(self)
    }

    /// Close the scope. Unmatched paths under the tool answer with a JSON 404
    /// and unsupported methods with a JSON 405.
    pub fn finish(self) -> ToolRoutes {
        let tool_id = self.tool_id;
        let router = self
            .router
            .fallback(move || {
                let tool_id = tool_id.clone();
                async move { ApiError::not_found(format!("no such endpoint in tool {tool_id}")) }
            })
            .method_not_allowed_fallback(method_not_allowed);

        ToolRoutes {
            router,
            endpoints: self.endpoints,
        }
    }
}
