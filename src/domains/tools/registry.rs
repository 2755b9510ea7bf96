//! Tool Registry - the validated tools of one discovery pass.
//!
//! A registry is built once and never edited afterwards. The manager swaps
//! in a new registry on refresh, so readers holding an `Arc<ToolRegistry>`
//! always see one complete pass.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use axum::Router;

use super::descriptor::ToolDescriptor;
use super::scope::{Endpoint, ToolRoutes};

/// One validated tool and whatever routes it managed to register.
#[derive(Debug, Clone)]
pub struct RegisteredTool {
    descriptor: ToolDescriptor,
    dir: PathBuf,
    routes: Option<ToolRoutes>,
}

impl RegisteredTool {
    pub fn new(descriptor: ToolDescriptor, dir: PathBuf, routes: Option<ToolRoutes>) -> Self {
        Self {
            descriptor,
            dir,
            routes,
        }
    }

    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn router(&self) -> Option<&Router> {
        self.routes.as_ref().map(ToolRoutes::router)
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        self.routes.as_ref().map(ToolRoutes::endpoints).unwrap_or(&[])
    }
}

/// Tool id → validated tool. Failed tools are absent, never present empty.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, RegisteredTool>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, tool_id: String, tool: RegisteredTool) {
        self.tools.insert(tool_id, tool);
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn get(&self, tool_id: &str) -> Option<&RegisteredTool> {
        self.tools.get(tool_id)
    }

    pub fn contains(&self, tool_id: &str) -> bool {
        self.tools.contains_key(tool_id)
    }

    /// Get all tool ids, in order.
    pub fn tool_ids(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegisteredTool)> {
        self.tools.iter().map(|(id, tool)| (id.as_str(), tool))
    }

    /// Descriptors keyed by tool id. Ordered, so repeated listings of the
    /// same registry serialize identically.
    pub fn descriptors(&self) -> BTreeMap<&str, &ToolDescriptor> {
        self.iter().map(|(id, tool)| (id, tool.descriptor())).collect()
    }
}
