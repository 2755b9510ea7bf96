//! Dev tools server: the application host.
//!
//! Owns the configuration and the tool manager, and answers the host-level
//! questions (which tools exist, their panels and imports, health) that the
//! transport exposes over HTTP.
//!
//! Tools are defined in `domains/tools/definitions/` and listed in the
//! catalog built by `domains/tools/router.rs`.
//! **Adding a new tool does NOT require modifying this file!**

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{info, instrument};

use super::config::Config;
use super::error::Result;
use super::security::PathSecurityError;
use crate::domains::tools::{
    Endpoint, PluginCatalog, ToolManager, ToolRegistry, assets, build_plugin_catalog,
};

/// The application host. Cheap to clone; clones share the same tools.
#[derive(Clone)]
pub struct DevToolsServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Current tools and their routes.
    tools: Arc<ToolManager>,
}

impl DevToolsServer {
    /// Create a server with the compiled-in tool plugins and run the
    /// initial discovery pass.
    pub fn new(config: Config) -> Self {
        let catalog = build_plugin_catalog(&config);
        Self::with_catalog(config, catalog)
    }

    /// Create a server with an explicit plugin catalog.
    pub fn with_catalog(config: Config, catalog: PluginCatalog) -> Self {
        let tools = ToolManager::load(config.tools.tools_dir.clone(), catalog);
        Self {
            config: Arc::new(config),
            tools: Arc::new(tools),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// The current registry snapshot.
    pub async fn registry(&self) -> Arc<ToolRegistry> {
        self.tools.snapshot().await
    }

    // ========================================================================
    // Host Endpoint Support Methods
    // ========================================================================

    /// Descriptors of all tools, keyed by tool id.
    pub async fn list_tools(&self) -> Value {
        let registry = self.registry().await;
        json!(registry.descriptors())
    }

    /// Rediscover tools. Returns the new tool count.
    #[instrument(skip(self))]
    pub async fn refresh_tools(&self) -> Result<usize> {
        let registry = self.tools.refresh().await?;
        info!("Refresh complete: {} tool(s)", registry.len());
        Ok(registry.len())
    }

    /// Number of tools in the current snapshot.
    pub async fn tools_count(&self) -> usize {
        self.registry().await.len()
    }

    /// Resolved imports of every tool, keyed by tool id.
    pub async fn resolve_imports(&self) -> BTreeMap<String, Vec<String>> {
        let registry = self.registry().await;
        let static_dir = &self.config.tools.static_dir;

        registry
            .iter()
            .map(|(id, tool)| {
                let imports = assets::resolve_imports(static_dir, id, tool.descriptor().imports());
                (id.to_string(), imports)
            })
            .collect()
    }

    /// Panel names a tool ships. Independent of whether the tool is loaded.
    pub fn list_panels(&self, tool_id: &str) -> std::result::Result<Vec<String>, PathSecurityError> {
        assets::list_panels(&self.config.tools.static_dir, tool_id)
    }

    /// Endpoints a loaded tool registered, or `None` for an unknown tool.
    pub async fn tool_endpoints(&self, tool_id: &str) -> Option<Vec<Endpoint>> {
        let registry = self.registry().await;
        registry.get(tool_id).map(|tool| tool.endpoints().to_vec())
    }
}

impl std::fmt::Debug for DevToolsServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevToolsServer")
            .field("name", &self.name())
            .field("version", &self.version())
            .field("tools", &self.tools)
            .finish()
    }
}
