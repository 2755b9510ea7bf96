//! Tool plugins and the compiled-in catalog that holds them.

use std::collections::BTreeMap;

use super::error::ToolError;
use super::scope::RouteScope;

/// Route-registration entry point of a tool package.
///
/// Implementations are linked into the binary and matched to tool directories
/// by id. A tool directory with no matching plugin is still listed; it just
/// exposes no endpoints.
pub trait ToolPlugin: Send + Sync {
    /// Directory name of the tool package this plugin serves.
    fn tool_id(&self) -> &'static str;

    /// Declare the tool's routes. Called once per discovery pass.
    fn register_routes(&self, scope: &mut RouteScope) -> Result<(), ToolError>;
}

/// Plugins available to discovery, keyed by tool id.
#[derive(Default)]
pub struct PluginCatalog {
    plugins: BTreeMap<&'static str, Box<dyn ToolPlugin>>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin, replacing any earlier plugin with the same id.
    pub fn with_plugin(mut self, plugin: impl ToolPlugin + 'static) -> Self {
        self.plugins.insert(plugin.tool_id(), Box::new(plugin));
        self
    }

    pub fn get(&self, tool_id: &str) -> Option<&dyn ToolPlugin> {
        self.plugins.get(tool_id).map(|p| p.as_ref())
    }

    pub fn tool_ids(&self) -> Vec<&'static str> {
        self.plugins.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.plugins.keys()).finish()
    }
}
