//! Plugin catalog builder.
//!
//! Lists every tool plugin linked into the binary. Discovery pairs each
//! tool directory with the plugin of the same id.

use crate::core::config::Config;

use super::definitions::{ConversationsTool, FirstDateTool, SystemPerformanceTool, WelcomeTool};
use super::plugin::PluginCatalog;

/// Build the catalog of compiled-in tool plugins.
pub fn build_plugin_catalog(config: &Config) -> PluginCatalog {
    PluginCatalog::new()
        .with_plugin(WelcomeTool)
        .with_plugin(FirstDateTool::new(config.upstream.base_url.clone()))
        .with_plugin(ConversationsTool::new(config.upstream.clone()))
        .with_plugin(SystemPerformanceTool)
}
