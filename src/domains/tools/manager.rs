//! Tool Manager - owns the current registry and rebuilds it on refresh.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::info;

use super::discovery::{EnvFiles, discover};
use super::plugin::PluginCatalog;
use super::registry::ToolRegistry;
use crate::core::Result;

/// Process-wide tool state.
///
/// Readers take an immutable snapshot with [`ToolManager::snapshot`]. A
/// refresh runs a full discovery pass off the async runtime and then swaps
/// the snapshot in one write, so a reader sees either the old or the new
/// registry, never a mix. Refreshes are serialized by a single-writer lock.
///
/// Per-tool `.env` files are read by the startup pass only. A refresh runs
/// while handlers may be reading the process environment, so it never sets
/// environment variables; picking up an edited `.env` needs a restart.
pub struct ToolManager {
    tools_dir: PathBuf,
    catalog: Arc<PluginCatalog>,
    current: RwLock<Arc<ToolRegistry>>,
    refresh_lock: Mutex<()>,
}

impl ToolManager {
    /// Create a manager and run the initial discovery pass.
    ///
    /// This blocks on file system access; call it at startup, before the
    /// server starts accepting requests.
    pub fn load(tools_dir: impl Into<PathBuf>, catalog: PluginCatalog) -> Self {
        let tools_dir = tools_dir.into();
        let registry = discover(&tools_dir, &catalog, EnvFiles::Load);
        info!("Available tools: {:?}", registry.tool_ids());

        Self {
            tools_dir,
            catalog: Arc::new(catalog),
            current: RwLock::new(Arc::new(registry)),
            refresh_lock: Mutex::new(()),
        }
    }

    /// The current registry.
    pub async fn snapshot(&self) -> Arc<ToolRegistry> {
        self.current.read().await.clone()
    }

    /// Discard the current registry and rediscover from scratch.
    pub async fn refresh(&self) -> Result<Arc<ToolRegistry>> {
        let _writer = self.refresh_lock.lock().await;

        let tools_dir = self.tools_dir.clone();
        let catalog = self.catalog.clone();
        let registry =
            tokio::task::spawn_blocking(move || discover(&tools_dir, &catalog, EnvFiles::Skip))
                .await?;

        let registry = Arc::new(registry);
        *self.current.write().await = registry.clone();
        info!("Tools refreshed: {:?}", registry.tool_ids());

        Ok(registry)
    }
}

impl std::fmt::Debug for ToolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolManager")
            .field("tools_dir", &self.tools_dir)
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::discovery::tests::{MembersPlugin, descriptor, write_tool};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_refresh_picks_up_new_tool() {
        let temp = TempDir::new().unwrap();
        write_tool(temp.path(), "tool-a", descriptor("A"));
        let manager = ToolManager::load(temp.path(), PluginCatalog::new());
        assert_eq!(manager.snapshot().await.tool_ids(), ["tool-a"]);

        write_tool(temp.path(), "tool-b", descriptor("B"));
        assert_eq!(manager.snapshot().await.len(), 1);

        let refreshed = manager.refresh().await.unwrap();
        assert_eq!(refreshed.tool_ids(), ["tool-a", "tool-b"]);
        assert_eq!(manager.snapshot().await.tool_ids(), ["tool-a", "tool-b"]);
    }

    #[tokio::test]
    async fn test_refresh_drops_removed_tool_and_keeps_old_snapshot_intact() {
        let temp = TempDir::new().unwrap();
        write_tool(temp.path(), "tool-a", descriptor("A"));
        write_tool(temp.path(), "tool-b", descriptor("B"));
        let manager = ToolManager::load(
            temp.path(),
            PluginCatalog::new().with_plugin(MembersPlugin("tool-b")),
        );
        let before = manager.snapshot().await;

        std::fs::remove_dir_all(temp.path().join("tool-b")).unwrap();
        let after = manager.refresh().await.unwrap();

        assert_eq!(after.tool_ids(), ["tool-a"]);
        assert_eq!(before.tool_ids(), ["tool-a", "tool-b"]);
        assert!(before.get("tool-b").unwrap().router().is_some());
    }

    #[tokio::test]
    async fn test_refresh_re_registers_routes() {
        let temp = TempDir::new().unwrap();
        write_tool(temp.path(), "tool-a", descriptor("A"));
        let manager = ToolManager::load(
            temp.path(),
            PluginCatalog::new().with_plugin(MembersPlugin("tool-a")),
        );

        let refreshed = manager.refresh().await.unwrap();
        let endpoints = refreshed.get("tool-a").unwrap().endpoints();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].path, "/api/tool-a/members");
    }

    #[tokio::test]
    async fn test_refresh_does_not_touch_environment() {
        let temp = TempDir::new().unwrap();
        write_tool(temp.path(), "tool-a", descriptor("A"));
        let manager = ToolManager::load(temp.path(), PluginCatalog::new());

        std::fs::write(
            temp.path().join("tool-a").join(".env"),
            "DEVTOOLS_MANAGER_REFRESH_VAR=late\n",
        )
        .unwrap();
        let refreshed = manager.refresh().await.unwrap();

        assert_eq!(refreshed.tool_ids(), ["tool-a"]);
        assert!(std::env::var("DEVTOOLS_MANAGER_REFRESH_VAR").is_err());
    }
}
