//! Tool discovery: scan a root directory and build a [`ToolRegistry`].
//!
//! Each immediate subdirectory is a candidate tool package. Candidates that
//! fail validation are logged and skipped; a failed route registration leaves
//! the tool listed without endpoints. Nothing here returns an error to the
//! caller, so one broken tool never keeps the others from loading.

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use super::descriptor::ToolDescriptor;
use super::error::ToolError;
use super::plugin::{PluginCatalog, ToolPlugin};
use super::registry::{RegisteredTool, ToolRegistry};
use super::scope::{RouteScope, ToolRoutes};
use crate::core::security::validate_segment;

/// File every tool package must provide; its JSON object is the descriptor.
pub const ENTRY_POINT: &str = "tool.json";

/// Optional per-tool environment file, loaded before registration.
pub const ENV_FILE: &str = ".env";

/// Whether a discovery pass reads per-tool [`ENV_FILE`]s.
///
/// Loading an env file sets process environment variables, which is only
/// sound while no other thread reads the environment. Only the startup pass
/// loads them; a refresh on a serving process skips them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvFiles {
    Load,
    Skip,
}

/// Ids that would shadow host routes under `/api/`.
pub const RESERVED_IDS: [&str; 2] = ["tools", "health"];

/// Run one full discovery pass over `tools_dir`.
#[instrument(skip(catalog), fields(tools_dir = %tools_dir.display()))]
pub fn discover(tools_dir: &Path, catalog: &PluginCatalog, env_files: EnvFiles) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    let entries = match fs::read_dir(tools_dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!("{}: {}", ToolError::RootMissing(tools_dir.to_path_buf()), e);
            return registry;
        }
    };

    let mut dirs: Vec<_> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                warn!("Error reading entry: {}", e);
                None
            }
        })
        .collect();
    dirs.sort();

    for dir in dirs {
        let Some(tool_id) = candidate_id(&dir) else {
            debug!("Skipping {} (not a tool directory)", dir.display());
            continue;
        };

        let descriptor = match load_descriptor(&dir) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!("Skipping tool {}: {}", tool_id, e);
                continue;
            }
        };

        match env_files {
            EnvFiles::Load => load_tool_env(&tool_id, &dir),
            EnvFiles::Skip if dir.join(ENV_FILE).is_file() => {
                debug!("Not reloading {} of tool {} after startup", ENV_FILE, tool_id);
            }
            EnvFiles::Skip => {}
        }

        let routes = match catalog.get(&tool_id) {
            Some(plugin) => match register_plugin(&tool_id, &dir, plugin) {
                Ok(routes) => {
                    info!(
                        "Registered {} endpoint(s) for tool: {}",
                        routes.endpoints().len(),
                        tool_id
                    );
                    Some(routes)
                }
                Err(e) => {
                    error!("Failed to register routes for tool {}: {}", tool_id, e);
                    None
                }
            },
            None => {
                debug!("No route plugin for tool: {}", tool_id);
                None
            }
        };

        registry.insert(
            tool_id.clone(),
            RegisteredTool::new(descriptor, dir, routes),
        );
    }

    info!("Discovered {} tool(s)", registry.len());
    registry
}

/// The tool id for a candidate directory, or `None` if it is not one.
fn candidate_id(dir: &Path) -> Option<String> {
    if !dir.is_dir() {
        return None;
    }

    let name = dir.file_name()?.to_str()?;
    if name.starts_with('_') || name.starts_with('.') {
        return None;
    }

    if RESERVED_IDS.contains(&name) {
        warn!("{}", ToolError::InvalidId(format!("'{name}' is reserved")));
        return None;
    }

    match validate_segment(name) {
        Ok(id) => Some(id.to_string()),
        Err(e) => {
            warn!("{}", ToolError::InvalidId(e.to_string()));
            None
        }
    }
}

/// Read and validate a tool package's descriptor.
pub fn load_descriptor(dir: &Path) -> Result<ToolDescriptor, ToolError> {
    let entry_point = dir.join(ENTRY_POINT);
    if !entry_point.is_file() {
        return Err(ToolError::EntryPointMissing(entry_point));
    }

    let raw = fs::read_to_string(&entry_point)
        .map_err(|e| ToolError::unreadable(&entry_point, e))?;
    let value: Value =
        serde_json::from_str(&raw).map_err(|e| ToolError::unreadable(&entry_point, e))?;

    ToolDescriptor::from_value(value)
}

fn load_tool_env(tool_id: &str, dir: &Path) {
    let env_file = dir.join(ENV_FILE);
    if !env_file.is_file() {
        return;
    }
    match dotenvy::from_path(&env_file) {
        Ok(()) => info!("Loaded environment variables for tool: {}", tool_id),
        Err(e) => warn!("Failed to load {} for tool {}: {}", ENV_FILE, tool_id, e),
    }
}

/// Run a plugin's registration in a fresh scope.
///
/// A panic inside the plugin is contained and reported as a registration
/// failure; the partially filled scope is dropped.
pub fn register_plugin(
    tool_id: &str,
    dir: &Path,
    plugin: &dyn ToolPlugin,
) -> Result<ToolRoutes, ToolError> {
    let mut scope = RouteScope::new(tool_id, dir);

    match panic::catch_unwind(AssertUnwindSafe(|| plugin.register_routes(&mut scope))) {
        Ok(Ok(())) => Ok(scope.finish()),
        Ok(Err(e)) => Err(e),
        Err(payload) => Err(ToolError::registration_failed(panic_message(
            payload.as_ref(),
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use http_body_util::BodyExt;
    use serde_json::json;
    use tempfile::TempDir;
    use tower::ServiceExt;

    pub(crate) fn write_tool(root: &Path, id: &str, descriptor: Value) {
        let dir = root.join(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(ENTRY_POINT), descriptor.to_string()).unwrap();
    }

    pub(crate) fn descriptor(name: &str) -> Value {
        json!({
            "name": name,
            "description": format!("{name} tool"),
            "category": "utility",
            "icon": "🔧",
        })
    }

    /// Registers one handler literally named `get_members`, answering with
    /// its own tool id.
    pub(crate) struct MembersPlugin(pub &'static str);

    impl ToolPlugin for MembersPlugin {
        fn tool_id(&self) -> &'static str {
            self.0
        }

        fn register_routes(&self, scope: &mut RouteScope) -> Result<(), ToolError> {
            let id = self.0;
            scope.route("get_members", "/members", get(move || async move { id }))?;
            Ok(())
        }
    }

    struct FailingPlugin;

    impl ToolPlugin for FailingPlugin {
        fn tool_id(&self) -> &'static str {
            "failing"
        }

        fn register_routes(&self, scope: &mut RouteScope) -> Result<(), ToolError> {
            scope.route("ok", "/ok", get(|| async { "ok" }))?;
            Err(ToolError::registration_failed("members.json missing"))
        }
    }

    struct PanickingPlugin;

    impl ToolPlugin for PanickingPlugin {
        fn tool_id(&self) -> &'static str {
            "panicking"
        }

        fn register_routes(&self, _scope: &mut RouteScope) -> Result<(), ToolError> {
            panic!("plugin bug");
        }
    }

    async fn call(registry: &ToolRegistry, id: &str, uri: &str) -> (StatusCode, String) {
        let router = registry.get(id).unwrap().router().unwrap().clone();
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_missing_root_yields_empty_registry() {
        let temp = TempDir::new().unwrap();
        let registry = discover(&temp.path().join("nope"), &PluginCatalog::new(), EnvFiles::Load);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_valid_tools_are_keyed_by_directory_name() {
        let temp = TempDir::new().unwrap();
        write_tool(temp.path(), "dev-tool-a", descriptor("A"));
        write_tool(temp.path(), "dev-tool-b", descriptor("B"));

        let registry = discover(temp.path(), &PluginCatalog::new(), EnvFiles::Load);
        assert_eq!(registry.tool_ids(), ["dev-tool-a", "dev-tool-b"]);
        assert_eq!(registry.get("dev-tool-b").unwrap().descriptor().name(), "B");
    }

    #[test]
    fn test_invalid_candidates_are_skipped() {
        let temp = TempDir::new().unwrap();
        write_tool(temp.path(), "good", descriptor("Good"));
        write_tool(temp.path(), "_private", descriptor("Private"));
        write_tool(temp.path(), "tools", descriptor("Reserved"));
        fs::create_dir_all(temp.path().join("no-entry-point")).unwrap();
        fs::write(temp.path().join("loose-file.json"), "{}").unwrap();

        let broken = temp.path().join("broken-json");
        fs::create_dir_all(&broken).unwrap();
        fs::write(broken.join(ENTRY_POINT), "{not json").unwrap();

        let mut missing_icon = descriptor("NoIcon");
        missing_icon.as_object_mut().unwrap().remove("icon");
        write_tool(temp.path(), "missing-icon", missing_icon);

        let mut empty_name = descriptor("x");
        empty_name["name"] = json!("");
        write_tool(temp.path(), "empty-name", empty_name);

        write_tool(temp.path(), "not-object", json!(["name"]));

        let registry = discover(temp.path(), &PluginCatalog::new(), EnvFiles::Load);
        assert_eq!(registry.tool_ids(), ["good"]);
    }

    #[tokio::test]
    async fn test_same_handler_name_in_two_tools_does_not_collide() {
        let temp = TempDir::new().unwrap();
        write_tool(temp.path(), "tool-a", descriptor("A"));
        write_tool(temp.path(), "tool-b", descriptor("B"));
        let catalog = PluginCatalog::new()
            .with_plugin(MembersPlugin("tool-a"))
            .with_plugin(MembersPlugin("tool-b"));

        let registry = discover(temp.path(), &catalog, EnvFiles::Load);

        let a = registry.get("tool-a").unwrap().endpoints();
        let b = registry.get("tool-b").unwrap().endpoints();
        assert_eq!(a[0].id, "tool-a.get_members");
        assert_eq!(b[0].id, "tool-b.get_members");

        assert_eq!(
            call(&registry, "tool-a", "/api/tool-a/members").await,
            (StatusCode::OK, "tool-a".to_string())
        );
        assert_eq!(
            call(&registry, "tool-b", "/api/tool-b/members").await,
            (StatusCode::OK, "tool-b".to_string())
        );
    }

    #[test]
    fn test_failed_registration_keeps_tool_without_routes() {
        let temp = TempDir::new().unwrap();
        write_tool(temp.path(), "failing", descriptor("Failing"));
        write_tool(temp.path(), "panicking", descriptor("Panicking"));
        write_tool(temp.path(), "tool-a", descriptor("A"));
        let catalog = PluginCatalog::new()
            .with_plugin(FailingPlugin)
            .with_plugin(PanickingPlugin)
            .with_plugin(MembersPlugin("tool-a"));

        let registry = discover(temp.path(), &catalog, EnvFiles::Load);

        assert_eq!(registry.len(), 3);
        assert!(registry.get("failing").unwrap().router().is_none());
        assert!(registry.get("panicking").unwrap().router().is_none());
        assert!(registry.get("tool-a").unwrap().router().is_some());
    }

    #[test]
    fn test_register_plugin_reports_panic() {
        let temp = TempDir::new().unwrap();
        let err = register_plugin("panicking", temp.path(), &PanickingPlugin).unwrap_err();
        assert!(err.to_string().contains("plugin bug"), "{err}");
    }

    #[test]
    fn test_tool_env_file_is_loaded() {
        let temp = TempDir::new().unwrap();
        write_tool(temp.path(), "with-env", descriptor("Env"));
        fs::write(
            temp.path().join("with-env").join(ENV_FILE),
            "DEVTOOLS_DISCOVERY_TEST_VAR=loaded\n",
        )
        .unwrap();

        discover(temp.path(), &PluginCatalog::new(), EnvFiles::Load);
        assert_eq!(
            std::env::var("DEVTOOLS_DISCOVERY_TEST_VAR").as_deref(),
            Ok("loaded")
        );
    }

    #[test]
    fn test_tool_env_file_is_skipped_on_request() {
        let temp = TempDir::new().unwrap();
        write_tool(temp.path(), "with-env", descriptor("Env"));
        fs::write(
            temp.path().join("with-env").join(ENV_FILE),
            "DEVTOOLS_DISCOVERY_SKIPPED_VAR=loaded\n",
        )
        .unwrap();

        let registry = discover(temp.path(), &PluginCatalog::new(), EnvFiles::Skip);
        assert_eq!(registry.tool_ids(), ["with-env"]);
        assert!(std::env::var("DEVTOOLS_DISCOVERY_SKIPPED_VAR").is_err());
    }
}
