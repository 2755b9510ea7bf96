//! Tools domain module.
//!
//! Discovers tool packages on disk, validates their descriptors and mounts
//! the routes their plugins declare under `/api/<tool-id>`.
//!
//! ## Architecture
//!
//! - `descriptor.rs` - `tool.json` validation
//! - `discovery.rs` - one scan of the tools directory
//! - `registry.rs` - the immutable result of a scan
//! - `manager.rs` - current registry snapshot and refresh
//! - `plugin.rs` - the `ToolPlugin` trait and the compiled-in catalog
//! - `scope.rs` - per-tool route registration
//! - `assets.rs` - panel listing and import resolution
//! - `handlers.rs` - JSON envelope and error mapping for endpoints
//! - `definitions/` - the tool plugins (one file per tool)
//! - `router.rs` - catalog builder
//!
//! ## Adding a New Tool
//!
//! 1. Create the package directory under the tools root with a `tool.json`
//! 2. Implement `ToolPlugin` in a new file in `definitions/`
//! 3. Add it to the catalog in `router.rs`
//!
//! A package without a plugin is still listed; it just has no endpoints.

pub mod assets;
pub mod definitions;
mod descriptor;
pub mod discovery;
mod error;
mod handlers;
mod manager;
mod plugin;
mod registry;
pub mod router;
mod scope;

pub use descriptor::{REQUIRED_KEYS, ToolDescriptor};
pub use error::ToolError;
pub use handlers::*;
pub use manager::ToolManager;
pub use plugin::{PluginCatalog, ToolPlugin};
pub use registry::{RegisteredTool, ToolRegistry};
pub use router::build_plugin_catalog;
pub use scope::{Endpoint, RouteScope, ToolRoutes};
