//! Tool definitions module.
//!
//! One file per compiled-in tool plugin, plus the upstream client the proxy
//! tools share.

pub mod conversations;
pub mod first_date;
pub mod system_performance;
pub mod upstream;
pub mod welcome;

pub use conversations::ConversationsTool;
pub use first_date::FirstDateTool;
pub use system_performance::SystemPerformanceTool;
pub use upstream::{UpstreamClient, UpstreamError};
pub use welcome::WelcomeTool;
