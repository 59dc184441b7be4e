//! aid-mcp - exposes the `aid` code distiller to AI agents over MCP.
//!
//! Each `tools/call` becomes one `aid` invocation; invocations run one at a
//! time, in arrival order, through the execution queue.

pub mod capabilities;
pub mod catalog;
pub mod config;
pub mod error;
pub mod files;
pub mod logging;
pub mod protocol;
pub mod server;

pub use catalog::{McpTool, ToolKind};
pub use config::ServerConfig;
pub use error::ToolCallError;
pub use protocol::MCP_VERSION;
pub use server::McpServer;
