//! `get_capabilities` report.

use aidmcp_core::{AiAction, OutputFormat};
use aidmcp_execution::QueueStatus;
use serde_json::{json, Map, Value};

use crate::catalog::{ToolCategory, ToolKind};
use crate::config::ServerConfig;
use crate::protocol::MCP_VERSION;

/// Languages `aid` can distill.
pub const SUPPORTED_LANGUAGES: [&str; 12] = [
    "Python",
    "TypeScript",
    "JavaScript",
    "Go",
    "Java",
    "C#",
    "Rust",
    "Ruby",
    "Swift",
    "Kotlin",
    "PHP",
    "C++",
];

/// Build the capabilities report.
pub fn report(config: &ServerConfig, queue: &QueueStatus) -> Value {
    let root_path = config
        .working_dir
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string());

    let mut tools = Map::new();
    for category in ToolCategory::ALL {
        let entries: Vec<String> = ToolKind::ALL
            .iter()
            .filter(|tool| tool.category() == category)
            .map(|tool| format!("{} - {}", tool.name(), tool.summary()))
            .collect();
        tools.insert(category.as_str().to_string(), json!(entries));
    }

    let (workflows, prompts): (Vec<AiAction>, Vec<AiAction>) =
        AiAction::ALL.iter().copied().partition(|a| a.is_workflow());

    json!({
        "server_name": config.server_name,
        "server_version": config.version,
        "protocol_version": MCP_VERSION,
        "root_path": root_path,
        "binary": config.binary.to_string_lossy(),
        "tools": tools,
        "supported_languages": SUPPORTED_LANGUAGES,
        "supported_formats": OutputFormat::ALL.iter().map(|f| f.as_str()).collect::<Vec<_>>(),
        "ai_actions": {
            "prompts": prompts.iter().map(|a| a.as_str()).collect::<Vec<_>>(),
            "workflows": workflows.iter().map(|a| a.as_str()).collect::<Vec<_>>(),
        },
        "features": [
            "Request queuing for concurrent access",
            "Automatic language detection",
            "Granular visibility control",
            "Pattern-based file filtering",
            "Multiple output formats",
            "AI-powered analysis prompts",
            "Comprehensive documentation generation"
        ],
        "queue": {
            "state": queue.state,
            "current_job": queue.current.as_ref().map(|id| id.to_string()),
            "accepted": queue.accepted,
            "succeeded": queue.succeeded,
            "failed": queue.failed,
            "job_timeout_secs": config.job_timeout.map(|t| t.as_secs()),
        }
    })
}
