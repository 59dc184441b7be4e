//! aid-mcp - MCP server for the `aid` code distiller.
//!
//! This binary lets AI assistants drive `aid` through the Model Context
//! Protocol, over stdio (the default) or a Unix socket.

use aidmcp_server::{logging, McpServer, ServerConfig, MCP_VERSION};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "aid-mcp")]
#[command(version)]
#[command(about = "MCP server exposing the aid code distiller to AI agents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the aid binary [env: AID_BINARY]
    #[arg(long, global = true)]
    binary: Option<PathBuf>,

    /// Directory aid runs in [env: AID_ROOT]
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Per-invocation timeout in seconds, 0 disables [env: AID_MCP_TIMEOUT_SECS]
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Enable debug logging [env: AID_MCP_DEBUG]
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP Server in stdio mode (default)
    Stdio,

    /// Start MCP Server with Unix socket
    Socket {
        /// Socket path
        path: PathBuf,
    },

    /// List available tools
    ListTools,

    /// Print server info
    Info,
}

impl Cli {
    fn config(&self) -> ServerConfig {
        let mut config = ServerConfig::from_env();
        if let Some(binary) = &self.binary {
            config.binary = binary.clone();
        }
        if let Some(root) = &self.root {
            config.working_dir = Some(root.clone());
        }
        match self.timeout_secs {
            Some(0) => config.job_timeout = None,
            Some(secs) => config.job_timeout = Some(Duration::from_secs(secs)),
            None => {}
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let debug = cli.debug || ServerConfig::debug_requested(|key| std::env::var(key).ok());
    logging::init(debug)?;

    let config = cli.config();

    if config.binary.components().count() > 1 && !config.binary.exists() {
        warn!(binary = %config.binary.display(), "aid binary not found; tool calls will fail");
    }

    match cli.command.unwrap_or(Commands::Stdio) {
        Commands::Stdio => {
            let server = Arc::new(McpServer::new(config));
            server.start_with_stdio().await?;
        }

        #[cfg(unix)]
        Commands::Socket { path } => {
            let server = Arc::new(McpServer::new(config));
            server.start_with_socket(&path).await?;
        }

        #[cfg(not(unix))]
        Commands::Socket { .. } => {
            anyhow::bail!("socket transport requires a Unix platform");
        }

        Commands::ListTools => {
            let server = McpServer::new(config);
            println!("Available tools ({}):", server.tools().len());
            for tool in server.tools() {
                println!("  - {:<28} {}", tool.name, tool.title);
            }
        }

        Commands::Info => {
            let server = McpServer::new(config);
            let config = server.config();
            println!("{} v{}", config.server_name, config.version);
            println!("Protocol: MCP {}", MCP_VERSION);
            println!("Transport: stdio / Unix socket");
            println!("Binary: {}", config.binary.display());
            match &config.working_dir {
                Some(dir) => println!("Root: {}", dir.display()),
                None => println!("Root: (current directory)"),
            }
            match config.job_timeout {
                Some(timeout) => println!("Timeout: {}s", timeout.as_secs()),
                None => println!("Timeout: none"),
            }
            println!("Tools: {}", server.tools().len());
        }
    }

    info!("Shutting down");
    Ok(())
}
