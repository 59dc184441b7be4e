//! MCP server.
//!
//! Reads line-delimited JSON-RPC from stdio or a Unix socket, answers the
//! MCP handshake and tool listing directly, and turns every `aid`-backed
//! tool call into one job on the shared [`ExecutionQueue`]. Requests are
//! handled concurrently; the queue serializes the processes.

use aidmcp_core::CommandBuilder;
use aidmcp_execution::{ExecutionQueue, QueueConfig};
use aidmcp_tools::{AidExecutor, Executor};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::capabilities;
use crate::catalog::{AidCall, Invocation, McpTool, ToolKind};
use crate::config::ServerConfig;
use crate::error::ToolCallError;
use crate::files;
use crate::protocol::{
    text_result, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolCallParams, JSONRPC_VERSION,
    MCP_VERSION,
};

/// aid-mcp server.
pub struct McpServer {
    /// Configuration
    config: ServerConfig,
    /// Registered tools, in listing order
    tools: Vec<McpTool>,
    /// Serializes `aid` invocations
    queue: ExecutionQueue,
}

impl McpServer {
    /// Create a server that runs the configured `aid` binary.
    ///
    /// Must be called inside a Tokio runtime; the queue worker is spawned here.
    pub fn new(config: ServerConfig) -> Self {
        let mut executor = AidExecutor::new(&config.binary);
        if let Some(dir) = &config.working_dir {
            executor = executor.with_working_dir(dir);
        }
        Self::with_executor(config, Arc::new(executor))
    }

    /// Create a server around any executor.
    pub fn with_executor(config: ServerConfig, executor: Arc<dyn Executor>) -> Self {
        let mut queue_config = QueueConfig::new();
        if let Some(timeout) = config.job_timeout {
            queue_config = queue_config.with_default_deadline(timeout);
        }

        let mut server = Self {
            queue: ExecutionQueue::with_config(executor, queue_config),
            config,
            tools: Vec::new(),
        };
        server.register_builtin_tools();
        server
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Registered tools.
    pub fn tools(&self) -> &[McpTool] {
        &self.tools
    }

    /// The execution queue shared by all connections.
    pub fn queue(&self) -> &ExecutionQueue {
        &self.queue
    }

    fn register_builtin_tools(&mut self) {
        for tool in ToolKind::ALL {
            debug!("Registered tool: {}", tool.name());
            self.tools.push(tool.definition());
        }
    }

    /// Handle one raw line; `None` when nothing should be written back.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let response = match serde_json::from_str::<Value>(line) {
            Ok(message) => self.handle_message(message).await?,
            Err(e) => parse_failure(e),
        };
        encode(&response)
    }

    /// Handle one decoded message; notifications yield `None`.
    pub async fn handle_message(&self, message: Value) -> Option<JsonRpcResponse> {
        let id = message.get("id").cloned().unwrap_or(Value::Null);

        let request: JsonRpcRequest = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    id,
                    JsonRpcError::invalid_request(e),
                ))
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::invalid_request(format!(
                    "unsupported jsonrpc version {:?}",
                    request.jsonrpc
                )),
            ));
        }

        if request.is_notification() {
            debug!("Notification: {}", request.method);
            return None;
        }

        let response = match self.handle_request(&request).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        };
        Some(response)
    }

    async fn handle_request(&self, request: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
        match request.method.as_str() {
            "initialize" => {
                let protocol_version = request
                    .params
                    .as_ref()
                    .and_then(|p| p.get("protocolVersion"))
                    .and_then(Value::as_str)
                    .unwrap_or(MCP_VERSION);
                debug!("MCP Initialize request - version: {}", protocol_version);

                Ok(json!({
                    "protocolVersion": protocol_version,
                    "capabilities": {
                        "tools": {}
                    },
                    "serverInfo": {
                        "name": self.config.server_name,
                        "version": self.config.version
                    }
                }))
            }
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.tools })),
            "tools/call" => {
                let params: ToolCallParams =
                    serde_json::from_value(request.params.clone().unwrap_or(Value::Null))
                        .map_err(JsonRpcError::invalid_params)?;

                debug!("Tool call: {} with args: {:?}", params.name, params.arguments);
                let arguments = params.arguments.unwrap_or(Value::Null);

                match self.call_tool(&params.name, arguments).await {
                    Ok(text) => Ok(text_result(text, false)),
                    Err(e) if e.is_protocol_error() => {
                        Err(JsonRpcError::new(e.code(), e.to_string()))
                    }
                    Err(e) => {
                        warn!(tool = %params.name, code = e.code(), "Tool call failed: {}", e);
                        Ok(text_result(e.to_string(), true))
                    }
                }
            }
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }

    /// Execute a tool and return the response text.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<String, ToolCallError> {
        let tool =
            ToolKind::from_name(name).ok_or_else(|| ToolCallError::UnknownTool(name.to_string()))?;

        match tool.prepare(arguments)? {
            Invocation::Aid(call) => self.run_aid(call).await,
            Invocation::ListFiles(params) => {
                let base = self.resolve(params.path.as_deref().unwrap_or("."));
                let listing = files::list_files(
                    &base,
                    params.pattern.as_deref(),
                    params.recursive.unwrap_or(true),
                )
                .await?;
                Ok(serde_json::to_string_pretty(&listing)?)
            }
            Invocation::Capabilities => {
                let report = capabilities::report(&self.config, &self.queue.status());
                Ok(serde_json::to_string_pretty(&report)?)
            }
        }
    }

    async fn run_aid(&self, call: AidCall) -> Result<String, ToolCallError> {
        let argv = CommandBuilder::build(call.request());
        info!(tool = call.tool().name(), target = call.request().target(), "Queueing aid");

        let payload = self.queue.submit(argv).await?;

        if payload.trim().is_empty() {
            warn!(
                tool = call.tool().name(),
                target = call.request().target(),
                "Empty result"
            );
            return Err(ToolCallError::EmptyOutput {
                subject: call.subject(),
            });
        }

        debug!(tool = call.tool().name(), bytes = payload.len(), "Tool call finished");
        Ok(call.render(payload))
    }

    /// Relative paths are resolved against the configured root.
    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.config.working_dir {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Serve one line-delimited JSON-RPC stream until the reader hits EOF.
    ///
    /// Every request is handled on its own task so that slow tool calls do
    /// not block `ping` or `tools/list`; responses are written in completion
    /// order. A line that is not UTF-8 gets a parse error like any other
    /// malformed line. On EOF or a read error, requests already in flight
    /// are still answered before returning.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: W) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

        let writer_task = tokio::spawn(async move {
            let mut writer = BufWriter::new(writer);
            while let Some(line) = out_rx.recv().await {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<_, std::io::Error>(())
        });

        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let mut in_flight = JoinSet::new();
        let mut read_error = None;

        loop {
            tokio::select! {
                read = reader.read_until(b'\n', &mut buf) => {
                    match read {
                        Ok(0) if buf.is_empty() => break,
                        Ok(_) => {}
                        Err(e) => {
                            error!("Failed to read from transport: {}", e);
                            read_error = Some(e);
                            break;
                        }
                    }

                    let raw = std::mem::take(&mut buf);
                    let line = match String::from_utf8(raw) {
                        Ok(line) => line,
                        Err(e) => {
                            if let Some(response) = encode(&parse_failure(e)) {
                                if out_tx.send(response).is_err() {
                                    warn!("Writer closed before response was sent");
                                }
                            }
                            continue;
                        }
                    };
                    if line.trim().is_empty() {
                        continue;
                    }

                    let server = Arc::clone(&self);
                    let out = out_tx.clone();
                    in_flight.spawn(async move {
                        if let Some(response) = server.handle_line(&line).await {
                            if out.send(response).is_err() {
                                warn!("Writer closed before response was sent");
                            }
                        }
                    });
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        error!("Request handler failed: {}", e);
                    }
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                error!("Request handler failed: {}", e);
            }
        }

        drop(out_tx);
        writer_task
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))??;

        match read_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Start with stdio transport.
    pub async fn start_with_stdio(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "Starting {} v{} (stdio transport)",
            self.config.server_name, self.config.version
        );

        self.serve(tokio::io::stdin(), tokio::io::stdout()).await?;

        info!("MCP Server stopped");
        Ok(())
    }

    /// Start with Unix socket transport.
    #[cfg(unix)]
    pub async fn start_with_socket(self: Arc<Self>, socket_path: &Path) -> anyhow::Result<()> {
        info!(
            "Starting {} v{} (socket transport at {})",
            self.config.server_name,
            self.config.version,
            socket_path.display()
        );

        // Remove existing socket file
        if socket_path.exists() {
            std::fs::remove_file(socket_path)?;
        }

        let listener = tokio::net::UnixListener::bind(socket_path)?;

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, _)) => {
                            debug!("Client connected");
                            let server = Arc::clone(&self);
                            tokio::spawn(async move {
                                let (reader, writer) = stream.into_split();
                                if let Err(e) = server.serve(reader, writer).await {
                                    error!("Connection failed: {}", e);
                                }
                                debug!("Client disconnected");
                            });
                        }
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    break;
                }
            }
        }

        if let Err(e) = std::fs::remove_file(socket_path) {
            debug!("Could not remove socket file: {}", e);
        }
        info!("MCP Server stopped");
        Ok(())
    }
}

fn parse_failure(detail: impl std::fmt::Display) -> JsonRpcResponse {
    warn!("Failed to parse request: {}", detail);
    JsonRpcResponse::failure(Value::Null, JsonRpcError::parse_error(detail))
}

fn encode(response: &JsonRpcResponse) -> Option<String> {
    match serde_json::to_string(response) {
        Ok(json) => Some(json),
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            None
        }
    }
}
