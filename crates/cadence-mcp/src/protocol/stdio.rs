//! stdio Transport
//!
//! Newline-delimited JSON-RPC over stdin/stdout. Logs go to stderr so
//! stdout carries nothing but protocol frames.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, warn};

use super::types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::server::McpServer;

const FALLBACK_ERROR: &str =
    r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error"}}"#;

/// stdio transport for the MCP server
#[derive(Debug, Default)]
pub struct StdioTransport;

impl StdioTransport {
    pub fn new() -> Self {
        Self
    }

    /// Serve requests until stdin closes
    pub async fn run(self, mut server: McpServer) -> io::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            debug!("Received: {} bytes", line.len());

            let response = match serde_json::from_str::<JsonRpcRequest>(line) {
                Ok(request) => server.handle_request(request).await,
                Err(e) => {
                    warn!("Failed to parse request: {}", e);
                    Some(JsonRpcResponse::error(None, JsonRpcError::parse_error()))
                }
            };

            if let Some(response) = response {
                write_response(&mut stdout, &response).await?;
            }
        }

        debug!("stdin closed");
        Ok(())
    }
}

async fn write_response<W: AsyncWrite + Unpin>(
    out: &mut W,
    response: &JsonRpcResponse,
) -> io::Result<()> {
    let frame = match serde_json::to_string(response) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            FALLBACK_ERROR.to_string()
        }
    };
    debug!("Sending: {} bytes", frame.len());
    out.write_all(frame.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}
