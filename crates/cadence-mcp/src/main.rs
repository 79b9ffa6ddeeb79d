//! Cadence MCP Server - Adaptive Spaced Repetition
//!
//! Exposes the Cadence scheduling engine over the Model Context Protocol so
//! tutoring assistants can schedule reviews for their learners.
//!
//! Features:
//! - SM-2 base scheduling with due selection, forecasts and streaks
//! - Contextual interval adjustment from learner pace, competency trend,
//!   session fatigue and item metadata
//! - Optional remote scheduling backend with automatic fallback
//! - Training telemetry appended to a JSON lines file

mod protocol;
mod server;
mod tools;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use cadence_core::{
    AdaptiveDispatcher, ChannelSink, DiscardSink, EngineConfig, JsonlFileSink, TelemetryCollector,
    TelemetrySink,
};

use crate::protocol::stdio::StdioTransport;
use crate::server::McpServer;

/// Command-line options
#[derive(Debug, Default)]
struct Options {
    data_dir: Option<PathBuf>,
    remote: Option<String>,
    no_contextual: bool,
}

fn usage_error(message: &str) -> ! {
    eprintln!("error: {}", message);
    eprintln!("Usage: cadence-mcp [OPTIONS]");
    eprintln!("Try 'cadence-mcp --help' for more information.");
    std::process::exit(1);
}

/// Parse command-line arguments.
/// Exits the process on `--help`, `--version` or a usage error.
fn parse_args() -> Options {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut options = Options::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                println!("Cadence MCP Server v{}", env!("CARGO_PKG_VERSION"));
                println!();
                println!("Adaptive spaced-repetition scheduling over the Model Context Protocol.");
                println!();
                println!("USAGE:");
                println!("    cadence-mcp [OPTIONS]");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help              Print help information");
                println!("    -V, --version           Print version information");
                println!("    --data-dir <PATH>       Directory for telemetry.jsonl");
                println!("    --remote <URL>          Remote scheduling backend");
                println!("    --no-contextual         Start with contextual scheduling disabled");
                println!();
                println!("ENVIRONMENT:");
                println!("    RUST_LOG                      Log level filter (e.g. debug, info, warn)");
                println!("    CADENCE_LOG_FORMAT            'json' for structured logs");
                println!("    CADENCE_CONTEXTUAL_ENABLED    true/false");
                println!("    CADENCE_TELEMETRY_CAPACITY    Records buffered before a flush");
                println!("    CADENCE_COLLABORATOR_TIMEOUT_MS  Remote/similarity call timeout");
                println!("    CADENCE_REMOTE_URL            Remote scheduling backend");
                println!("    CADENCE_TELEMETRY_PATH        Telemetry file");
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("cadence-mcp {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--no-contextual" => options.no_contextual = true,
            "--data-dir" => match iter.next() {
                Some(path) => options.data_dir = Some(PathBuf::from(path)),
                None => usage_error("--data-dir requires a path argument"),
            },
            "--remote" => match iter.next() {
                Some(url) => options.remote = Some(url.clone()),
                None => usage_error("--remote requires a URL argument"),
            },
            arg if arg.starts_with("--data-dir=") => {
                let path = arg.trim_start_matches("--data-dir=");
                if path.is_empty() {
                    usage_error("--data-dir requires a path argument");
                }
                options.data_dir = Some(PathBuf::from(path));
            }
            arg if arg.starts_with("--remote=") => {
                options.remote = Some(arg.trim_start_matches("--remote=").to_string());
            }
            arg => usage_error(&format!("unknown argument '{}'", arg)),
        }
    }

    options
}

fn init_logging() {
    let filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
    let json = std::env::var("CADENCE_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // stdout carries JSON-RPC; logs must go to stderr
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .with_ansi(false)
            .init();
    }
}

#[cfg(feature = "http-remote")]
fn build_dispatcher(config: &EngineConfig, telemetry: Arc<TelemetryCollector>) -> AdaptiveDispatcher {
    match AdaptiveDispatcher::from_config(config, telemetry) {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to configure remote scheduling: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(not(feature = "http-remote"))]
fn build_dispatcher(config: &EngineConfig, telemetry: Arc<TelemetryCollector>) -> AdaptiveDispatcher {
    if config.remote_endpoint.is_some() {
        warn!("Built without http-remote, ignoring remote endpoint");
    }
    AdaptiveDispatcher::with_config(config, telemetry)
}

#[tokio::main]
async fn main() {
    let options = parse_args();
    init_logging();

    info!("Cadence MCP Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = EngineConfig::from_env();
    if let Some(dir) = options.data_dir {
        config.telemetry_path = Some(dir.join("telemetry.jsonl"));
    }
    if options.remote.is_some() {
        config.remote_endpoint = options.remote;
    }
    if options.no_contextual {
        config.contextual_enabled = false;
    }

    // Batches are handed to a background writer so flushing never blocks a review
    let (sink, writer) = match config.resolved_telemetry_path() {
        Some(path) => {
            info!("Telemetry file: {}", path.display());
            let (sink, rx) = ChannelSink::new();
            let target: Arc<dyn TelemetrySink> = Arc::new(JsonlFileSink::new(path));
            let writer = ChannelSink::spawn_writer(rx, target);
            (Arc::new(sink) as Arc<dyn TelemetrySink>, Some(writer))
        }
        None => {
            warn!("No data directory available, training telemetry will be discarded");
            (Arc::new(DiscardSink) as Arc<dyn TelemetrySink>, None)
        }
    };
    let telemetry = Arc::new(TelemetryCollector::new(config.telemetry_capacity, sink));

    let dispatcher = Arc::new(build_dispatcher(&config, Arc::clone(&telemetry)));
    info!(
        contextual = dispatcher.is_contextual_enabled(),
        capacity = config.telemetry_capacity,
        "Dispatcher ready"
    );

    let server = McpServer::new(Arc::clone(&dispatcher));

    info!("Starting MCP server on stdio...");
    if let Err(e) = StdioTransport::new().run(server).await {
        error!("Server error: {}", e);
    }

    // Drain the buffer, then drop every sender so the writer can finish
    let flushed = telemetry.flush();
    if flushed > 0 {
        info!("Flushed {} training records on shutdown", flushed);
    }
    drop(dispatcher);
    drop(telemetry);
    if let Some(writer) = writer {
        if let Err(e) = writer.await {
            warn!("Telemetry writer did not finish cleanly: {}", e);
        }
    }

    info!("Cadence MCP Server shutting down");
}
