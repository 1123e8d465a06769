use anyhow::Result;
use clipkeep::config::Config;
use clipkeep::mcp::ClipboardMcpServer;
use rmcp::{ServiceExt, transport::stdio};
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Check for version flag before anything else
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("clipkeep-mcp {}", VERSION);
        return Ok(());
    }
    // stdout carries the MCP protocol, so logs go to stderr.
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Config::load()?;
    info!(port = config.control_port, "Starting clipkeep-mcp server");

    let server = ClipboardMcpServer::new(config);
    let service = server.serve(stdio()).await?;

    info!("Server ready, waiting for requests...");

    service.waiting().await?;

    info!("Server shutting down");
    Ok(())
}
