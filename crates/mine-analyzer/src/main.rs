//! # Mine Analyzer MCP Server
//!
//! Model Context Protocol server that runs the live minesweeper board
//! analyzer against a simulated host page.
//!
//! ## Overview
//!
//! This server provides MCP tools for:
//! - Analyzer status and on-demand analysis
//! - Board re-extraction and the probability-label toggle
//! - Playing on the simulated page (reveal, flag)
//! - Reading back what the overlay draws
//!
//! ## Architecture
//!
//! This is Layer 4 - the MCP server binary that ties together:
//! - mine-analyzer-core: Core types and configuration
//! - mine-analyzer-dom: Host document and page fixtures
//! - mine-analyzer-bridge: Solver realm messaging
//! - mine-analyzer-session: Analyzer controller and overlay

use anyhow::Context;
use rmcp::{transport::stdio, ServiceExt};

use mine_analyzer::{AnalyzerRuntime, MineAnalyzerServer};
use mine_analyzer_core::AnalyzerConfig;
use mine_analyzer_dom::{MinesweeperPage, PageFixture};

/// Value following `flag` on the command line.
fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|index| args.get(index + 1))
        .cloned()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let config_path = arg_value(&args, "--config");
    let page_path = arg_value(&args, "--page");

    let config = match &config_path {
        Some(path) => AnalyzerConfig::from_file(path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None => AnalyzerConfig::default(),
    };

    // Initialize logging; stdout carries the MCP transport
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.server.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Mine Analyzer MCP Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let page = match &page_path {
        Some(path) => {
            let fixture = PageFixture::from_file(path)
                .with_context(|| format!("failed to load page from {path}"))?;
            MinesweeperPage::from_fixture(&fixture)?
        }
        None => MinesweeperPage::beginner()?,
    };
    tracing::info!(
        "Simulated page: {}x{} ({})",
        page.width(),
        page.height(),
        page_path.as_deref().unwrap_or("built-in beginner board")
    );

    let runtime = AnalyzerRuntime::start(page, config)?;
    let server = MineAnalyzerServer::new(runtime);

    tracing::info!("Server initialized, starting stdio transport...");

    // Serve the MCP server over stdio
    let service = server.serve(stdio()).await.map_err(|e| {
        tracing::error!("Error starting server: {}", e);
        e
    })?;

    tracing::info!("Mine Analyzer MCP Server running on stdio");

    // Wait for the service to complete
    service.waiting().await?;

    tracing::info!("Mine Analyzer MCP Server shutting down");

    Ok(())
}
