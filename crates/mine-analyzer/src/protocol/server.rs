//! Mine Analyzer MCP Server Implementation
//!
//! This module implements the MCP server using rmcp 0.9's #[tool_router] pattern.
//! Analyzer tools go through the controller handle; page tools mutate the
//! simulated host page so the analysis loop can be driven from a client.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router, ErrorData as McpError,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use mine_analyzer_core::Error;

use crate::runtime::AnalyzerRuntime;
use crate::tools::*;

fn internal_error(context: &str, e: Error) -> McpError {
    error!("{}: {}", context, e);
    McpError::new(
        ErrorCode(-32603), // Internal error
        format!("{context}: {e}"),
        None,
    )
}

fn invalid_params(e: Error) -> McpError {
    McpError::new(
        ErrorCode(-32602), // Invalid params
        e.to_string(),
        None,
    )
}

fn json_result<T: Serialize>(value: &T, fallback: impl FnOnce() -> String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(value).unwrap_or_else(|_| fallback()),
    )])
}

/// Mine Analyzer MCP Server
///
/// Exposes one running analyzer and its simulated page via MCP tools.
#[derive(Clone)]
pub struct MineAnalyzerServer {
    /// Page, solver realm and controller
    runtime: Arc<AnalyzerRuntime>,
    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl MineAnalyzerServer {
    /// Create a server around a running analyzer
    pub fn new(runtime: AnalyzerRuntime) -> Self {
        Self {
            runtime: Arc::new(runtime),
            tool_router: Self::tool_router(),
        }
    }

    /// Current analyzer status
    #[tool(
        description = "Get analyzer status: replay mode, board data, lifecycle state, last message and board description"
    )]
    #[instrument(skip_all)]
    async fn analyzer_status(
        &self,
        Parameters(_params): Parameters<NoParams>,
    ) -> Result<CallToolResult, McpError> {
        let status = self
            .runtime
            .handle()
            .get_status()
            .await
            .map_err(|e| internal_error("Failed to read status", e))?;

        debug!("Analyzer state: {}", status.state);
        Ok(json_result(&status, || status.state.to_string()))
    }

    /// Analyze the current board
    #[tool(
        description = "Analyze the current board and return safe moves, mine probabilities, best guess and win probability"
    )]
    #[instrument(skip_all)]
    async fn analyzer_analyze(
        &self,
        Parameters(_params): Parameters<NoParams>,
    ) -> Result<CallToolResult, McpError> {
        info!("Analysis requested");

        let result = self
            .runtime
            .handle()
            .analyze_current()
            .await
            .map_err(|e| internal_error("Analysis failed", e))?;

        if let Some(error) = &result.error {
            info!("Analysis finished without a result: {}", error);
        } else {
            info!("Analysis found {} safe move(s)", result.safe_moves.len());
        }

        Ok(json_result(&result, || {
            format!("{} safe moves", result.safe_moves.len())
        }))
    }

    /// Re-read the board
    #[tool(description = "Force a re-extraction of the board and return the fresh snapshot")]
    #[instrument(skip_all)]
    async fn analyzer_refresh(
        &self,
        Parameters(_params): Parameters<NoParams>,
    ) -> Result<CallToolResult, McpError> {
        let snapshot = self
            .runtime
            .handle()
            .refresh_board()
            .await
            .map_err(|e| internal_error("Failed to refresh board", e))?;

        info!("Board refreshed: {}", snapshot.describe());
        Ok(json_result(&snapshot, || snapshot.describe()))
    }

    /// Flip probability labels
    #[tool(description = "Toggle the probability labels on or off and return the new setting")]
    #[instrument(skip_all)]
    async fn analyzer_toggle_probabilities(
        &self,
        Parameters(_params): Parameters<NoParams>,
    ) -> Result<CallToolResult, McpError> {
        let show_probabilities = self
            .runtime
            .handle()
            .toggle_probabilities()
            .await
            .map_err(|e| internal_error("Failed to toggle probabilities", e))?;

        let response = ToggleProbabilitiesResponse { show_probabilities };
        Ok(json_result(&response, || show_probabilities.to_string()))
    }

    /// Open a cell on the simulated page
    #[tool(description = "Reveal a cell on the simulated page, showing the given number")]
    #[instrument(skip_all)]
    async fn page_reveal(
        &self,
        Parameters(params): Parameters<RevealParams>,
    ) -> Result<CallToolResult, McpError> {
        info!(
            "Revealing cell ({}, {}) with value {}",
            params.x, params.y, params.value
        );

        self.runtime
            .page()
            .reveal(params.x, params.y, params.value)
            .map_err(invalid_params)?;

        let response = PageChangeResponse {
            message: format!("Revealed ({}, {})", params.x, params.y),
        };
        Ok(json_result(&response, || response.message.clone()))
    }

    /// Place or remove a flag on the simulated page
    #[tool(description = "Place a flag on a covered cell of the simulated page, or remove it")]
    #[instrument(skip_all)]
    async fn page_flag(
        &self,
        Parameters(params): Parameters<FlagParams>,
    ) -> Result<CallToolResult, McpError> {
        let page = self.runtime.page();
        let verb = if params.remove {
            page.unflag(params.x, params.y).map_err(invalid_params)?;
            "Unflagged"
        } else {
            page.flag(params.x, params.y).map_err(invalid_params)?;
            "Flagged"
        };
        info!("{} cell ({}, {})", verb, params.x, params.y);

        let response = PageChangeResponse {
            message: format!("{verb} ({}, {})", params.x, params.y),
        };
        Ok(json_result(&response, || response.message.clone()))
    }

    /// What the overlay shows
    #[tool(description = "List the probability labels, highlighted cells and status line currently drawn")]
    #[instrument(skip_all)]
    async fn overlay_labels(
        &self,
        Parameters(_params): Parameters<NoParams>,
    ) -> Result<CallToolResult, McpError> {
        let view = self
            .runtime
            .handle()
            .overlay()
            .await
            .map_err(|e| internal_error("Failed to read overlay", e))?;

        debug!(
            "Overlay has {} label(s) and {} highlight(s)",
            view.labels.len(),
            view.highlights.len()
        );
        Ok(json_result(&view, || format!("{} labels", view.labels.len())))
    }
}

// Implement the ServerHandler trait to define server capabilities
#[tool_handler]
impl rmcp::ServerHandler for MineAnalyzerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Mine Analyzer MCP Server - Live analysis overlay for a minesweeper page. \
                 Use page_reveal and page_flag to play on the simulated page, analyzer_status \
                 and overlay_labels to see what the analyzer extracted and drew, and \
                 analyzer_analyze to run an analysis on demand."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
