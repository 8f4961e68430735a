//! Cross-realm message schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use mine_analyzer_core::{AnalysisResult, Error, Result, SolveOptions};

use crate::correlation::CorrelationId;
use crate::sanitize::SanitizedSnapshot;

/// A typed message on the shared channel.
///
/// Serialized with a `type` tag:
///
/// ```json
/// {"type": "SOLVE_CALL", "correlationId": "...", "snapshot": {...}, "options": {...}}
/// {"type": "SOLVE_RESULT", "correlationId": "...", "result": {...}}
/// {"type": "SOLVER_READY", "components": {"engine": true}}
/// {"type": "SOLVER_ERROR", "error": "..."}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeMessage {
    /// Request from the caller realm
    #[serde(rename = "SOLVE_CALL", rename_all = "camelCase")]
    SolveCall {
        /// Token the response must echo
        correlation_id: CorrelationId,
        /// Sanitized board
        snapshot: SanitizedSnapshot,
        /// Engine options; missing fields take their defaults
        #[serde(default)]
        options: SolveOptions,
    },

    /// Response from the solver realm
    #[serde(rename = "SOLVE_RESULT", rename_all = "camelCase")]
    SolveResult {
        /// Token of the request being answered
        correlation_id: CorrelationId,
        /// Analysis outcome
        result: AnalysisResult,
    },

    /// The solver realm has every capability it needs
    #[serde(rename = "SOLVER_READY")]
    SolverReady {
        /// Capability status by name
        #[serde(default)]
        components: BTreeMap<String, bool>,
    },

    /// The solver realm gave up waiting for its capabilities
    #[serde(rename = "SOLVER_ERROR")]
    SolverError {
        /// Failure description
        error: String,
    },
}

impl BridgeMessage {
    /// Validate an untyped channel message.
    ///
    /// Anything that does not match the schema, including messages from
    /// unrelated senders, is [`Error::MalformedMessage`].
    pub fn parse(value: &Value) -> Result<Self> {
        if !value.get("type").is_some_and(Value::is_string) {
            return Err(Error::MalformedMessage("missing type tag".to_string()));
        }
        Self::deserialize(value).map_err(|e| Error::MalformedMessage(e.to_string()))
    }

    /// Serialize for posting.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Message type tag.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeMessage::SolveCall { .. } => "SOLVE_CALL",
            BridgeMessage::SolveResult { .. } => "SOLVE_RESULT",
            BridgeMessage::SolverReady { .. } => "SOLVER_READY",
            BridgeMessage::SolverError { .. } => "SOLVER_ERROR",
        }
    }
}
