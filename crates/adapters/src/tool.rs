// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool-server seam between the messenger and the orchestration engine.
//!
//! A tool server is registered with the runtime through the `QuerySpec`;
//! during a turn the runtime sends tool-call frames back over the stream and
//! the messenger dispatches them here, threading the structured result into
//! the same turn.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors a tool handler can produce.
///
/// These travel back to the runtime as structured tool errors; the model
/// sees them in-context and can react within the same turn.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("{0}")]
    Failed(String),
}

/// An in-process handler the runtime can call back into mid-turn.
#[async_trait]
pub trait ToolServer: Send + Sync + 'static {
    /// Server name advertised to the runtime.
    fn name(&self) -> &str;

    /// Tool names this server handles.
    fn tools(&self) -> Vec<String>;

    /// Execute one tool call and return its structured result.
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError>;
}
