// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Messenger abstraction over the external LLM runtime.
//!
//! Agents speak to the runtime only through the [`Messenger`] trait. The
//! live implementation drives a CLI subprocess; the mock queues canned
//! replies for deterministic tests. Both satisfy the same contract so
//! agents are oblivious to which is in use.

mod claude;

pub use claude::ClaudeMessenger;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod mock;
#[cfg(any(test, feature = "test-support"))]
pub use mock::{MockMessenger, SentPrompt};

use crate::tool::ToolServer;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tavern_core::{SessionId, StreamEvent};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Errors from runtime calls
#[derive(Debug, Error)]
pub enum MessengerError {
    #[error("failed to launch runtime: {0}")]
    Launch(String),
    #[error("runtime transport failed: {0}")]
    Transport(String),
    #[error("runtime call was cancelled")]
    Cancelled,
}

/// Everything needed to issue one runtime query.
#[derive(Clone)]
pub struct QuerySpec {
    /// System prompt for this agent variant
    pub system_prompt: String,
    /// Working directory for the runtime subprocess (the project root)
    pub cwd: PathBuf,
    /// Resume an existing runtime session
    pub resume: Option<SessionId>,
    /// Tool server the runtime may call back into mid-turn
    pub tool_server: Option<Arc<dyn ToolServer>>,
}

impl QuerySpec {
    pub fn new(system_prompt: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            cwd: cwd.into(),
            resume: None,
            tool_server: None,
        }
    }

    pub fn with_resume(mut self, session_id: SessionId) -> Self {
        self.resume = Some(session_id);
        self
    }

    pub fn with_tool_server(mut self, server: Arc<dyn ToolServer>) -> Self {
        self.tool_server = Some(server);
        self
    }
}

impl fmt::Debug for QuerySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySpec")
            .field("cwd", &self.cwd)
            .field("resume", &self.resume)
            .field("tool_server", &self.tool_server.as_ref().map(|t| t.name()))
            .finish_non_exhaustive()
    }
}

/// Result of one runtime call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Full aggregated assistant text of the turn
    pub text: String,
    /// Session id the runtime assigned, when it reported one
    pub session_id: Option<SessionId>,
}

/// Transport to the external LLM runtime.
#[async_trait]
pub trait Messenger: Clone + Send + Sync + 'static {
    /// Issue one query and wait for the terminal result.
    async fn send(&self, spec: &QuerySpec, prompt: &str) -> Result<Reply, MessengerError>;

    /// Issue one query, yielding progress into `events` as the runtime
    /// streams.
    ///
    /// Implementations emit `TextDelta`, `ToolUseStarted`, and
    /// `ToolUseFinished` in causal order and then return the terminal
    /// [`Reply`]. The caller owns the lifecycle events: `Completed` and
    /// `Error` are appended by the agent after persistence, never here.
    ///
    /// A value on `cancel` aborts the underlying request as best effort and
    /// resolves to [`MessengerError::Cancelled`].
    async fn send_streaming(
        &self,
        spec: &QuerySpec,
        prompt: &str,
        events: mpsc::Sender<StreamEvent>,
        cancel: oneshot::Receiver<()>,
    ) -> Result<Reply, MessengerError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
