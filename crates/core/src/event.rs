// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event types published on a project's bus and streamed during a send.

use crate::agent::{AgentId, AgentStatus};
use crate::session::SessionId;
use serde::{Deserialize, Serialize};

/// Events observable by the presentation layer.
///
/// Serializes with `{"type": "agent:name", ...fields}` format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// An agent's lifecycle state changed
    #[serde(rename = "agent:status")]
    AgentStatus {
        agent_id: AgentId,
        status: AgentStatus,
    },

    /// A new agent entered the registry
    #[serde(rename = "agent:registered")]
    AgentRegistered { agent_id: AgentId, name: String },

    /// An agent left the registry
    #[serde(rename = "agent:dismissed")]
    AgentDismissed { agent_id: AgentId, name: String },

    /// An agent's runtime session binding changed
    #[serde(rename = "agent:session")]
    SessionBound {
        agent_id: AgentId,
        session_id: SessionId,
    },
}

/// Events yielded by a streaming send, in causal order.
///
/// `Completed` is the final non-error event of a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A chunk of assistant text
    TextDelta { text: String },
    /// The runtime began executing a tool
    ToolUseStarted { name: String },
    /// A tool finished; `ok` is false when the tool reported an error
    ToolUseFinished { name: String, ok: bool },
    /// The turn finished; carries the session id (when the runtime reported
    /// one) and the full aggregated text
    Completed {
        session_id: Option<SessionId>,
        text: String,
    },
    /// The turn failed
    Error { message: String },
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
