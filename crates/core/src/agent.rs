// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identity, variant, and lifecycle state types.
//!
//! An agent is a conversational participant bound to a runtime session.
//! AgentId is distinct from SessionId: the former is the stable identity of
//! the agent within a project, the latter is the runtime's opaque handle to
//! the current resumable conversation and changes on reset.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The display name reserved for the supervisor.
///
/// Fixed for every project; never enters the servitor name pool.
pub const SUPERVISOR_NAME: &str = "Jake";

/// Stable identity of an agent within its project.
///
/// Minted once by [`AgentId::fresh`] when a servitor is summoned (or a
/// supervisor constructed) and never changes afterwards; durable keys
/// (`session.servitor.<id>`, `agent.<id>.description`) and the tool
/// protocol's `agent_id` argument all carry this value. Distinct from
/// [`SessionId`](crate::SessionId), which changes on every conversation
/// reset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    /// Mint a new identity. UUIDv4, so ids are unique across projects and
    /// restarts without coordination.
    pub fn fresh() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Rebuild an id from its stored or wire form (roster records,
    /// `dismiss_servitor` arguments).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which variant of agent this is.
///
/// The set is closed: there is no open hierarchy of agent types, only the
/// immortal supervisor and the short-lived servitors it (or the user) spawns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentKind {
    /// The permanent top-level agent that dispatches work via tool calls.
    Supervisor,
    /// A worker agent. An assignment means it was spawned with a task and
    /// begins work on its first send; no assignment means it was
    /// user-spawned and idles until the user speaks to it.
    Servitor { assignment: Option<String> },
}

impl AgentKind {
    pub fn is_supervisor(&self) -> bool {
        matches!(self, AgentKind::Supervisor)
    }

    /// The initial task description, if this is an assigned servitor.
    pub fn assignment(&self) -> Option<&str> {
        match self {
            AgentKind::Supervisor => None,
            AgentKind::Servitor { assignment } => assignment.as_deref(),
        }
    }
}

/// Discrete lifecycle state of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// At rest, ready to accept a send
    Idle,
    /// A runtime call is in flight
    Working,
    /// The agent signalled it needs user input
    Waiting,
    /// Commitments are being evaluated
    Verifying,
    /// Finished for good (terminal)
    Done,
    /// Marked unhealthy by an embedding monitor
    Error,
}

impl AgentStatus {
    /// Whether this state admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentStatus::Done)
    }

    /// Whether a send is accepted in this state.
    pub fn accepts_send(&self) -> bool {
        matches!(
            self,
            AgentStatus::Idle | AgentStatus::Waiting | AgentStatus::Error
        )
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Idle => write!(f, "idle"),
            AgentStatus::Working => write!(f, "working"),
            AgentStatus::Waiting => write!(f, "waiting"),
            AgentStatus::Verifying => write!(f, "verifying"),
            AgentStatus::Done => write!(f, "done"),
            AgentStatus::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
