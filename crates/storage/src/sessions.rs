// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable session bindings, agent descriptions, and the servitor roster.
//!
//! Key scheme:
//!
//! ```text
//! session.supervisor.<encoded-project-path>   -> session id string
//! session.servitor.<agent-uuid>               -> session id string
//! agent.<agent-uuid>.description              -> user-edited description
//! project.<encoded-project-path>.servitors    -> JSON roster of servitors
//! ```
//!
//! The encoded project path is the transcript reader's canonical form; this
//! crate treats it as an opaque pre-encoded string.

use crate::settings::{SettingsStore, StorageError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tavern_core::{AgentId, SessionId};
use tracing::debug;

/// Durable key of an agent's session binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionScope {
    /// The supervisor, one per project, keyed by the encoded project path.
    Supervisor { project: String },
    /// A servitor, keyed by its stable id.
    Servitor { agent: AgentId },
}

impl SessionScope {
    /// The settings-store key for this scope.
    pub fn key(&self) -> String {
        match self {
            SessionScope::Supervisor { project } => format!("session.supervisor.{project}"),
            SessionScope::Servitor { agent } => format!("session.servitor.{agent}"),
        }
    }
}

/// A persisted servitor, enough to rebuild it at project open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServitorRecord {
    pub id: AgentId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment: Option<String>,
}

/// Typed facade over the settings store for everything the agent engine
/// persists.
#[derive(Clone)]
pub struct SessionStore {
    settings: Arc<SettingsStore>,
}

impl SessionStore {
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self { settings }
    }

    // -- session bindings --

    pub fn load_session(&self, scope: &SessionScope) -> Option<SessionId> {
        self.settings.get_string(&scope.key()).map(SessionId::new)
    }

    pub fn save_session(
        &self,
        scope: &SessionScope,
        session_id: &SessionId,
    ) -> Result<(), StorageError> {
        debug!(key = %scope.key(), session_id = %session_id, "persisting session binding");
        self.settings.set_string(&scope.key(), session_id.as_str())
    }

    pub fn clear_session(&self, scope: &SessionScope) -> Result<(), StorageError> {
        self.settings.remove(&scope.key())
    }

    // -- agent descriptions --

    pub fn description(&self, agent_id: &AgentId) -> Option<String> {
        self.settings.get_string(&description_key(agent_id))
    }

    pub fn set_description(
        &self,
        agent_id: &AgentId,
        description: Option<&str>,
    ) -> Result<(), StorageError> {
        let key = description_key(agent_id);
        match description {
            Some(text) => self.settings.set_string(&key, text),
            None => self.settings.remove(&key),
        }
    }

    // -- servitor roster --

    pub fn roster(&self, project: &str) -> Vec<ServitorRecord> {
        self.settings
            .get_value(&roster_key(project))
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    pub fn save_roster(
        &self,
        project: &str,
        roster: &[ServitorRecord],
    ) -> Result<(), StorageError> {
        let value = serde_json::to_value(roster)?;
        self.settings.set_value(&roster_key(project), value)
    }

    /// Drop a servitor's roster entry, session binding, and description.
    pub fn forget_servitor(&self, project: &str, agent_id: &AgentId) -> Result<(), StorageError> {
        let remaining: Vec<ServitorRecord> = self
            .roster(project)
            .into_iter()
            .filter(|r| &r.id != agent_id)
            .collect();
        self.save_roster(project, &remaining)?;
        self.clear_session(&SessionScope::Servitor {
            agent: agent_id.clone(),
        })?;
        self.settings.remove(&description_key(agent_id))
    }
}

fn description_key(agent_id: &AgentId) -> String {
    format!("agent.{agent_id}.description")
}

fn roster_key(project: &str) -> String {
    format!("project.{project}.servitors")
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
