// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Servitor creation and dismissal.
//!
//! The spawner is the only writer that touches both the registry and the
//! name pool, and it keeps the pair consistent: a name is reserved before
//! the servitor is constructed, and released again if registry insertion
//! fails, so no reservation ever leaks.

use crate::agent::{Agent, AgentParts};
use crate::names::NameGenerator;
use crate::registry::Registry;
use std::path::PathBuf;
use std::sync::Arc;
use tavern_adapters::{CommitmentChecker, Messenger};
use tavern_core::{AgentId, AgentKind, Event, SignalRules, TavernError};
use tavern_storage::{ServitorRecord, SessionScope, SessionStore};
use tokio::sync::broadcast;

/// How a new servitor should be created.
#[derive(Debug, Clone, Default)]
pub struct SummonOptions {
    /// Caller-chosen name; auto-generated when absent.
    pub name: Option<String>,
    /// Initial task. Absent for user-spawned servitors, which idle until
    /// the user speaks to them.
    pub assignment: Option<String>,
}

impl SummonOptions {
    pub fn assigned(assignment: impl Into<String>) -> Self {
        Self {
            name: None,
            assignment: Some(assignment.into()),
        }
    }

    pub fn named(name: impl Into<String>, assignment: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            assignment: Some(assignment.into()),
        }
    }
}

pub struct Spawner<M: Messenger> {
    project_root: PathBuf,
    encoded_project: String,
    registry: Arc<Registry<M>>,
    names: Arc<NameGenerator>,
    messenger: M,
    store: SessionStore,
    checker: Arc<dyn CommitmentChecker>,
    events: broadcast::Sender<Event>,
    rules: SignalRules,
}

impl<M: Messenger> Spawner<M> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        project_root: PathBuf,
        encoded_project: String,
        registry: Arc<Registry<M>>,
        names: Arc<NameGenerator>,
        messenger: M,
        store: SessionStore,
        checker: Arc<dyn CommitmentChecker>,
        events: broadcast::Sender<Event>,
        rules: SignalRules,
    ) -> Self {
        Self {
            project_root,
            encoded_project,
            registry,
            names,
            messenger,
            store,
            checker,
            events,
            rules,
        }
    }

    /// Create and register a new servitor.
    pub fn summon(&self, options: SummonOptions) -> Result<Arc<Agent<M>>, TavernError> {
        let name = match options.name {
            Some(name) => {
                if !self.names.reserve(&name) {
                    return Err(TavernError::NameAlreadyExists(name));
                }
                name
            }
            // next_name_or_fallback reserves as it allocates
            None => self.names.next_name_or_fallback(),
        };

        let id = AgentId::fresh();
        let agent = self.build(id, name.clone(), options.assignment, false);

        if let Err(e) = self.registry.register(Arc::clone(&agent)) {
            // Undo the reservation so the failed half leaves no trace
            self.names.release(&name);
            return Err(e);
        }

        tracing::info!(servitor = %name, agent_id = %agent.id(), "servitor summoned");
        self.persist_roster();
        Ok(agent)
    }

    /// Rebuild a previously-persisted servitor at project open. Same
    /// reserve-then-register discipline as `summon`; the restored agent
    /// resumes its saved session on first send.
    pub fn register_existing(
        &self,
        record: ServitorRecord,
    ) -> Result<Arc<Agent<M>>, TavernError> {
        if !self.names.reserve(&record.name) {
            return Err(TavernError::NameAlreadyExists(record.name));
        }

        let agent = self.build(record.id, record.name.clone(), record.assignment, true);

        if let Err(e) = self.registry.register(Arc::clone(&agent)) {
            self.names.release(&record.name);
            return Err(e);
        }

        tracing::info!(servitor = %record.name, agent_id = %agent.id(), "servitor restored");
        Ok(agent)
    }

    /// Remove a servitor from the registry, release its name, and drop its
    /// durable traces. Dismissing an unknown id is an error.
    pub fn dismiss(&self, id: &AgentId) -> Result<(), TavernError> {
        let agent = self.registry.remove(id)?;
        self.names.release(agent.name());
        if let Err(e) = self.store.forget_servitor(&self.encoded_project, id) {
            tracing::warn!(agent_id = %id, error = %e, "failed to drop servitor records");
        }
        tracing::info!(servitor = %agent.name(), agent_id = %id, "servitor dismissed");
        Ok(())
    }

    fn build(
        &self,
        id: AgentId,
        name: String,
        assignment: Option<String>,
        load_saved_session: bool,
    ) -> Arc<Agent<M>> {
        Agent::new(AgentParts {
            scope: SessionScope::Servitor { agent: id.clone() },
            id,
            name,
            kind: AgentKind::Servitor { assignment },
            project_root: self.project_root.clone(),
            messenger: self.messenger.clone(),
            store: self.store.clone(),
            checker: Arc::clone(&self.checker),
            events: self.events.clone(),
            rules: self.rules.clone(),
            load_saved_session,
        })
    }

    /// Write the current servitor set through the store so project open can
    /// restore it.
    fn persist_roster(&self) {
        let roster: Vec<ServitorRecord> = self
            .registry
            .all()
            .into_iter()
            .map(|agent| ServitorRecord {
                id: agent.id().clone(),
                name: agent.name().to_string(),
                assignment: agent.assignment().map(String::from),
            })
            .collect();
        if let Err(e) = self.store.save_roster(&self.encoded_project, &roster) {
            tracing::warn!(error = %e, "failed to persist servitor roster");
        }
    }
}

#[cfg(test)]
#[path = "spawner_tests.rs"]
mod tests;
