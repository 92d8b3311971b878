// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The project-scoped servitor registry.
//!
//! Two indexes, one mutex: `id -> agent` and `name -> id` mutate together,
//! so readers never observe a half-inserted or half-removed agent and
//! `name -> id` stays a bijection on the registered set. The supervisor is
//! not registered here; it is the project's own singleton.

use crate::agent::Agent;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tavern_adapters::Messenger;
use tavern_core::{AgentId, Event, TavernError};
use tokio::sync::broadcast;

pub struct Registry<M: Messenger> {
    inner: Mutex<Inner<M>>,
    events: broadcast::Sender<Event>,
}

struct Inner<M: Messenger> {
    by_id: HashMap<AgentId, Arc<Agent<M>>>,
    by_name: HashMap<String, AgentId>,
}

impl<M: Messenger> Registry<M> {
    pub fn new(events: broadcast::Sender<Event>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                by_id: HashMap::new(),
                by_name: HashMap::new(),
            }),
            events,
        }
    }

    /// Insert an agent. Fails if its name or id is already bound.
    pub fn register(&self, agent: Arc<Agent<M>>) -> Result<(), TavernError> {
        {
            let mut inner = self.inner.lock();
            if inner.by_name.contains_key(agent.name()) {
                return Err(TavernError::NameAlreadyExists(agent.name().to_string()));
            }
            if inner.by_id.contains_key(agent.id()) {
                return Err(TavernError::NameAlreadyExists(agent.name().to_string()));
            }
            inner
                .by_name
                .insert(agent.name().to_string(), agent.id().clone());
            inner.by_id.insert(agent.id().clone(), Arc::clone(&agent));
        }
        tracing::info!(agent = %agent.name(), agent_id = %agent.id(), "agent registered");
        let _ = self.events.send(Event::AgentRegistered {
            agent_id: agent.id().clone(),
            name: agent.name().to_string(),
        });
        Ok(())
    }

    /// Remove an agent by id. Fails if absent.
    pub fn remove(&self, id: &AgentId) -> Result<Arc<Agent<M>>, TavernError> {
        let agent = {
            let mut inner = self.inner.lock();
            let agent = inner
                .by_id
                .remove(id)
                .ok_or_else(|| TavernError::AgentNotFound(id.to_string()))?;
            inner.by_name.remove(agent.name());
            agent
        };
        tracing::info!(agent = %agent.name(), agent_id = %id, "agent removed");
        let _ = self.events.send(Event::AgentDismissed {
            agent_id: id.clone(),
            name: agent.name().to_string(),
        });
        Ok(agent)
    }

    pub fn get(&self, id: &AgentId) -> Option<Arc<Agent<M>>> {
        self.inner.lock().by_id.get(id).cloned()
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<Agent<M>>> {
        let inner = self.inner.lock();
        let id = inner.by_name.get(name)?;
        inner.by_id.get(id).cloned()
    }

    /// All registered agents, unordered.
    pub fn all(&self) -> Vec<Arc<Agent<M>>> {
        self.inner.lock().by_id.values().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.inner.lock().by_id.len()
    }

    pub fn is_name_taken(&self, name: &str) -> bool {
        self.inner.lock().by_name.contains_key(name)
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.by_id.clear();
        inner.by_name.clear();
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
