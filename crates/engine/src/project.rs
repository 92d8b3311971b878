// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-project object graph and the process-wide project manager.
//!
//! Opening a directory builds the whole graph: supervisor, registry, name
//! generator, spawner, and the tavern tool server. The supervisor and the
//! tool server reference each other indirectly (the server calls back into
//! the spawner that serves the supervisor's project), so the server is
//! injected into the supervisor after construction.

use crate::agent::{Agent, AgentParts};
use crate::names::NameGenerator;
use crate::registry::Registry;
use crate::spawner::Spawner;
use crate::tool_server::TavernToolServer;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tavern_adapters::{
    encode_project_path, flatten, read_transcript, transcript_path, CommitmentChecker,
    DisplayMessage, Messenger, ShellChecker, ToolServer,
};
use tavern_core::{AgentId, AgentKind, Event, NameTheme, SignalRules, SUPERVISOR_NAME};
use tavern_storage::{SessionScope, SessionStore};
use tokio::sync::broadcast;

/// Event-bus depth; slow UI subscribers lag rather than block mutators.
const EVENT_BUS_CAPACITY: usize = 256;

/// Assembly knobs for a project. `new` fills in production defaults; tests
/// swap the messenger, checker, and theme.
pub struct ProjectConfig<M: Messenger> {
    pub messenger: M,
    pub store: SessionStore,
    pub checker: Arc<dyn CommitmentChecker>,
    pub theme: NameTheme,
    pub rules: SignalRules,
    /// Where the runtime keeps its transcripts (`~/.claude` by default).
    pub runtime_root: PathBuf,
}

impl<M: Messenger> ProjectConfig<M> {
    pub fn new(messenger: M, store: SessionStore) -> Self {
        Self {
            messenger,
            store,
            checker: Arc::new(ShellChecker),
            theme: NameTheme::default(),
            rules: SignalRules::default(),
            runtime_root: tavern_adapters::transcript::runtime_root(),
        }
    }

    pub fn with_checker(mut self, checker: Arc<dyn CommitmentChecker>) -> Self {
        self.checker = checker;
        self
    }

    pub fn with_theme(mut self, theme: NameTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_runtime_root(mut self, runtime_root: impl Into<PathBuf>) -> Self {
        self.runtime_root = runtime_root.into();
        self
    }
}

/// The object graph for one opened directory.
pub struct Project<M: Messenger> {
    root: PathBuf,
    encoded_root: String,
    runtime_root: PathBuf,
    supervisor: Arc<Agent<M>>,
    registry: Arc<Registry<M>>,
    names: Arc<NameGenerator>,
    spawner: Arc<Spawner<M>>,
    store: SessionStore,
    events: broadcast::Sender<Event>,
}

impl<M: Messenger> Project<M> {
    /// Build the graph for a directory.
    ///
    /// The root is canonicalized (symlinks resolved) so session bindings and
    /// transcript lookups agree with the runtime's view of the path.
    /// Previously-persisted servitors are restored from the roster; a
    /// record that can no longer be restored is skipped with a warning.
    pub fn open(root: impl Into<PathBuf>, config: ProjectConfig<M>) -> Arc<Self> {
        let root = root.into();
        let root = std::fs::canonicalize(&root).unwrap_or(root);
        let encoded_root = encode_project_path(&root);
        tracing::info!(root = %root.display(), "opening project");

        let (events, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        let names = Arc::new(NameGenerator::new(config.theme));
        let registry = Arc::new(Registry::new(events.clone()));

        let supervisor = Agent::new(AgentParts {
            id: AgentId::fresh(),
            name: SUPERVISOR_NAME.to_string(),
            kind: AgentKind::Supervisor,
            project_root: root.clone(),
            scope: SessionScope::Supervisor {
                project: encoded_root.clone(),
            },
            messenger: config.messenger.clone(),
            store: config.store.clone(),
            checker: Arc::clone(&config.checker),
            events: events.clone(),
            rules: config.rules.clone(),
            load_saved_session: true,
        });

        let spawner = Arc::new(Spawner::new(
            root.clone(),
            encoded_root.clone(),
            Arc::clone(&registry),
            Arc::clone(&names),
            config.messenger,
            config.store.clone(),
            config.checker,
            events.clone(),
            config.rules,
        ));

        let tool_server: Arc<dyn ToolServer> =
            Arc::new(TavernToolServer::new(Arc::clone(&spawner)));
        supervisor.set_tool_server(tool_server);

        for record in config.store.roster(&encoded_root) {
            let name = record.name.clone();
            if let Err(e) = spawner.register_existing(record) {
                tracing::warn!(servitor = %name, error = %e, "could not restore servitor");
            }
        }

        Arc::new(Self {
            root,
            encoded_root,
            runtime_root: config.runtime_root,
            supervisor,
            registry,
            names,
            spawner,
            store: config.store,
            events,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The runtime's encoded form of the root path.
    pub fn encoded_root(&self) -> &str {
        &self.encoded_root
    }

    pub fn supervisor(&self) -> &Arc<Agent<M>> {
        &self.supervisor
    }

    pub fn registry(&self) -> &Arc<Registry<M>> {
        &self.registry
    }

    pub fn names(&self) -> &Arc<NameGenerator> {
        &self.names
    }

    pub fn spawner(&self) -> &Arc<Spawner<M>> {
        &self.spawner
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Subscribe to registry and agent events (presentation layer).
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Rehydrate an agent's chat history from the runtime's transcript.
    ///
    /// A session can be displayable but not resumable: the transcript may
    /// outlive the server-side session, in which case history still loads
    /// while the next send fails with a session-corrupt error.
    pub fn history(&self, agent: &Agent<M>) -> Vec<DisplayMessage> {
        let Some(session_id) = agent.session_id() else {
            return Vec::new();
        };
        let path = transcript_path(&self.runtime_root, &self.root, session_id.as_str());
        flatten(&read_transcript(&path))
    }
}

/// Process singleton mapping opened directories to their projects.
///
/// Keyed by canonical root path; opening the same directory twice returns
/// the same graph, so no two projects ever share an agent or registry.
pub struct ProjectManager<M: Messenger> {
    projects: Mutex<HashMap<PathBuf, Arc<Project<M>>>>,
}

impl<M: Messenger> Default for ProjectManager<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Messenger> ProjectManager<M> {
    pub fn new() -> Self {
        Self {
            projects: Mutex::new(HashMap::new()),
        }
    }

    /// Open (or return the already-open) project for a directory.
    pub fn open(&self, root: impl Into<PathBuf>, config: ProjectConfig<M>) -> Arc<Project<M>> {
        let root = root.into();
        let key = std::fs::canonicalize(&root).unwrap_or_else(|_| root.clone());
        if let Some(existing) = self.projects.lock().get(&key) {
            return Arc::clone(existing);
        }
        let project = Project::open(root, config);
        self.projects
            .lock()
            .entry(key)
            .or_insert_with(|| Arc::clone(&project))
            .clone()
    }

    pub fn get(&self, root: &Path) -> Option<Arc<Project<M>>> {
        let key = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        self.projects.lock().get(&key).cloned()
    }

    /// Close a project, dropping it from the map. Returns whether it was
    /// open. Durable state stays in the store for the next open.
    pub fn close(&self, root: &Path) -> bool {
        let key = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let removed = self.projects.lock().remove(&key);
        if removed.is_some() {
            tracing::info!(root = %root.display(), "project closed");
        }
        removed.is_some()
    }

    pub fn open_count(&self) -> usize {
        self.projects.lock().len()
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
