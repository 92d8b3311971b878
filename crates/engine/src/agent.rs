// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent lifecycle engine.
//!
//! One [`Agent`] per conversational participant. Sends are serialized per
//! agent by an async turn lock; the lifecycle state is published through a
//! `watch` channel so the presentation layer reads snapshots without
//! touching any lock, and every transition is mirrored onto the project
//! event bus.
//!
//! State machine:
//!
//! ```text
//!     idle ──send()──> working
//!   working ──normal completion──> idle
//!   working ──completion signal, no commitments──> done (terminal)
//!   working ──completion signal, commitments──> verifying
//! verifying ──all pass──> done (terminal)
//! verifying ──any fail or error──> idle
//!   working ──waiting signal──> waiting
//!   waiting ──send()──> working
//!       any ──transport error──> prior non-working state, error propagates
//! ```

use crate::prompts;
use crate::verify::verify_all;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tavern_adapters::{CommitmentChecker, Messenger, MessengerError, QuerySpec, ToolServer};
use tavern_core::{
    AgentId, AgentKind, AgentStatus, Commitment, Event, SessionId, SignalRules, StreamEvent,
    TavernError, TurnSignal,
};
use tavern_storage::{SessionScope, SessionStore};
use tokio::sync::{broadcast, mpsc, oneshot, watch};

/// Bounded time for one round of commitment verification.
const VERIFY_TIMEOUT: Duration = Duration::from_secs(120);

/// Buffer for streaming send events.
const STREAM_BUFFER: usize = 64;

/// Everything needed to construct an agent. Built by the project (for the
/// supervisor) or the spawner (for servitors).
pub(crate) struct AgentParts<M> {
    pub id: AgentId,
    pub name: String,
    pub kind: AgentKind,
    pub project_root: PathBuf,
    pub scope: SessionScope,
    pub messenger: M,
    pub store: SessionStore,
    pub checker: Arc<dyn CommitmentChecker>,
    pub events: broadcast::Sender<Event>,
    pub rules: SignalRules,
    /// Look up the persisted session id and resume it on the first send.
    pub load_saved_session: bool,
}

impl<M: Messenger> std::fmt::Debug for Agent<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// A conversational participant bound to a runtime session.
pub struct Agent<M: Messenger> {
    id: AgentId,
    name: String,
    kind: AgentKind,
    project_root: PathBuf,
    scope: SessionScope,
    messenger: M,
    store: SessionStore,
    checker: Arc<dyn CommitmentChecker>,
    events: broadcast::Sender<Event>,
    rules: SignalRules,
    status_tx: watch::Sender<AgentStatus>,
    session: Mutex<Option<SessionId>>,
    commitments: Mutex<Vec<Commitment>>,
    /// Injected after construction; only the supervisor ever gets one.
    tool_server: Mutex<Option<Arc<dyn ToolServer>>>,
    /// Serializes sends: one runtime turn per agent at a time.
    turn: tokio::sync::Mutex<()>,
}

impl<M: Messenger> Agent<M> {
    pub(crate) fn new(parts: AgentParts<M>) -> Arc<Self> {
        let session = if parts.load_saved_session {
            parts.store.load_session(&parts.scope)
        } else {
            None
        };
        let (status_tx, _) = watch::channel(AgentStatus::Idle);
        Arc::new(Self {
            id: parts.id,
            name: parts.name,
            kind: parts.kind,
            project_root: parts.project_root,
            scope: parts.scope,
            messenger: parts.messenger,
            store: parts.store,
            checker: parts.checker,
            events: parts.events,
            rules: parts.rules,
            status_tx,
            session: Mutex::new(session),
            commitments: Mutex::new(Vec::new()),
            tool_server: Mutex::new(None),
            turn: tokio::sync::Mutex::new(()),
        })
    }

    // -- identity and observation --

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &AgentKind {
        &self.kind
    }

    /// The initial task, if this servitor was spawned with one.
    pub fn assignment(&self) -> Option<&str> {
        self.kind.assignment()
    }

    /// Lock-free snapshot of the lifecycle state.
    pub fn status(&self) -> AgentStatus {
        *self.status_tx.borrow()
    }

    /// Subscribe to state changes (presentation layer).
    pub fn subscribe_status(&self) -> watch::Receiver<AgentStatus> {
        self.status_tx.subscribe()
    }

    /// Current runtime session id, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        self.session.lock().clone()
    }

    pub fn commitments(&self) -> Vec<Commitment> {
        self.commitments.lock().clone()
    }

    /// User-edited description, persisted across launches.
    pub fn description(&self) -> Option<String> {
        self.store.description(&self.id)
    }

    pub fn set_description(&self, description: Option<&str>) {
        if let Err(e) = self.store.set_description(&self.id, description) {
            tracing::warn!(agent_id = %self.id, error = %e, "failed to persist description");
        }
    }

    /// Inject the tool server. Done after construction because the server
    /// needs the spawner, which needs the project that owns this agent.
    pub fn set_tool_server(&self, server: Arc<dyn ToolServer>) {
        *self.tool_server.lock() = Some(server);
    }

    // -- commitments --

    pub fn add_commitment(&self, description: impl Into<String>, assertion: impl Into<String>) {
        if self.kind.is_supervisor() {
            tracing::warn!(agent = %self.name, "supervisor does not carry commitments");
            return;
        }
        self.commitments
            .lock()
            .push(Commitment::new(description, assertion));
    }

    // -- manual transitions --

    /// Park the agent in waiting (user-driven).
    pub fn mark_waiting(&self) {
        if self.status() != AgentStatus::Working {
            self.set_status(AgentStatus::Waiting);
        }
    }

    /// Force completion (user-driven). Terminal; idempotent.
    pub fn mark_done(&self) {
        self.set_status(AgentStatus::Done);
    }

    /// Clear the in-memory session id and the persisted binding so the next
    /// send starts a fresh runtime session. Idempotent; never revives a
    /// done agent.
    pub fn reset_conversation(&self) {
        *self.session.lock() = None;
        if let Err(e) = self.store.clear_session(&self.scope) {
            tracing::warn!(agent_id = %self.id, error = %e, "failed to clear session binding");
        }
        let current = self.status();
        if current != AgentStatus::Working && !current.is_terminal() {
            self.set_status(AgentStatus::Idle);
        }
    }

    // -- sending --

    /// One full turn: transition to working, call the runtime, persist the
    /// session binding, apply signal detection (and verification), land in
    /// the post state, and return the assistant text.
    pub async fn send(&self, text: &str) -> Result<String, TavernError> {
        // Reject, not queue: a turn already in flight means the caller
        // raced the state machine.
        let Ok(_turn) = self.turn.try_lock() else {
            return Err(TavernError::AgentBusy(self.name.clone()));
        };
        let prior = self.gate_send()?;
        let resume = self.session.lock().clone();

        self.set_status(AgentStatus::Working);
        tracing::info!(agent = %self.name, resume = ?resume, "send started");

        let spec = self.query_spec(resume.clone());
        match self.messenger.send(&spec, text).await {
            Ok(reply) => {
                self.record_session(reply.session_id.clone());
                self.finish_turn(&reply.text).await?;
                Ok(reply.text)
            }
            Err(error) => {
                self.set_status(prior);
                Err(self.transport_error(resume, error))
            }
        }
    }

    /// Same lifecycle effects as [`send`](Self::send), but yields progress
    /// events and returns a cancel handle. Cancellation aborts the runtime
    /// subprocess and finalizes to idle without marking done or waiting.
    pub fn send_streaming(
        self: &Arc<Self>,
        text: &str,
    ) -> (mpsc::Receiver<StreamEvent>, CancelHandle) {
        let (event_tx, event_rx) = mpsc::channel(STREAM_BUFFER);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let agent = Arc::clone(self);
        let text = text.to_string();
        tokio::spawn(async move {
            agent.run_streaming_turn(&text, event_tx, cancel_rx).await;
        });
        (event_rx, CancelHandle::new(cancel_tx))
    }

    async fn run_streaming_turn(
        &self,
        text: &str,
        events: mpsc::Sender<StreamEvent>,
        cancel: oneshot::Receiver<()>,
    ) {
        let _turn = match self.turn.try_lock() {
            Ok(turn) => turn,
            Err(_) => {
                let _ = events
                    .send(StreamEvent::Error {
                        message: TavernError::AgentBusy(self.name.clone()).to_string(),
                    })
                    .await;
                return;
            }
        };
        let prior = match self.gate_send() {
            Ok(prior) => prior,
            Err(e) => {
                let _ = events
                    .send(StreamEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
                return;
            }
        };
        let resume = self.session.lock().clone();

        self.set_status(AgentStatus::Working);
        tracing::info!(agent = %self.name, resume = ?resume, "streaming send started");

        let spec = self.query_spec(resume.clone());
        match self
            .messenger
            .send_streaming(&spec, text, events.clone(), cancel)
            .await
        {
            Ok(reply) => {
                self.record_session(reply.session_id.clone());
                match self.finish_turn(&reply.text).await {
                    Ok(()) => {
                        let _ = events
                            .send(StreamEvent::Completed {
                                session_id: reply.session_id,
                                text: reply.text,
                            })
                            .await;
                    }
                    Err(e) => {
                        let _ = events
                            .send(StreamEvent::Error {
                                message: e.to_string(),
                            })
                            .await;
                    }
                }
            }
            Err(MessengerError::Cancelled) => {
                tracing::info!(agent = %self.name, "streaming send cancelled");
                self.set_status(AgentStatus::Idle);
            }
            Err(error) => {
                self.set_status(prior);
                let error = self.transport_error(resume, error);
                let _ = events
                    .send(StreamEvent::Error {
                        message: error.to_string(),
                    })
                    .await;
            }
        }
    }

    // -- internals --

    /// Reject sends in states that do not accept them; return the state to
    /// restore on failure.
    fn gate_send(&self) -> Result<AgentStatus, TavernError> {
        let current = self.status();
        if current.is_terminal() {
            return Err(TavernError::AgentRetired(self.name.clone()));
        }
        if !current.accepts_send() {
            return Err(TavernError::AgentBusy(self.name.clone()));
        }
        Ok(current)
    }

    fn query_spec(&self, resume: Option<SessionId>) -> QuerySpec {
        let system_prompt = match &self.kind {
            AgentKind::Supervisor => prompts::supervisor_prompt(),
            AgentKind::Servitor { assignment } => {
                prompts::servitor_prompt(&self.name, assignment.as_deref())
            }
        };
        let mut spec = QuerySpec::new(system_prompt, &self.project_root);
        if let Some(session_id) = resume {
            spec = spec.with_resume(session_id);
        }
        if let Some(server) = self.tool_server.lock().clone() {
            spec = spec.with_tool_server(server);
        }
        spec
    }

    /// Remember and persist the session binding from a successful call.
    fn record_session(&self, session_id: Option<SessionId>) {
        let Some(session_id) = session_id else {
            return;
        };
        *self.session.lock() = Some(session_id.clone());
        if let Err(e) = self.store.save_session(&self.scope, &session_id) {
            // Non-fatal: the conversation continues, only resume-on-relaunch
            // is affected.
            tracing::warn!(agent_id = %self.id, error = %e, "failed to persist session binding");
        }
        let _ = self.events.send(Event::SessionBound {
            agent_id: self.id.clone(),
            session_id,
        });
    }

    /// Apply completion-signal detection and land in the post state.
    async fn finish_turn(&self, text: &str) -> Result<(), TavernError> {
        match self.rules.detect(text) {
            TurnSignal::Waiting => {
                self.set_status(AgentStatus::Waiting);
                Ok(())
            }
            TurnSignal::None => {
                self.set_status(AgentStatus::Idle);
                Ok(())
            }
            TurnSignal::Completion => self.try_complete().await,
        }
    }

    /// Attempt completion: zero commitments completes immediately; otherwise
    /// verify them all and either finish or fall back to idle for a retry.
    async fn try_complete(&self) -> Result<(), TavernError> {
        let mut list = self.commitments.lock().clone();
        if list.is_empty() {
            self.set_status(AgentStatus::Done);
            return Ok(());
        }

        self.set_status(AgentStatus::Verifying);
        let outcome = verify_all(&self.checker, &mut list, VERIFY_TIMEOUT).await;
        *self.commitments.lock() = list;

        match outcome {
            Ok(true) => {
                tracing::info!(agent = %self.name, "all commitments passed");
                self.set_status(AgentStatus::Done);
                Ok(())
            }
            Ok(false) => {
                tracing::info!(agent = %self.name, "commitment verification failed, agent may retry");
                self.set_status(AgentStatus::Idle);
                Ok(())
            }
            Err(error) => {
                self.set_status(AgentStatus::Idle);
                Err(error)
            }
        }
    }

    fn transport_error(&self, resume: Option<SessionId>, error: MessengerError) -> TavernError {
        match resume {
            // A failed resume signals the UI to offer a fresh start.
            Some(session_id) => TavernError::SessionCorrupt {
                session_id,
                cause: error.to_string(),
            },
            None => TavernError::TransportFailure(error.to_string()),
        }
    }

    /// Transition with the done-is-terminal guard; publish on change.
    fn set_status(&self, status: AgentStatus) {
        let changed = self.status_tx.send_if_modified(|current| {
            if current.is_terminal() || *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            tracing::debug!(agent = %self.name, %status, "state transition");
            let _ = self.events.send(Event::AgentStatus {
                agent_id: self.id.clone(),
                status,
            });
        }
    }
}

/// Aborts an in-flight streaming send. Idempotent; cloneable.
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl CancelHandle {
    fn new(tx: oneshot::Sender<()>) -> Self {
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        }
    }

    /// Request cancellation. Later calls are no-ops.
    pub fn cancel(&self) {
        if let Some(tx) = self.tx.lock().take() {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
