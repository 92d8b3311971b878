// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mock messenger for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Messenger, MessengerError, QuerySpec, Reply};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tavern_core::{SessionId, StreamEvent};
use tokio::sync::{mpsc, oneshot};

/// A recorded outgoing query.
#[derive(Debug, Clone)]
pub struct SentPrompt {
    pub prompt: String,
    pub system_prompt: String,
    pub resume: Option<SessionId>,
    pub had_tool_server: bool,
    pub streaming: bool,
}

enum MockReply {
    Text {
        text: String,
        session_id: Option<SessionId>,
    },
    /// Simulate a turn in which the model calls a tool before narrating.
    ToolCallTurn {
        tool: String,
        args: Value,
        text: String,
        session_id: Option<SessionId>,
    },
    Error(MessengerError),
}

struct MockState {
    replies: VecDeque<MockReply>,
    sent: Vec<SentPrompt>,
    tool_dispatches: Vec<(String, Result<Value, String>)>,
    chunk_size: usize,
}

/// Deterministic messenger: queued canned replies, recorded prompts,
/// on-demand errors, and streaming simulated by fixed-size chunking.
#[derive(Clone)]
pub struct MockMessenger {
    inner: Arc<Mutex<MockState>>,
}

impl Default for MockMessenger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMessenger {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockState {
                replies: VecDeque::new(),
                sent: Vec::new(),
                tool_dispatches: Vec::new(),
                chunk_size: 8,
            })),
        }
    }

    /// Queue a reply that reports no session id.
    pub fn queue_reply(&self, text: impl Into<String>) {
        self.inner.lock().replies.push_back(MockReply::Text {
            text: text.into(),
            session_id: None,
        });
    }

    /// Queue a reply carrying a session id.
    pub fn queue_reply_with_session(&self, text: impl Into<String>, session_id: impl Into<String>) {
        self.inner.lock().replies.push_back(MockReply::Text {
            text: text.into(),
            session_id: Some(SessionId::new(session_id)),
        });
    }

    /// Queue an error for the next call.
    pub fn queue_error(&self, error: MessengerError) {
        self.inner.lock().replies.push_back(MockReply::Error(error));
    }

    /// Queue a turn that invokes `tool` on the registered tool server and
    /// then narrates with `text`.
    pub fn queue_tool_call_turn(
        &self,
        tool: impl Into<String>,
        args: Value,
        text: impl Into<String>,
        session_id: impl Into<String>,
    ) {
        self.inner.lock().replies.push_back(MockReply::ToolCallTurn {
            tool: tool.into(),
            args,
            text: text.into(),
            session_id: Some(SessionId::new(session_id)),
        });
    }

    /// All queries sent so far.
    pub fn sent(&self) -> Vec<SentPrompt> {
        self.inner.lock().sent.clone()
    }

    /// Outcomes of tool calls dispatched during canned turns.
    pub fn tool_dispatches(&self) -> Vec<(String, Result<Value, String>)> {
        self.inner.lock().tool_dispatches.clone()
    }

    /// Chunk size used when simulating streams.
    pub fn set_chunk_size(&self, chars: usize) {
        self.inner.lock().chunk_size = chars.max(1);
    }

    fn record(&self, spec: &QuerySpec, prompt: &str, streaming: bool) {
        self.inner.lock().sent.push(SentPrompt {
            prompt: prompt.to_string(),
            system_prompt: spec.system_prompt.clone(),
            resume: spec.resume.clone(),
            had_tool_server: spec.tool_server.is_some(),
            streaming,
        });
    }

    fn pop_reply(&self) -> Result<MockReply, MessengerError> {
        self.inner.lock().replies.pop_front().ok_or_else(|| {
            MessengerError::Transport("mock messenger has no queued reply".to_string())
        })
    }

    async fn dispatch_tool(&self, spec: &QuerySpec, tool: &str, args: Value) -> bool {
        let outcome = match &spec.tool_server {
            Some(server) => server.handle(tool, args).await.map_err(|e| e.to_string()),
            None => Err("no tool server registered".to_string()),
        };
        let ok = outcome.is_ok();
        self.inner
            .lock()
            .tool_dispatches
            .push((tool.to_string(), outcome));
        ok
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send(&self, spec: &QuerySpec, prompt: &str) -> Result<Reply, MessengerError> {
        self.record(spec, prompt, false);
        match self.pop_reply()? {
            MockReply::Text { text, session_id } => Ok(Reply { text, session_id }),
            MockReply::ToolCallTurn {
                tool,
                args,
                text,
                session_id,
            } => {
                self.dispatch_tool(spec, &tool, args).await;
                Ok(Reply { text, session_id })
            }
            MockReply::Error(error) => Err(error),
        }
    }

    async fn send_streaming(
        &self,
        spec: &QuerySpec,
        prompt: &str,
        events: mpsc::Sender<StreamEvent>,
        mut cancel: oneshot::Receiver<()>,
    ) -> Result<Reply, MessengerError> {
        self.record(spec, prompt, true);
        let (text, session_id) = match self.pop_reply()? {
            MockReply::Text { text, session_id } => (text, session_id),
            MockReply::ToolCallTurn {
                tool,
                args,
                text,
                session_id,
            } => {
                let _ = events
                    .send(StreamEvent::ToolUseStarted { name: tool.clone() })
                    .await;
                let ok = self.dispatch_tool(spec, &tool, args).await;
                let _ = events
                    .send(StreamEvent::ToolUseFinished { name: tool, ok })
                    .await;
                (text, session_id)
            }
            MockReply::Error(error) => return Err(error),
        };

        let chunk_size = self.inner.lock().chunk_size;
        let chars: Vec<char> = text.chars().collect();
        for chunk in chars.chunks(chunk_size) {
            if cancel.try_recv().is_ok() {
                return Err(MessengerError::Cancelled);
            }
            let _ = events
                .send(StreamEvent::TextDelta {
                    text: chunk.iter().collect(),
                })
                .await;
        }

        Ok(Reply { text, session_id })
    }
}

#[cfg(test)]
#[path = "mock_tests.rs"]
mod tests;
