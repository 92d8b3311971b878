// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live messenger driving the runtime CLI subprocess.
//!
//! One call is one subprocess: the query is framed onto stdin, the runtime
//! streams framed JSON messages on stdout, and the terminal `result` frame
//! carries the final assistant text plus the session id. Tool calls arrive
//! as frames mid-stream and are answered on stdin within the same turn.

use super::{Messenger, MessengerError, QuerySpec, Reply};
use crate::limit;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;
use tavern_core::{SessionId, StreamEvent};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, oneshot};

/// Hard outer timeout for non-streaming sends.
const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(600);

/// How long to wait for the runtime to exit after the result frame.
const REAP_TIMEOUT: Duration = Duration::from_secs(5);

/// Messenger backed by the Claude Code CLI.
#[derive(Debug, Clone)]
pub struct ClaudeMessenger {
    command: String,
    send_timeout: Duration,
}

impl Default for ClaudeMessenger {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaudeMessenger {
    pub fn new() -> Self {
        Self {
            command: "claude".to_string(),
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Override the runtime binary (tests point this at a fake).
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    fn build_command(&self, spec: &QuerySpec) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.arg("-p")
            .arg("--verbose")
            .arg("--output-format")
            .arg("stream-json")
            .arg("--input-format")
            .arg("stream-json")
            .arg("--system-prompt")
            .arg(&spec.system_prompt)
            .current_dir(&spec.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(resume) = &spec.resume {
            cmd.arg("--resume").arg(resume.as_str());
        }
        if let Some(server) = &spec.tool_server {
            cmd.arg("--tool-server")
                .arg(format!("{}={}", server.name(), server.tools().join(",")));
        }
        cmd
    }

    async fn run(
        &self,
        spec: &QuerySpec,
        prompt: &str,
        events: Option<&mpsc::Sender<StreamEvent>>,
        cancel: oneshot::Receiver<()>,
    ) -> Result<Reply, MessengerError> {
        let _permit = limit::acquire().await;

        let mut child = self
            .build_command(spec)
            .spawn()
            .map_err(|e| MessengerError::Launch(format!("{}: {e}", self.command)))?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| MessengerError::Launch("runtime stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MessengerError::Launch("runtime stdout unavailable".to_string()))?;
        let mut lines = BufReader::new(stdout).lines();

        tracing::debug!(cwd = %spec.cwd.display(), resume = ?spec.resume, "runtime subprocess spawned");

        write_frame(&mut stdin, &user_prompt_frame(prompt)).await?;

        let mut cancelled = std::pin::pin!(wait_cancelled(cancel));
        let mut tool_names: HashMap<String, String> = HashMap::new();
        let mut session_id: Option<SessionId> = None;

        loop {
            tokio::select! {
                res = lines.next_line() => match res {
                    Ok(Some(line)) => {
                        match parse_frame(&line) {
                            None => continue,
                            Some(Frame::Result { text, session_id: sid }) => {
                                let reply = Reply {
                                    text,
                                    session_id: sid.map(SessionId::new).or(session_id),
                                };
                                drop(stdin);
                                let _ = tokio::time::timeout(REAP_TIMEOUT, child.wait()).await;
                                return Ok(reply);
                            }
                            Some(frame) => {
                                self.handle_frame(frame, spec, &mut stdin, events, &mut tool_names, &mut session_id)
                                    .await?;
                            }
                        }
                    }
                    Ok(None) => {
                        drop(stdin);
                        return Err(exit_error(&mut child).await);
                    }
                    Err(e) => {
                        drop(stdin);
                        let _ = child.kill().await;
                        return Err(MessengerError::Transport(format!(
                            "reading runtime stream: {e}"
                        )));
                    }
                },
                _ = &mut cancelled => {
                    tracing::debug!("runtime call cancelled, killing subprocess");
                    let _ = child.kill().await;
                    return Err(MessengerError::Cancelled);
                }
            }
        }
    }

    async fn handle_frame(
        &self,
        frame: Frame,
        spec: &QuerySpec,
        stdin: &mut ChildStdin,
        events: Option<&mpsc::Sender<StreamEvent>>,
        tool_names: &mut HashMap<String, String>,
        session_id: &mut Option<SessionId>,
    ) -> Result<(), MessengerError> {
        match frame {
            Frame::System { session_id: sid } => {
                if let Some(sid) = sid {
                    *session_id = Some(SessionId::new(sid));
                }
            }
            Frame::Assistant { blocks } => {
                for block in blocks {
                    match block {
                        AssistantBlock::Text(text) => {
                            if let Some(tx) = events {
                                let _ = tx.send(StreamEvent::TextDelta { text }).await;
                            }
                        }
                        AssistantBlock::ToolUse { id, name } => {
                            if let Some(tx) = events {
                                let _ = tx
                                    .send(StreamEvent::ToolUseStarted { name: name.clone() })
                                    .await;
                            }
                            tool_names.insert(id, name);
                        }
                    }
                }
            }
            Frame::ToolResultNotice { tool_use_id, is_error } => {
                if let Some(tx) = events {
                    let name = tool_names
                        .get(&tool_use_id)
                        .cloned()
                        .unwrap_or_else(|| "tool".to_string());
                    let _ = tx
                        .send(StreamEvent::ToolUseFinished { name, ok: !is_error })
                        .await;
                }
            }
            Frame::ToolCall { id, name, args } => {
                self.dispatch_tool_call(spec, stdin, events, id, name, args)
                    .await?;
            }
            Frame::ProtocolError { message } => {
                return Err(MessengerError::Transport(message));
            }
            Frame::Result { .. } => {
                // Handled by the caller before dispatch.
            }
        }
        Ok(())
    }

    async fn dispatch_tool_call(
        &self,
        spec: &QuerySpec,
        stdin: &mut ChildStdin,
        events: Option<&mpsc::Sender<StreamEvent>>,
        id: String,
        name: String,
        args: Value,
    ) -> Result<(), MessengerError> {
        if let Some(tx) = events {
            let _ = tx
                .send(StreamEvent::ToolUseStarted { name: name.clone() })
                .await;
        }

        let outcome = match &spec.tool_server {
            Some(server) => server.handle(&name, args).await.map_err(|e| e.to_string()),
            None => Err("no tool server registered".to_string()),
        };

        let ok = outcome.is_ok();
        tracing::info!(tool = %name, ok, "tool call dispatched");

        let response = match outcome {
            Ok(result) => json!({"type": "tool_result", "id": id, "result": result}),
            Err(error) => json!({"type": "tool_result", "id": id, "error": error}),
        };
        write_frame(stdin, &response).await?;

        if let Some(tx) = events {
            let _ = tx.send(StreamEvent::ToolUseFinished { name, ok }).await;
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for ClaudeMessenger {
    async fn send(&self, spec: &QuerySpec, prompt: &str) -> Result<Reply, MessengerError> {
        // Not cancellable, but bounded by a hard outer timeout. Dropping the
        // in-flight future kills the subprocess via kill_on_drop.
        let (_guard, cancel_rx) = oneshot::channel();
        match tokio::time::timeout(self.send_timeout, self.run(spec, prompt, None, cancel_rx)).await
        {
            Ok(result) => result,
            Err(_) => Err(MessengerError::Transport(format!(
                "runtime call exceeded {}s",
                self.send_timeout.as_secs()
            ))),
        }
    }

    async fn send_streaming(
        &self,
        spec: &QuerySpec,
        prompt: &str,
        events: mpsc::Sender<StreamEvent>,
        cancel: oneshot::Receiver<()>,
    ) -> Result<Reply, MessengerError> {
        self.run(spec, prompt, Some(&events), cancel).await
    }
}

/// Resolve only when cancellation is actually requested. A dropped sender
/// means cancellation can no longer arrive, so park forever.
async fn wait_cancelled(rx: oneshot::Receiver<()>) {
    if rx.await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn user_prompt_frame(prompt: &str) -> Value {
    json!({
        "type": "user",
        "message": {
            "role": "user",
            "content": [{"type": "text", "text": prompt}],
        },
    })
}

async fn write_frame(stdin: &mut ChildStdin, frame: &Value) -> Result<(), MessengerError> {
    let mut buf =
        serde_json::to_vec(frame).map_err(|e| MessengerError::Transport(e.to_string()))?;
    buf.push(b'\n');
    stdin
        .write_all(&buf)
        .await
        .map_err(|e| MessengerError::Transport(format!("writing to runtime: {e}")))?;
    stdin
        .flush()
        .await
        .map_err(|e| MessengerError::Transport(format!("writing to runtime: {e}")))
}

async fn exit_error(child: &mut Child) -> MessengerError {
    let status = child.wait().await;
    let stderr = match child.stderr.take() {
        Some(mut pipe) => {
            let mut buf = String::new();
            let _ = pipe.read_to_string(&mut buf).await;
            buf
        }
        None => String::new(),
    };
    let detail = stderr.trim();
    match status {
        Ok(status) if detail.is_empty() => {
            MessengerError::Transport(format!("runtime exited ({status}) before a result frame"))
        }
        Ok(status) => MessengerError::Transport(format!(
            "runtime exited ({status}) before a result frame: {detail}"
        )),
        Err(e) => MessengerError::Transport(format!("waiting for runtime: {e}")),
    }
}

// --- frame parsing ---

/// One decoded line of the runtime's stdout stream.
#[derive(Debug, Clone, PartialEq)]
enum Frame {
    System {
        session_id: Option<String>,
    },
    Assistant {
        blocks: Vec<AssistantBlock>,
    },
    ToolResultNotice {
        tool_use_id: String,
        is_error: bool,
    },
    ToolCall {
        id: String,
        name: String,
        args: Value,
    },
    Result {
        text: String,
        session_id: Option<String>,
    },
    ProtocolError {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum AssistantBlock {
    Text(String),
    ToolUse { id: String, name: String },
}

fn get_str<'a>(obj: &'a Value, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(|v| v.as_str())
}

/// Decode one stream line. Unknown or unparseable frames yield `None`; the
/// stream keeps going.
fn parse_frame(line: &str) -> Option<Frame> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let json: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(_) => {
            tracing::debug!("skipping unparseable runtime frame");
            return None;
        }
    };

    match get_str(&json, "type") {
        Some("system") => Some(Frame::System {
            session_id: get_str(&json, "session_id").map(String::from),
        }),
        Some("assistant") => {
            let content = json.get("message").and_then(|m| m.get("content"))?;
            let blocks = content
                .as_array()?
                .iter()
                .filter_map(|block| match get_str(block, "type") {
                    Some("text") => Some(AssistantBlock::Text(
                        get_str(block, "text").unwrap_or_default().to_string(),
                    )),
                    Some("tool_use") => Some(AssistantBlock::ToolUse {
                        id: get_str(block, "id").unwrap_or_default().to_string(),
                        name: get_str(block, "name").unwrap_or_default().to_string(),
                    }),
                    _ => None,
                })
                .collect();
            Some(Frame::Assistant { blocks })
        }
        Some("user") => {
            let content = json.get("message").and_then(|m| m.get("content"))?;
            let block = content
                .as_array()?
                .iter()
                .find(|b| get_str(b, "type") == Some("tool_result"))?;
            Some(Frame::ToolResultNotice {
                tool_use_id: get_str(block, "tool_use_id").unwrap_or_default().to_string(),
                is_error: block
                    .get("is_error")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false),
            })
        }
        Some("tool_call") => Some(Frame::ToolCall {
            id: get_str(&json, "id").unwrap_or_default().to_string(),
            name: get_str(&json, "name").unwrap_or_default().to_string(),
            args: json.get("arguments").cloned().unwrap_or(Value::Null),
        }),
        Some("result") => {
            if get_str(&json, "subtype").is_some_and(|s| s != "success") {
                let message = get_str(&json, "error")
                    .or_else(|| get_str(&json, "result"))
                    .unwrap_or("runtime reported an error result")
                    .to_string();
                return Some(Frame::ProtocolError { message });
            }
            Some(Frame::Result {
                text: get_str(&json, "result").unwrap_or_default().to_string(),
                session_id: get_str(&json, "session_id").map(String::from),
            })
        }
        Some("error") => Some(Frame::ProtocolError {
            message: get_str(&json, "message")
                .or_else(|| get_str(&json, "error"))
                .unwrap_or("runtime protocol error")
                .to_string(),
        }),
        _ => None,
    }
}

#[cfg(test)]
#[path = "claude_tests.rs"]
mod tests;
