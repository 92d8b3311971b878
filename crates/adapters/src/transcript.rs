// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transcript reader: rehydrates chat history from the runtime's on-disk
//! session logs.
//!
//! The runtime writes one append-only JSONL file per session under
//! `<runtime-root>/projects/<encoded-project-path>/<session-id>.jsonl`.
//! This module owns the bit-exact path encoding and a tolerant line-by-line
//! decoder: a bad line is skipped, never fatal. The directory is read-only
//! to this system.

use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tavern_core::TavernError;

/// Resolve the runtime's state directory.
///
/// Uses `CLAUDE_CONFIG_DIR` env var if set, otherwise defaults to `~/.claude`.
pub fn runtime_root() -> PathBuf {
    std::env::var("CLAUDE_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs::home_dir().unwrap_or_default().join(".claude"))
}

/// Encode a project path into the runtime's directory-name form.
///
/// Symlinks are resolved first (the runtime canonicalizes internally, so we
/// must match to find the right directory), then `/` and `_` each become
/// `-`. This rule is compatibility-critical: if the runtime changes, this
/// is the likely break point.
pub fn encode_project_path(path: &Path) -> String {
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    canonical.to_string_lossy().replace(['/', '_'], "-")
}

/// Full path of a session transcript under a runtime root.
pub fn transcript_path(runtime_root: &Path, project_path: &Path, session_id: &str) -> PathBuf {
    runtime_root
        .join("projects")
        .join(encode_project_path(project_path))
        .join(format!("{session_id}.jsonl"))
}

/// Who produced a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    /// Any other record type; parsed but not rendered
    Other,
}

/// One content block within a stored message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Text(String),
    /// Tool invocation; `input` is the pretty-printed JSON argument object
    ToolUse { name: String, input: String },
    ToolResult { content: String, is_error: bool },
    /// Unknown block type, kept for forward compatibility
    Other,
}

/// One line of the transcript, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub role: Role,
    pub timestamp: String,
    pub blocks: Vec<ContentBlock>,
}

/// Read a transcript file into an ordered message sequence.
///
/// Missing files yield an empty history; unparseable lines are skipped.
pub fn read_transcript(path: &Path) -> Vec<StoredMessage> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return Vec::new(),
    };

    let mut messages = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let Ok(line) = line else { break };
        match parse_line(&line, index + 1) {
            Ok(Some(message)) => messages.push(message),
            Ok(None) => {}
            Err(e) => {
                // Intentional swallow: one bad line must not abort the load.
                tracing::debug!(path = %path.display(), error = %e, "skipping transcript line");
            }
        }
    }
    messages
}

/// Decode one transcript line. Blank lines are `Ok(None)`.
fn parse_line(line: &str, line_number: usize) -> Result<Option<StoredMessage>, TavernError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let json: Value =
        serde_json::from_str(trimmed).map_err(|_| TavernError::ParseError(line_number))?;

    let role = match json.get("type").and_then(|v| v.as_str()) {
        Some("user") => Role::User,
        Some("assistant") => Role::Assistant,
        Some(_) => Role::Other,
        None => return Err(TavernError::ParseError(line_number)),
    };

    let timestamp = json
        .get("timestamp")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let blocks = match json.get("message").and_then(|m| m.get("content")) {
        // A plain string is equivalent to a single text block.
        Some(Value::String(text)) => vec![ContentBlock::Text(text.clone())],
        Some(Value::Array(items)) => items.iter().map(parse_block).collect(),
        _ => Vec::new(),
    };

    Ok(Some(StoredMessage {
        role,
        timestamp,
        blocks,
    }))
}

/// Decode one content block with the same tolerance as lines.
fn parse_block(block: &Value) -> ContentBlock {
    match block.get("type").and_then(|v| v.as_str()) {
        Some("text") => ContentBlock::Text(
            block
                .get("text")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
        ),
        Some("tool_use") => {
            let input = block.get("input").cloned().unwrap_or(Value::Null);
            ContentBlock::ToolUse {
                name: block
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                input: serde_json::to_string_pretty(&input).unwrap_or_default(),
            }
        }
        Some("tool_result") => ContentBlock::ToolResult {
            content: tool_result_text(block),
            is_error: block
                .get("is_error")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        },
        _ => ContentBlock::Other,
    }
}

/// Tool-result content may be a plain string or nested text blocks.
fn tool_result_text(block: &Value) -> String {
    match block.get("content") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| item.get("type").and_then(|v| v.as_str()) == Some("text"))
            .filter_map(|item| item.get("text").and_then(|v| v.as_str()))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

// --- display flattening ---

/// What a display message shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayKind {
    Text { text: String },
    ToolUse { name: String, input: String },
    ToolResult { content: String, is_error: bool },
}

/// A UI-ready message. Stored messages flatten 1:1 into these; empty text
/// blocks and unknown blocks are dropped so the chat shows no blank gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayMessage {
    pub role: Role,
    pub timestamp: String,
    pub kind: DisplayKind,
}

/// Flatten stored messages into display messages.
pub fn flatten(messages: &[StoredMessage]) -> Vec<DisplayMessage> {
    let mut display = Vec::new();
    for message in messages {
        if message.role == Role::Other {
            continue;
        }
        for block in &message.blocks {
            let kind = match block {
                ContentBlock::Text(text) if text.is_empty() => continue,
                ContentBlock::Text(text) => DisplayKind::Text { text: text.clone() },
                ContentBlock::ToolUse { name, input } => DisplayKind::ToolUse {
                    name: name.clone(),
                    input: input.clone(),
                },
                ContentBlock::ToolResult { content, is_error } => DisplayKind::ToolResult {
                    content: content.clone(),
                    is_error: *is_error,
                },
                ContentBlock::Other => continue,
            };
            display.push(DisplayMessage {
                role: message.role,
                timestamp: message.timestamp.clone(),
                kind,
            });
        }
    }
    display
}

#[cfg(test)]
#[path = "transcript_tests.rs"]
mod tests;
