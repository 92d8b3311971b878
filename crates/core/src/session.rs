// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session identifier type for runtime conversations.
//!
//! A SessionId is assigned by the external LLM runtime, never minted here:
//! the messenger extracts it from the runtime's terminal result frame and
//! the agent persists it for resume. It also names the on-disk transcript
//! (`<session-id>.jsonl`), so a session can be displayable but not
//! resumable: the transcript may outlive the server-side state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The runtime's opaque handle to a resumable conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
