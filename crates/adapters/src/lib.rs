// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tavern-adapters: everything that touches the outside world.
//!
//! The runtime messenger (live subprocess driver and deterministic mock),
//! the transcript reader over the runtime's on-disk session logs, the
//! commitment checker, the tool-server seam, and the process-wide cap on
//! concurrent runtime calls.

pub mod limit;
pub mod messenger;
pub mod tool;
pub mod transcript;
pub mod verify;

pub use messenger::{ClaudeMessenger, Messenger, MessengerError, QuerySpec, Reply};
pub use tool::{ToolError, ToolServer};
pub use transcript::{
    encode_project_path, flatten, read_transcript, transcript_path, ContentBlock, DisplayKind,
    DisplayMessage, Role, StoredMessage,
};
pub use verify::{CommitmentChecker, ShellChecker};

#[cfg(any(test, feature = "test-support"))]
pub use messenger::MockMessenger;
#[cfg(any(test, feature = "test-support"))]
pub use verify::ScriptedChecker;
