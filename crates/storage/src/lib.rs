// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tavern-storage: the durable key-value user-settings store.
//!
//! All durable state of the orchestration core that does not live in the
//! runtime's transcripts lives here: session-id bindings, user-edited agent
//! descriptions, and the per-project servitor roster.

pub mod sessions;
pub mod settings;

pub use sessions::{ServitorRecord, SessionScope, SessionStore};
pub use settings::{SettingsStore, StorageError};
