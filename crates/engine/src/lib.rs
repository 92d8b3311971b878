// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tavern-engine: the orchestration engine.
//!
//! Agent lifecycle state machines, the per-project registry and name
//! generator, the spawner that keeps them consistent, the `tavern` tool
//! server the supervisor drives, and the per-directory project graph.

pub mod agent;
pub mod names;
pub mod project;
pub mod prompts;
pub mod registry;
pub mod spawner;
pub mod tool_server;
pub mod verify;

pub use agent::{Agent, CancelHandle};
pub use names::NameGenerator;
pub use project::{Project, ProjectConfig, ProjectManager};
pub use registry::Registry;
pub use spawner::{Spawner, SummonOptions};
pub use tool_server::{TavernToolServer, TOOL_DISMISS, TOOL_SERVER_NAME, TOOL_SUMMON};
pub use verify::verify_all;
