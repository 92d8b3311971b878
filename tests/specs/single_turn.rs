// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single supervisor turn with no session involved.

use crate::prelude::Harness;
use tavern_core::AgentStatus;

#[tokio::test]
async fn single_turn_without_a_session() {
    let h = Harness::new();
    h.messenger.queue_reply("Hello FRIEND!");
    let project = h.open_project(&["A"]);

    let reply = project.supervisor().send("hi").await.unwrap();

    assert_eq!(reply, "Hello FRIEND!");
    assert_eq!(project.supervisor().status(), AgentStatus::Idle);
    // The runtime reported no session, so nothing was persisted
    assert_eq!(h.store.load_session(&h.supervisor_scope(&project)), None);
}

#[tokio::test]
async fn a_session_binding_is_written_after_a_successful_turn() {
    let h = Harness::new();
    h.messenger.queue_reply_with_session("noted", "S-42");
    let project = h.open_project(&["A"]);

    project.supervisor().send("hi").await.unwrap();

    assert_eq!(
        h.store
            .load_session(&h.supervisor_scope(&project))
            .map(|s| s.to_string()),
        Some("S-42".to_string())
    );
}
