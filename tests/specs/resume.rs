// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resume semantics: saved sessions resume, failed resumes surface as
//! session corruption with a fresh-start recovery path.

use crate::prelude::Harness;
use tavern_adapters::MessengerError;
use tavern_core::{AgentStatus, SessionId, TavernError};

#[tokio::test]
async fn resume_then_corrupt() {
    let h = Harness::new();
    let project = h.open_project(&["A"]);
    let scope = h.supervisor_scope(&project);
    drop(project);

    // Pre-seed the binding, then reopen so the supervisor loads it
    h.store.save_session(&scope, &SessionId::new("S-1")).unwrap();
    let project = h.open_project(&["A"]);
    h.messenger
        .queue_error(MessengerError::Transport("server-side state gone".into()));

    let err = project.supervisor().send("hi").await.unwrap_err();
    match err {
        TavernError::SessionCorrupt { session_id, .. } => {
            assert_eq!(session_id, SessionId::new("S-1"));
        }
        other => panic!("expected session corrupt, got {other}"),
    }
    assert_eq!(project.supervisor().status(), AgentStatus::Idle);
    // The binding is untouched; history can still render
    assert_eq!(h.store.load_session(&scope), Some(SessionId::new("S-1")));
}

#[tokio::test]
async fn start_fresh_after_corruption() {
    let h = Harness::new();
    let project = h.open_project(&["A"]);
    let scope = h.supervisor_scope(&project);
    drop(project);

    h.store.save_session(&scope, &SessionId::new("S-dead")).unwrap();
    let project = h.open_project(&["A"]);
    h.messenger
        .queue_error(MessengerError::Transport("gone".into()));
    h.messenger.queue_reply_with_session("fresh start", "S-new");

    let _ = project.supervisor().send("hi").await.unwrap_err();

    // The one-click recovery: reset, then send again without resume
    project.supervisor().reset_conversation();
    assert_eq!(h.store.load_session(&scope), None);

    let reply = project.supervisor().send("hi again").await.unwrap();
    assert_eq!(reply, "fresh start");
    let sent = h.messenger.sent();
    assert_eq!(sent[1].resume, None);
    assert_eq!(h.store.load_session(&scope), Some(SessionId::new("S-new")));
}

#[tokio::test]
async fn reset_conversation_is_idempotent() {
    let h = Harness::new();
    let project = h.open_project(&["A"]);
    let scope = h.supervisor_scope(&project);
    h.store.save_session(&scope, &SessionId::new("S-x")).unwrap();

    for _ in 0..3 {
        project.supervisor().reset_conversation();
        assert_eq!(project.supervisor().session_id(), None);
        assert_eq!(h.store.load_session(&scope), None);
        assert_eq!(project.supervisor().status(), AgentStatus::Idle);
    }
}
