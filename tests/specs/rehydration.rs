// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transcript rehydration: history loads from the runtime's on-disk
//! session log, tolerantly.

use crate::prelude::Harness;
use tavern_adapters::DisplayKind;
use tavern_core::SessionId;

#[tokio::test]
async fn transcript_rehydration_flattens_blocks() {
    let h = Harness::new();
    let project = h.open_project(&["A"]);

    // Bind a session so history knows where to look
    h.messenger.queue_reply_with_session("ok", "S-h");
    project.supervisor().send("hi").await.unwrap();
    assert_eq!(project.supervisor().session_id(), Some(SessionId::new("S-h")));

    // The runtime's log: a user string line, an assistant block-array line,
    // and a malformed line that must be dropped silently
    let dir = h
        .runtime_root()
        .join("projects")
        .join(project.encoded_root());
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("S-h.jsonl"),
        [
            r#"{"type":"user","message":{"content":"hi"}}"#,
            r#"{"type":"assistant","message":{"content":[{"type":"text","text":"ok"},{"type":"tool_use","name":"Read","input":{"path":"/x"}},{"type":"tool_result","content":"42","is_error":false}]}}"#,
            r#"{"type":"assistant","message":{"content":[{"type":"te"#,
        ]
        .join("\n"),
    )
    .unwrap();

    let history = project.history(project.supervisor());
    assert_eq!(history.len(), 4);

    assert_eq!(
        history[0].kind,
        DisplayKind::Text {
            text: "hi".to_string()
        }
    );
    assert_eq!(
        history[1].kind,
        DisplayKind::Text {
            text: "ok".to_string()
        }
    );
    match &history[2].kind {
        DisplayKind::ToolUse { name, input } => {
            assert_eq!(name, "Read");
            assert!(input.contains("\"path\": \"/x\""), "{input}");
        }
        other => panic!("expected tool use, got {other:?}"),
    }
    assert_eq!(
        history[3].kind,
        DisplayKind::ToolResult {
            content: "42".to_string(),
            is_error: false
        }
    );
}

#[tokio::test]
async fn displayable_but_not_resumable() {
    let h = Harness::new();
    let project = h.open_project(&["A"]);

    // A turn binds the session, then the server-side state "expires"
    h.messenger.queue_reply_with_session("ok", "S-exp");
    project.supervisor().send("hi").await.unwrap();

    let dir = h
        .runtime_root()
        .join("projects")
        .join(project.encoded_root());
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("S-exp.jsonl"),
        r#"{"type":"user","message":{"content":"hi"}}"#,
    )
    .unwrap();

    h.messenger.queue_error(tavern_adapters::MessengerError::Transport(
        "no such session".into(),
    ));

    // History still renders...
    assert_eq!(project.history(project.supervisor()).len(), 1);
    // ...while the next send fails with the fresh-start signal
    let err = project.supervisor().send("continue").await.unwrap_err();
    assert!(err.is_session_corrupt(), "{err}");
}

#[tokio::test]
async fn history_is_empty_for_a_fresh_agent() {
    let h = Harness::new();
    let project = h.open_project(&["A"]);
    assert!(project.history(project.supervisor()).is_empty());
}
