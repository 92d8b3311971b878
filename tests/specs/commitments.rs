// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion with commitments: verification gates the done state.

use crate::prelude::Harness;
use tavern_core::{AgentStatus, CommitmentStatus};
use tavern_engine::SummonOptions;

#[tokio::test]
async fn completion_with_commitments_fails_then_passes() {
    let h = Harness::new();
    let project = h.open_project(&["A"]);
    let servitor = project
        .spawner()
        .summon(SummonOptions::assigned("build the thing"))
        .unwrap();
    servitor.add_commitment("the build is green", "make check");

    // First attempt: the assertion fails once
    h.checker.queue(Ok(false));
    h.messenger.queue_reply("I am DONE with the build.");
    servitor.send("go").await.unwrap();
    assert_eq!(servitor.status(), AgentStatus::Idle);
    assert_eq!(servitor.commitments()[0].status, CommitmentStatus::Failed);

    // Second attempt: the assertion now passes
    h.checker.queue(Ok(true));
    h.messenger.queue_reply("Fixed it. DONE.");
    servitor.send("try again").await.unwrap();
    assert_eq!(servitor.status(), AgentStatus::Done);
    assert_eq!(servitor.commitments()[0].status, CommitmentStatus::Passed);

    // The checker saw the same opaque assertion both times
    assert_eq!(h.checker.checked(), vec!["make check", "make check"]);
}

#[tokio::test]
async fn done_servitors_stay_done() {
    let h = Harness::new();
    let project = h.open_project(&["A"]);
    let servitor = project
        .spawner()
        .summon(SummonOptions::assigned("t"))
        .unwrap();

    h.messenger.queue_reply("COMPLETED");
    servitor.send("go").await.unwrap();
    assert_eq!(servitor.status(), AgentStatus::Done);

    let err = servitor.send("more work").await.unwrap_err();
    assert!(
        matches!(err, tavern_core::TavernError::AgentRetired(_)),
        "{err}"
    );
    // The rejected send never reached the runtime
    assert_eq!(h.messenger.sent().len(), 1);
}

#[tokio::test]
async fn zero_commitment_servitors_skip_verification() {
    let h = Harness::new();
    let project = h.open_project(&["A"]);
    let servitor = project
        .spawner()
        .summon(SummonOptions::assigned("t"))
        .unwrap();

    h.messenger.queue_reply("all DONE here");
    servitor.send("go").await.unwrap();
    assert_eq!(servitor.status(), AgentStatus::Done);
    assert!(h.checker.checked().is_empty());
}
