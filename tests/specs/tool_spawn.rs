// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool-driven spawning: the supervisor summons and dismisses servitors
//! from inside its own turn.

use crate::prelude::Harness;
use serde_json::json;
use tavern_core::Event;

#[tokio::test]
async fn tool_driven_spawn() {
    let h = Harness::new();
    h.messenger.queue_tool_call_turn(
        "summon_servitor",
        json!({"assignment": "do x"}),
        "A is on it; I'll keep an eye on things.",
        "S-sup",
    );
    let project = h.open_project(&["A", "B"]);
    let mut bus = project.subscribe();

    let narration = project.supervisor().send("please handle x").await.unwrap();
    assert_eq!(narration, "A is on it; I'll keep an eye on things.");

    // The registry gained exactly one servitor with the assignment
    assert_eq!(project.registry().count(), 1);
    let servitor = project.registry().get_by_name("A").unwrap();
    assert_eq!(servitor.assignment(), Some("do x"));

    // The tool result fed back into the turn carried id and name
    let dispatches = h.messenger.tool_dispatches();
    assert_eq!(dispatches.len(), 1);
    let result = dispatches[0].1.as_ref().unwrap();
    assert_eq!(result["agent_name"], "A");
    assert_eq!(result["agent_id"], servitor.id().to_string());

    // Observers saw exactly one "added" event
    let mut added = 0;
    while let Ok(event) = bus.try_recv() {
        if matches!(event, Event::AgentRegistered { .. }) {
            added += 1;
        }
    }
    assert_eq!(added, 1);
}

#[tokio::test]
async fn tool_driven_dismissal() {
    let h = Harness::new();
    let project = h.open_project(&["A"]);
    let servitor = project
        .spawner()
        .summon(tavern_engine::SummonOptions::assigned("t"))
        .unwrap();
    let id = servitor.id().to_string();
    drop(servitor);

    h.messenger.queue_tool_call_turn(
        "dismiss_servitor",
        json!({"agent_id": id}),
        "A has been sent home.",
        "S-sup",
    );

    let narration = project.supervisor().send("we're done with A").await.unwrap();
    assert_eq!(narration, "A has been sent home.");
    assert_eq!(project.registry().count(), 0);
    assert_eq!(
        h.messenger.tool_dispatches()[0].1.as_ref().unwrap(),
        &json!({"ok": true})
    );
}

#[tokio::test]
async fn dismissing_an_unknown_servitor_reports_a_tool_error() {
    let h = Harness::new();
    let project = h.open_project(&["A"]);
    h.messenger.queue_tool_call_turn(
        "dismiss_servitor",
        json!({"agent_id": "nobody"}),
        "There is no such servitor.",
        "S-sup",
    );

    project.supervisor().send("dismiss nobody").await.unwrap();
    let dispatches = h.messenger.tool_dispatches();
    let error = dispatches[0].1.as_ref().unwrap_err();
    assert!(error.contains("agent not found"), "{error}");
}
