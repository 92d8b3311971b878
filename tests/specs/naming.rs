// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Name allocation: themed order, exhaustion fallback, uniqueness.

use crate::prelude::Harness;
use std::collections::HashSet;
use tavern_engine::SummonOptions;

#[tokio::test]
async fn name_exhaustion_switches_to_fallback() {
    let h = Harness::new();
    let project = h.open_project(&["A", "B", "C"]);

    let names: Vec<String> = (0..5)
        .map(|_| {
            project
                .spawner()
                .summon(SummonOptions::assigned("t"))
                .unwrap()
                .name()
                .to_string()
        })
        .collect();

    assert_eq!(names, vec!["A", "B", "C", "Agent-1", "Agent-2"]);
    assert_eq!(project.registry().count(), 5);

    let ids: HashSet<String> = project
        .registry()
        .all()
        .iter()
        .map(|a| a.id().to_string())
        .collect();
    assert_eq!(ids.len(), 5, "all ids must be distinct");
}

#[tokio::test]
async fn registry_names_stay_a_bijection() {
    let h = Harness::new();
    let project = h.open_project(&["A", "B"]);

    for _ in 0..4 {
        project.spawner().summon(SummonOptions::default()).unwrap();
    }
    let agents = project.registry().all();
    let names: HashSet<&str> = agents.iter().map(|a| a.name()).collect();
    assert_eq!(names.len(), agents.len());
}

#[tokio::test]
async fn dismissal_returns_the_world_to_its_prior_state() {
    let h = Harness::new();
    let project = h.open_project(&["A", "B"]);

    let roster_before = h.store.roster(project.encoded_root());
    let agent = project
        .spawner()
        .summon(SummonOptions::named("Keg", "t"))
        .unwrap();
    let id = agent.id().clone();
    drop(agent);

    project.spawner().dismiss(&id).unwrap();

    assert_eq!(project.registry().count(), 0);
    assert!(!project.names().is_reserved("Keg"));
    assert_eq!(h.store.roster(project.encoded_root()), roster_before);
}

#[tokio::test]
async fn failed_named_summon_leaks_no_reservation() {
    let h = Harness::new();
    let project = h.open_project(&["A"]);

    project
        .spawner()
        .summon(SummonOptions::named("Keg", "first"))
        .unwrap();
    let err = project
        .spawner()
        .summon(SummonOptions::named("Keg", "second"))
        .unwrap_err();
    assert!(
        matches!(err, tavern_core::TavernError::NameAlreadyExists(_)),
        "{err}"
    );
    // The original holder still owns the name; no half-state anywhere
    assert!(project.names().is_reserved("Keg"));
    assert_eq!(project.registry().count(), 1);
}
