// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::agent::AgentParts;
use tavern_adapters::{MockMessenger, ScriptedChecker};
use tavern_core::{AgentKind, SignalRules};
use tavern_storage::{SessionScope, SessionStore, SettingsStore};
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    store: SessionStore,
    events: broadcast::Sender<Event>,
    registry: Registry<MockMessenger>,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let settings = SettingsStore::open(dir.path().join("settings.json")).unwrap();
    let (events, _) = broadcast::channel(64);
    Fixture {
        store: SessionStore::new(Arc::new(settings)),
        registry: Registry::new(events.clone()),
        events,
        _dir: dir,
    }
}

fn make_agent(fx: &Fixture, id: &str, name: &str) -> Arc<Agent<MockMessenger>> {
    let id = AgentId::new(id);
    Agent::new(AgentParts {
        scope: SessionScope::Servitor { agent: id.clone() },
        id,
        name: name.to_string(),
        kind: AgentKind::Servitor { assignment: None },
        project_root: std::path::PathBuf::from("/tmp"),
        messenger: MockMessenger::new(),
        store: fx.store.clone(),
        checker: Arc::new(ScriptedChecker::new()),
        events: fx.events.clone(),
        rules: SignalRules::default(),
        load_saved_session: false,
    })
}

#[test]
fn register_and_lookup() {
    let fx = fixture();
    let agent = make_agent(&fx, "a-1", "Barnaby");
    fx.registry.register(Arc::clone(&agent)).unwrap();

    assert_eq!(fx.registry.count(), 1);
    assert!(fx.registry.is_name_taken("Barnaby"));
    assert!(Arc::ptr_eq(
        &fx.registry.get(&AgentId::new("a-1")).unwrap(),
        &agent
    ));
    assert!(Arc::ptr_eq(
        &fx.registry.get_by_name("Barnaby").unwrap(),
        &agent
    ));
}

#[test]
fn duplicate_name_is_rejected() {
    let fx = fixture();
    fx.registry
        .register(make_agent(&fx, "a-1", "Barnaby"))
        .unwrap();
    let err = fx
        .registry
        .register(make_agent(&fx, "a-2", "Barnaby"))
        .unwrap_err();
    assert!(matches!(err, TavernError::NameAlreadyExists(_)), "{err}");
    assert_eq!(fx.registry.count(), 1);
}

#[test]
fn remove_frees_both_indexes() {
    let fx = fixture();
    fx.registry
        .register(make_agent(&fx, "a-1", "Barnaby"))
        .unwrap();
    fx.registry.remove(&AgentId::new("a-1")).unwrap();

    assert_eq!(fx.registry.count(), 0);
    assert!(!fx.registry.is_name_taken("Barnaby"));
    assert!(fx.registry.get(&AgentId::new("a-1")).is_none());

    // The name is usable again
    fx.registry
        .register(make_agent(&fx, "a-3", "Barnaby"))
        .unwrap();
}

#[test]
fn remove_unknown_id_is_an_error() {
    let fx = fixture();
    let err = fx.registry.remove(&AgentId::new("ghost")).unwrap_err();
    assert!(matches!(err, TavernError::AgentNotFound(_)), "{err}");
}

#[test]
fn names_and_ids_stay_distinct() {
    let fx = fixture();
    for i in 0..5 {
        fx.registry
            .register(make_agent(&fx, &format!("a-{i}"), &format!("N-{i}")))
            .unwrap();
    }
    let agents = fx.registry.all();
    assert_eq!(agents.len(), 5);
    for a in &agents {
        for b in &agents {
            if !Arc::ptr_eq(a, b) {
                assert_ne!(a.name(), b.name());
                assert_ne!(a.id(), b.id());
            }
        }
    }
}

#[test]
fn clear_empties_everything() {
    let fx = fixture();
    fx.registry
        .register(make_agent(&fx, "a-1", "Barnaby"))
        .unwrap();
    fx.registry.clear();
    assert_eq!(fx.registry.count(), 0);
    assert!(!fx.registry.is_name_taken("Barnaby"));
}

#[test]
fn register_and_remove_publish_one_event_each() {
    let fx = fixture();
    let mut bus = fx.events.subscribe();

    fx.registry
        .register(make_agent(&fx, "a-1", "Barnaby"))
        .unwrap();
    fx.registry.remove(&AgentId::new("a-1")).unwrap();

    let mut seen = Vec::new();
    while let Ok(event) = bus.try_recv() {
        seen.push(event);
    }
    assert_eq!(
        seen,
        vec![
            Event::AgentRegistered {
                agent_id: AgentId::new("a-1"),
                name: "Barnaby".to_string()
            },
            Event::AgentDismissed {
                agent_id: AgentId::new("a-1"),
                name: "Barnaby".to_string()
            },
        ]
    );
}

#[test]
fn failed_register_publishes_nothing() {
    let fx = fixture();
    fx.registry
        .register(make_agent(&fx, "a-1", "Barnaby"))
        .unwrap();
    let mut bus = fx.events.subscribe();
    let _ = fx.registry.register(make_agent(&fx, "a-2", "Barnaby"));
    assert!(bus.try_recv().is_err());
}
