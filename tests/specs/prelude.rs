// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for behavioral specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use tavern_adapters::{MockMessenger, ScriptedChecker};
use tavern_core::{NameTheme, NameTier};
use tavern_engine::{Project, ProjectConfig};
use tavern_storage::{SessionScope, SessionStore, SettingsStore};
use tempfile::TempDir;

/// One fully wired project over fakes, plus handles to everything a spec
/// needs to arrange and assert.
pub struct Harness {
    pub dir: TempDir,
    pub messenger: MockMessenger,
    pub checker: ScriptedChecker,
    pub store: SessionStore,
}

impl Harness {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let settings = SettingsStore::open(dir.path().join("state/settings.json")).unwrap();
        Self {
            messenger: MockMessenger::new(),
            checker: ScriptedChecker::new(),
            store: SessionStore::new(Arc::new(settings)),
            dir,
        }
    }

    pub fn project_root(&self) -> PathBuf {
        let root = self.dir.path().join("workdir");
        std::fs::create_dir_all(&root).unwrap();
        root
    }

    pub fn runtime_root(&self) -> PathBuf {
        self.dir.path().join("runtime")
    }

    /// Open a project with a single-tier theme.
    pub fn open_project(&self, theme_names: &[&str]) -> Arc<Project<MockMessenger>> {
        let config = ProjectConfig::new(self.messenger.clone(), self.store.clone())
            .with_checker(Arc::new(self.checker.clone()))
            .with_theme(NameTheme::new(
                "spec",
                vec![NameTier::new(theme_names.iter().copied())],
            ))
            .with_runtime_root(self.runtime_root());
        Project::open(self.project_root(), config)
    }

    /// The supervisor's durable session scope for this project.
    pub fn supervisor_scope(&self, project: &Project<MockMessenger>) -> SessionScope {
        SessionScope::Supervisor {
            project: project.encoded_root().to_string(),
        }
    }
}
