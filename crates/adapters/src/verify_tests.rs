// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn shell_checker_passes_on_zero_exit() {
    assert_eq!(ShellChecker.check("true").await, Ok(true));
}

#[tokio::test]
async fn shell_checker_fails_cleanly_on_nonzero_exit() {
    for assertion in ["false", "exit 3", "test -f /nonexistent/file"] {
        assert_eq!(ShellChecker.check(assertion).await, Ok(false), "{assertion}");
    }
}

#[tokio::test]
async fn shell_checker_runs_real_commands() {
    // Pipelines and quoting go through the shell untouched
    assert_eq!(
        ShellChecker.check("echo pass | grep -q pass").await,
        Ok(true)
    );
}

// --- scripted checker ---

#[tokio::test]
async fn scripted_checker_replays_outcomes_in_order() {
    let checker = ScriptedChecker::new();
    checker.queue(Ok(false));
    checker.queue(Ok(true));
    assert_eq!(checker.check("first").await, Ok(false));
    assert_eq!(checker.check("second").await, Ok(true));
}

#[tokio::test]
async fn scripted_checker_defaults_to_pass() {
    let checker = ScriptedChecker::new();
    assert_eq!(checker.check("anything").await, Ok(true));
}

#[tokio::test]
async fn scripted_checker_can_error() {
    let checker = ScriptedChecker::new();
    checker.queue(Err("checker exploded".to_string()));
    assert_eq!(
        checker.check("x").await,
        Err("checker exploded".to_string())
    );
}

#[tokio::test]
async fn scripted_checker_records_assertions() {
    let checker = ScriptedChecker::new();
    let _ = checker.check("cargo test").await;
    let _ = checker.check("ls out.txt").await;
    assert_eq!(checker.checked(), vec!["cargo test", "ls out.txt"]);
}
