// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commitment checker: executes a commitment's opaque assertion string.
//!
//! The assertion's execution mechanism is pluggable. The production checker
//! hands the string to `sh -c` and reads the exit status: zero is a pass,
//! nonzero a clean fail, and a failure to launch at all is an error
//! (distinct from a fail, so the caller can surface it).

use async_trait::async_trait;

/// Evaluates one assertion. `Ok(true)` passed, `Ok(false)` failed cleanly,
/// `Err` the check itself could not run.
#[async_trait]
pub trait CommitmentChecker: Send + Sync + 'static {
    async fn check(&self, assertion: &str) -> Result<bool, String>;
}

/// Production checker: runs the assertion as a shell command.
#[derive(Debug, Clone, Default)]
pub struct ShellChecker;

#[async_trait]
impl CommitmentChecker for ShellChecker {
    async fn check(&self, assertion: &str) -> Result<bool, String> {
        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(assertion)
            .output()
            .await
            .map_err(|e| format!("failed to run assertion: {e}"))?;
        tracing::debug!(assertion, success = output.status.success(), "assertion checked");
        Ok(output.status.success())
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod scripted {
    use super::CommitmentChecker;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    struct ScriptedState {
        outcomes: VecDeque<Result<bool, String>>,
        checked: Vec<String>,
    }

    /// Checker that replays canned outcomes and records every assertion.
    ///
    /// An empty queue passes, so tests only script the interesting calls.
    #[derive(Clone)]
    pub struct ScriptedChecker {
        inner: Arc<Mutex<ScriptedState>>,
    }

    impl Default for ScriptedChecker {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ScriptedChecker {
        pub fn new() -> Self {
            Self {
                inner: Arc::new(Mutex::new(ScriptedState {
                    outcomes: VecDeque::new(),
                    checked: Vec::new(),
                })),
            }
        }

        /// Queue the outcome for the next check.
        pub fn queue(&self, outcome: Result<bool, String>) {
            self.inner.lock().outcomes.push_back(outcome);
        }

        /// Assertions checked so far, in order.
        pub fn checked(&self) -> Vec<String> {
            self.inner.lock().checked.clone()
        }
    }

    #[async_trait]
    impl CommitmentChecker for ScriptedChecker {
        async fn check(&self, assertion: &str) -> Result<bool, String> {
            let mut inner = self.inner.lock();
            inner.checked.push(assertion.to_string());
            inner.outcomes.pop_front().unwrap_or(Ok(true))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use scripted::ScriptedChecker;

#[cfg(test)]
#[path = "verify_tests.rs"]
mod tests;
