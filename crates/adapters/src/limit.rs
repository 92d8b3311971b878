// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide cap on concurrent runtime calls.
//!
//! One semaphore for the whole process: every live runtime call holds a
//! permit for its full duration, so at most [`MAX_IN_FLIGHT`] subprocesses
//! talk to the LLM at once. Callers wait cooperatively when saturated. The
//! permit must never be held while waiting on user input.

use std::sync::{Arc, OnceLock};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Maximum simultaneously in-flight runtime calls.
pub const MAX_IN_FLIGHT: usize = 10;

static PERMITS: OnceLock<Arc<Semaphore>> = OnceLock::new();

fn permits() -> &'static Arc<Semaphore> {
    PERMITS.get_or_init(|| Arc::new(Semaphore::new(MAX_IN_FLIGHT)))
}

/// Acquire a permit, waiting cooperatively if the cap is saturated.
pub async fn acquire() -> OwnedSemaphorePermit {
    match permits().clone().acquire_owned().await {
        Ok(permit) => permit,
        // The semaphore is never closed.
        Err(_) => unreachable!("llm permit semaphore is never closed"),
    }
}

/// Permits currently available. Snapshot only; for diagnostics and tests.
pub fn available() -> usize {
    permits().available_permits()
}

#[cfg(test)]
#[path = "limit_tests.rs"]
mod tests;
