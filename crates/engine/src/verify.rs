// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrent commitment verification.
//!
//! All unsatisfied commitments are evaluated at once under one bounded
//! timeout. Statuses are written back in place so the caller (and the UI)
//! sees exactly which promise failed.

use std::sync::Arc;
use std::time::Duration;
use tavern_adapters::CommitmentChecker;
use tavern_core::{Commitment, CommitmentStatus, TavernError};
use tokio::task::JoinSet;

/// Evaluate every unsatisfied commitment concurrently.
///
/// Returns `Ok(true)` when everything passed, `Ok(false)` when at least one
/// failed cleanly, and `Err` when a check itself errored or the round timed
/// out. Already-passed commitments are not re-run; failed ones are, so a
/// retry can heal them.
pub async fn verify_all(
    checker: &Arc<dyn CommitmentChecker>,
    commitments: &mut [Commitment],
    deadline: Duration,
) -> Result<bool, TavernError> {
    let mut set = JoinSet::new();
    for (index, commitment) in commitments.iter().enumerate() {
        if commitment.status == CommitmentStatus::Passed {
            continue;
        }
        let checker = Arc::clone(checker);
        let assertion = commitment.assertion.clone();
        set.spawn(async move { (index, checker.check(&assertion).await) });
    }

    if set.is_empty() {
        return Ok(true);
    }

    let gathered = tokio::time::timeout(deadline, async {
        let mut all_passed = true;
        let mut first_error: Option<(usize, String)> = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, Ok(passed))) => {
                    commitments[index].status = if passed {
                        CommitmentStatus::Passed
                    } else {
                        CommitmentStatus::Failed
                    };
                    if !passed {
                        all_passed = false;
                    }
                }
                Ok((index, Err(cause))) => {
                    all_passed = false;
                    if first_error.is_none() {
                        first_error = Some((index, cause));
                    }
                }
                Err(join_error) => {
                    all_passed = false;
                    if first_error.is_none() {
                        first_error = Some((0, format!("checker task failed: {join_error}")));
                    }
                }
            }
        }
        (all_passed, first_error)
    })
    .await;

    match gathered {
        Ok((all_passed, None)) => Ok(all_passed),
        Ok((_, Some((index, cause)))) => Err(TavernError::VerificationError {
            commitment: commitments
                .get(index)
                .map(|c| c.description.clone())
                .unwrap_or_default(),
            cause,
        }),
        Err(_) => {
            let stuck = commitments
                .iter()
                .find(|c| c.status == CommitmentStatus::Pending)
                .map(|c| c.description.clone())
                .unwrap_or_default();
            Err(TavernError::VerificationError {
                commitment: stuck,
                cause: format!("verification timed out after {}s", deadline.as_secs()),
            })
        }
    }
}

#[cfg(test)]
#[path = "verify_tests.rs"]
mod tests;
