// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commitment records: verifiable promises a servitor must satisfy
//! before it may complete.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Evaluation status of a commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitmentStatus {
    /// Not yet evaluated
    Pending,
    /// Last evaluation succeeded
    Passed,
    /// Last evaluation failed cleanly
    Failed,
}

/// A description-plus-assertion pair.
///
/// The assertion is an opaque command string; how it is executed is the
/// checker's concern, not this type's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub description: String,
    pub assertion: String,
    pub status: CommitmentStatus,
}

impl Commitment {
    /// Create a pending commitment.
    pub fn new(description: impl Into<String>, assertion: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            assertion: assertion.into(),
            status: CommitmentStatus::Pending,
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status {
            CommitmentStatus::Pending => "pending",
            CommitmentStatus::Passed => "passed",
            CommitmentStatus::Failed => "failed",
        };
        write!(f, "{} [{}]", self.description, status)
    }
}

#[cfg(test)]
#[path = "commitment_tests.rs"]
mod tests;
