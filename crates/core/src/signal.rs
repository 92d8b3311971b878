// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion-signal detection over a turn's aggregated assistant text.
//!
//! The agent system prompts instruct the model to emit these tokens, so a
//! small ordered substring ruleset is enough: completion tokens win over
//! waiting tokens, and anything else leaves the agent idle. Matching is
//! case-insensitive and deliberately naive ("not DONE yet" completes); the
//! rules are a value so an embedder can swap the token lists.

use serde::{Deserialize, Serialize};

/// What a finished turn's text tells us about the agent's intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnSignal {
    /// The agent claims its work is complete
    Completion,
    /// The agent needs user input before continuing
    Waiting,
    /// No signal; return to idle
    None,
}

/// Ordered token lists for signal detection.
///
/// Tokens are matched as case-insensitive substrings against the full
/// aggregated text of a turn. Completion tokens are checked first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalRules {
    pub completion_tokens: Vec<String>,
    pub waiting_tokens: Vec<String>,
}

impl Default for SignalRules {
    fn default() -> Self {
        Self {
            completion_tokens: vec!["DONE".to_string(), "COMPLETED".to_string()],
            waiting_tokens: vec!["WAITING".to_string(), "NEED INPUT".to_string()],
        }
    }
}

impl SignalRules {
    /// Classify a turn's full assistant text.
    pub fn detect(&self, text: &str) -> TurnSignal {
        let haystack = text.to_uppercase();
        if self
            .completion_tokens
            .iter()
            .any(|t| haystack.contains(&t.to_uppercase()))
        {
            return TurnSignal::Completion;
        }
        if self
            .waiting_tokens
            .iter()
            .any(|t| haystack.contains(&t.to_uppercase()))
        {
            return TurnSignal::Waiting;
        }
        TurnSignal::None
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
