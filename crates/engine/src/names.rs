// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Servitor name allocation from a themed pool.
//!
//! Names come out tier by tier in declared order. Cursors only move
//! forward: releasing a name makes it reservable again but never rewinds
//! the walk. When every tier is spent the generator falls back to
//! `Agent-N` with a strictly monotonic counter, so spawning never fails
//! for lack of a name.

use indexmap::IndexSet;
use parking_lot::Mutex;
use tavern_core::NameTheme;

pub struct NameGenerator {
    inner: Mutex<NameState>,
}

struct NameState {
    theme: NameTheme,
    /// Tier currently being drawn from
    tier_cursor: usize,
    /// Next index within each tier
    tier_indexes: Vec<usize>,
    /// Names currently held, in reservation order
    used: IndexSet<String>,
    fallback_counter: u64,
}

impl NameGenerator {
    pub fn new(theme: NameTheme) -> Self {
        let tier_indexes = vec![0; theme.tiers.len()];
        Self {
            inner: Mutex::new(NameState {
                theme,
                tier_cursor: 0,
                tier_indexes,
                used: IndexSet::new(),
                fallback_counter: 0,
            }),
        }
    }

    /// The next unused themed name, or `None` when all tiers are exhausted.
    pub fn next_name(&self) -> Option<String> {
        let mut state = self.inner.lock();
        state.next_themed()
    }

    /// As [`next_name`](Self::next_name), but falls back to `Agent-N` on
    /// exhaustion. The returned name is always reserved.
    pub fn next_name_or_fallback(&self) -> String {
        let mut state = self.inner.lock();
        if let Some(name) = state.next_themed() {
            return name;
        }
        loop {
            state.fallback_counter += 1;
            let candidate = format!("Agent-{}", state.fallback_counter);
            if !state.used.contains(&candidate) {
                state.used.insert(candidate.clone());
                return candidate;
            }
        }
    }

    /// Reserve a specific name. Returns false if already held.
    pub fn reserve(&self, name: &str) -> bool {
        let mut state = self.inner.lock();
        if state.used.contains(name) {
            false
        } else {
            state.used.insert(name.to_string());
            true
        }
    }

    /// Release a held name, making it available to `reserve` and to the
    /// uniqueness check again.
    pub fn release(&self, name: &str) {
        self.inner.lock().used.shift_remove(name);
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.inner.lock().used.contains(name)
    }

    /// Names currently held, in reservation order.
    pub fn reserved(&self) -> Vec<String> {
        self.inner.lock().used.iter().cloned().collect()
    }

    pub fn reset(&self) {
        let mut state = self.inner.lock();
        state.tier_cursor = 0;
        let tiers = state.theme.tiers.len();
        state.tier_indexes = vec![0; tiers];
        state.used.clear();
        state.fallback_counter = 0;
    }
}

impl NameState {
    fn next_themed(&mut self) -> Option<String> {
        while self.tier_cursor < self.theme.tiers.len() {
            let tier = self.tier_cursor;
            let len = self.theme.tiers[tier].names.len();
            while self.tier_indexes[tier] < len {
                let index = self.tier_indexes[tier];
                self.tier_indexes[tier] += 1;
                let candidate = &self.theme.tiers[tier].names[index];
                if !self.used.contains(candidate) {
                    let name = candidate.clone();
                    self.used.insert(name.clone());
                    return Some(name);
                }
            }
            self.tier_cursor += 1;
        }
        None
    }
}

#[cfg(test)]
#[path = "names_tests.rs"]
mod tests;
