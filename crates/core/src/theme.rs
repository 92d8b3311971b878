// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Name themes: ordered pools of display names partitioned into tiers.
//!
//! Tiering lets a theme degrade gracefully: favored names go first, sillier
//! fallbacks later. Themes can be authored as TOML files; a built-in theme
//! ships so the generator always has something to draw from.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a user-authored theme file.
#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("invalid theme TOML: {0}")]
    InvalidToml(#[from] toml::de::Error),
}

/// One ordered list of names within a theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameTier {
    pub names: Vec<String>,
}

impl NameTier {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

/// An ordered sequence of tiers the name generator walks through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameTheme {
    pub name: String,
    pub tiers: Vec<NameTier>,
}

impl NameTheme {
    pub fn new(name: impl Into<String>, tiers: Vec<NameTier>) -> Self {
        Self {
            name: name.into(),
            tiers,
        }
    }

    /// Parse a theme from TOML:
    ///
    /// ```toml
    /// name = "taproom"
    ///
    /// [[tiers]]
    /// names = ["Barnaby", "Greta"]
    ///
    /// [[tiers]]
    /// names = ["Tankard", "Firkin"]
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self, ThemeError> {
        Ok(toml::from_str(s)?)
    }

    /// Total number of names across all tiers.
    pub fn len(&self) -> usize {
        self.tiers.iter().map(|t| t.names.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.iter().all(|t| t.names.is_empty())
    }
}

impl Default for NameTheme {
    /// The built-in taproom theme: regulars first, staff next, barware last.
    fn default() -> Self {
        Self::new(
            "taproom",
            vec![
                NameTier::new([
                    "Barnaby", "Greta", "Ansel", "Maren", "Tobias", "Odette", "Caspar", "Isolde",
                ]),
                NameTier::new(["Juniper", "Bramble", "Saffron", "Thistle", "Clove", "Pewter"]),
                NameTier::new(["Tankard", "Firkin", "Noggin", "Flagon"]),
            ],
        )
    }
}

#[cfg(test)]
#[path = "theme_tests.rs"]
mod tests;
