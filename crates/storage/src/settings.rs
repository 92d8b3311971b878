// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single logical key-value space persisted as one JSON file.
//!
//! Mutations are serialized by an internal mutex and written atomically
//! (temp file + rename) so a crash mid-write cannot corrupt the store.
//! A corrupt file on load is rotated to `.bak` and replaced with an empty
//! store rather than refusing to start.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur in settings operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable key-value store backed by one JSON file.
pub struct SettingsStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl SettingsStore {
    /// Open (or create) a store at the given file path.
    ///
    /// A missing file yields an empty store. A corrupt file is moved to a
    /// `.bak` sibling and an empty store is returned.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match load_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                let bak = path.with_extension("bak");
                warn!(path = %path.display(), error = %e, "settings file corrupt, rotating to .bak");
                let _ = fs::rename(&path, &bak);
                BTreeMap::new()
            }
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Look up a string value.
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .get(key)
            .and_then(|v| v.as_str())
            .map(String::from)
    }

    /// Look up a structured value.
    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.entries.lock().get(key).cloned()
    }

    /// Set a string value and persist.
    pub fn set_string(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.set_value(key, Value::String(value.to_string()))
    }

    /// Set a structured value and persist.
    pub fn set_value(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value);
        self.persist(&entries)
    }

    /// Remove a key and persist. Removing an absent key is a no-op.
    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Save atomically (write to .tmp, then rename).
    fn persist(&self, entries: &BTreeMap<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("tmp");

        // Write to temp file and sync
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, entries)?;
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }

        // Atomic rename
        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }
}

fn load_entries(path: &Path) -> Result<BTreeMap<String, Value>, StorageError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
