//! Persistence of the last successful lookup.
//!
//! The store keeps a single slot. Reads never fail outward and writes are
//! best-effort: losing the remembered query only costs a re-typed city name.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{Arc, Mutex},
};
use tracing::warn;

use crate::model::LastQuery;

pub trait LastQueryStore: Send + Sync {
    /// The stored value, or `None` when absent or unreadable.
    fn load(&self) -> Option<LastQuery>;

    /// Overwrite the slot. Failures are swallowed.
    fn save(&self, value: &LastQuery);
}

/// On-disk envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLastQuery {
    pub value: LastQuery,
    pub saved_at: DateTime<Utc>,
}

/// JSON file store, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The stored value together with when it was written.
    pub fn load_entry(&self) -> Option<StoredLastQuery> {
        let contents = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    fn write(&self, value: &LastQuery) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
        }

        let entry = StoredLastQuery { value: value.clone(), saved_at: Utc::now() };
        let data = serde_json::to_vec_pretty(&entry)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl LastQueryStore for FileStore {
    fn load(&self) -> Option<LastQuery> {
        self.load_entry().map(|e| e.value)
    }

    fn save(&self, value: &LastQuery) {
        if let Err(e) = self.write(value) {
            warn!(error = %format!("{e:#}"), "Could not persist last query");
        }
    }
}

/// In-process slot. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<LastQuery>>>,
}

impl MemoryStore {
    pub fn with_value(value: LastQuery) -> Self {
        Self { slot: Arc::new(Mutex::new(Some(value))) }
    }
}

impl LastQueryStore for MemoryStore {
    fn load(&self) -> Option<LastQuery> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    fn save(&self, value: &LastQuery) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(value.clone());
        }
    }
}
