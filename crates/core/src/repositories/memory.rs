//! In-memory [`OrderStore`] with JSON snapshot load/save.
//!
//! Snapshot format:
//!
//! ```json
//! {
//!   "scopes": [
//!     {"kind": "category", "entries": [{"id": "c1", "order": 0}]},
//!     {"kind": "lesson", "parent": "sub-1", "entries": [{"id": "l1", "order": 0}]}
//!   ]
//! }
//! ```

use super::OrderStore;
use crate::entity::{append_order, OrderedEntry, SiblingScope};
use crate::reorder::OrderPatch;
use crate::{LmsError, LmsResult};
use lms_types::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub scopes: Vec<ScopeSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSnapshot {
    #[serde(flatten)]
    pub scope: SiblingScope,
    #[serde(default)]
    pub entries: Vec<OrderedEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    scopes: BTreeMap<SiblingScope, Vec<OrderedEntry>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a snapshot.
    ///
    /// # Errors
    ///
    /// - `LmsError::InvalidInput` if a scope appears twice.
    /// - `LmsError::DuplicateEntity` if an id appears twice within one scope.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> LmsResult<Self> {
        let mut scopes = BTreeMap::new();
        for ScopeSnapshot { scope, entries } in snapshot.scopes {
            let mut seen = HashSet::new();
            for entry in &entries {
                if !seen.insert(&entry.id) {
                    return Err(LmsError::DuplicateEntity {
                        id: entry.id.clone(),
                        scope: scope.to_string(),
                    });
                }
            }
            if scopes.contains_key(&scope) {
                return Err(LmsError::InvalidInput(format!(
                    "scope listed more than once: {}",
                    scope
                )));
            }
            scopes.insert(scope, entries);
        }
        Ok(Self { scopes })
    }

    pub fn to_snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            scopes: self
                .scopes
                .iter()
                .map(|(scope, entries)| ScopeSnapshot {
                    scope: scope.clone(),
                    entries: entries.clone(),
                })
                .collect(),
        }
    }

    /// Loads a snapshot file.
    pub fn load(path: &Path) -> LmsResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(LmsError::FileRead)?;
        let snapshot: StoreSnapshot =
            serde_json::from_str(&contents).map_err(LmsError::Deserialization)?;
        Self::from_snapshot(snapshot)
    }

    /// Saves a snapshot file.
    ///
    /// The snapshot is written to a sibling temporary file and renamed into place, so a
    /// crash mid-write never leaves a truncated store behind.
    pub fn save(&self, path: &Path) -> LmsResult<()> {
        let mut json =
            serde_json::to_string_pretty(&self.to_snapshot()).map_err(LmsError::Serialization)?;
        json.push('\n');

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        std::fs::write(&tmp_path, json).map_err(LmsError::FileWrite)?;
        std::fs::rename(&tmp_path, path).map_err(LmsError::FileWrite)
    }

    fn unknown(id: &EntityId, scope: &SiblingScope) -> LmsError {
        LmsError::UnknownEntity {
            id: id.clone(),
            scope: scope.to_string(),
        }
    }
}

impl OrderStore for InMemoryOrderStore {
    fn siblings(&self, scope: &SiblingScope) -> LmsResult<Vec<OrderedEntry>> {
        Ok(self.scopes.get(scope).cloned().unwrap_or_default())
    }

    fn write_orders(&mut self, scope: &SiblingScope, patches: &[OrderPatch]) -> LmsResult<()> {
        let mut seen = HashSet::new();
        for patch in patches {
            if !seen.insert(&patch.id) {
                return Err(LmsError::DuplicatePatch {
                    id: patch.id.clone(),
                });
            }
        }

        let Some(entries) = self.scopes.get_mut(scope) else {
            return match patches.first() {
                Some(patch) => Err(Self::unknown(&patch.id, scope)),
                None => Ok(()),
            };
        };

        // Validate the whole batch before touching anything.
        let mut targets = Vec::with_capacity(patches.len());
        for patch in patches {
            let idx = entries
                .iter()
                .position(|e| e.id == patch.id)
                .ok_or_else(|| Self::unknown(&patch.id, scope))?;
            targets.push((idx, patch.order));
        }

        for (idx, order) in targets {
            entries[idx].order = order;
        }
        Ok(())
    }

    fn insert(&mut self, scope: &SiblingScope, id: EntityId) -> LmsResult<OrderedEntry> {
        let entries = self.scopes.entry(scope.clone()).or_default();
        if entries.iter().any(|e| e.id == id) {
            return Err(LmsError::DuplicateEntity {
                id,
                scope: scope.to_string(),
            });
        }

        let entry = OrderedEntry::new(id, append_order(entries.as_slice()));
        entries.push(entry.clone());
        Ok(entry)
    }

    fn remove(&mut self, scope: &SiblingScope, id: &EntityId) -> LmsResult<OrderedEntry> {
        let entries = self
            .scopes
            .get_mut(scope)
            .ok_or_else(|| Self::unknown(id, scope))?;
        let idx = entries
            .iter()
            .position(|e| &e.id == id)
            .ok_or_else(|| Self::unknown(id, scope))?;
        Ok(entries.remove(idx))
    }
}
