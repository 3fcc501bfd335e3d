// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! This file provides structures representing changes to ledger objects

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included};
use strand_models::ledger::LedgerObject;
use strand_models::Key;

/// Trait marking a structure that supports another one (V) being applied to it
pub trait Applicable<V> {
    /// apply changes from other to mutable self
    fn apply(&mut self, changes: V);
}

/// Enumeration representing a set/delete change on a value T
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOrDelete<T: Clone> {
    /// Sets the value T to a new absolute value
    Set(T),

    /// Deletes the value T
    Delete,
}

/// Represents a set of changes to ledger objects, keyed by object key.
///
/// Changes are whole-object: a later change to a key fully replaces an
/// earlier one, so applying a change set replays per-key last-write-wins.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerChanges(pub BTreeMap<Key, SetOrDelete<LedgerObject>>);

impl Applicable<LedgerChanges> for LedgerChanges {
    fn apply(&mut self, changes: LedgerChanges) {
        for (key, change) in changes.0 {
            self.0.insert(key, change);
        }
    }
}

impl LedgerChanges {
    /// Get the change recorded for a key, if any.
    pub fn get(&self, key: &Key) -> Option<&SetOrDelete<LedgerObject>> {
        self.0.get(key)
    }

    /// Read through the change set: a recorded `Set` yields its value, a
    /// recorded `Delete` yields `None`, and an untouched key defers to `f`.
    pub fn get_or_else<F: FnOnce() -> Option<LedgerObject>>(
        &self,
        key: &Key,
        f: F,
    ) -> Option<LedgerObject> {
        match self.0.get(key) {
            Some(SetOrDelete::Set(object)) => Some(object.clone()),
            Some(SetOrDelete::Delete) => None,
            None => f(),
        }
    }

    /// Record setting a key to an absolute value.
    pub fn set(&mut self, key: Key, object: LedgerObject) {
        self.0.insert(key, SetOrDelete::Set(object));
    }

    /// Record deleting a key.
    pub fn delete(&mut self, key: Key) {
        self.0.insert(key, SetOrDelete::Delete);
    }

    /// Returns `true` if a deletion is recorded for the key.
    pub fn is_deleted(&self, key: &Key) -> bool {
        matches!(self.0.get(key), Some(SetOrDelete::Delete))
    }

    /// The first key with a recorded `Set` in `[lo, hi)`.
    pub fn first_set_in_range(&self, lo: &Key, hi: &Key) -> Option<Key> {
        self.0
            .range((Included(*lo), Excluded(*hi)))
            .find(|(_, change)| matches!(change, SetOrDelete::Set(_)))
            .map(|(key, _)| *key)
    }

    /// Returns `true` if no changes are recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded changes.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}
