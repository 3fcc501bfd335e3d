// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! This file defines the final ledger associating keys to their ledger
//! objects.

use crate::changes::{LedgerChanges, SetOrDelete};
use crate::config::{FeeSchedule, LedgerConfig};
use crate::error::LedgerError;
use crate::view::ReadView;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound::{Excluded, Included};
use strand_models::keylet;
use strand_models::ledger::{AccountRoot, LedgerObject};
use strand_models::{AccountId, Key, NativeAmount, Timestamp};
use tracing::debug;

/// Represents the final ledger: the agreed base state a transaction
/// application pass mutates through [`crate::ApplyView`] layers.
///
/// The in-memory tree is sorted by key, giving `O(log N)` reads and ordered
/// range scans for directory traversal.
#[derive(Debug)]
pub struct FinalLedger {
    /// ledger configuration
    pub(crate) config: LedgerConfig,
    /// ledger tree, sorted by key
    sorted_ledger: BTreeMap<Key, LedgerObject>,
    /// close time of the parent ledger
    close_time: Timestamp,
}

impl FinalLedger {
    /// Initializes a new `FinalLedger` from its configuration.
    pub fn new(config: LedgerConfig) -> Self {
        FinalLedger {
            config,
            sorted_ledger: BTreeMap::new(),
            close_time: Timestamp::from_secs(0),
        }
    }

    /// Loads the initial ledger from the configured JSON file mapping
    /// account identifiers to their starting native balances.
    pub fn load_initial_ledger(&mut self) -> Result<(), LedgerError> {
        let initial_ledger: HashMap<AccountId, NativeAmount> = serde_json::from_str(
            &std::fs::read_to_string(&self.config.initial_ledger_path).map_err(|err| {
                LedgerError::FileError(format!(
                    "error loading initial ledger file {}: {}",
                    self.config
                        .initial_ledger_path
                        .to_str()
                        .unwrap_or("(non-utf8 path)"),
                    err
                ))
            })?,
        )
        .map_err(|err| {
            LedgerError::FileError(format!(
                "error parsing initial ledger file {}: {}",
                self.config
                    .initial_ledger_path
                    .to_str()
                    .unwrap_or("(non-utf8 path)"),
                err
            ))
        })?;
        for (id, balance) in initial_ledger {
            self.put(
                keylet::account(&id),
                LedgerObject::Account(AccountRoot::new(id, balance)),
            );
        }
        Ok(())
    }

    /// Allows applying `LedgerChanges` to the final ledger.
    pub fn apply_changes(&mut self, changes: LedgerChanges) {
        debug!("applying {} changes to the final ledger", changes.len());
        for (key, change) in changes.0 {
            match change {
                SetOrDelete::Set(object) => {
                    self.sorted_ledger.insert(key, object);
                }
                SetOrDelete::Delete => {
                    self.sorted_ledger.remove(&key);
                }
            }
        }
    }

    /// Directly place an object, bypassing the change pipeline. Used for
    /// genesis seeding.
    pub fn put(&mut self, key: Key, object: LedgerObject) {
        self.sorted_ledger.insert(key, object);
    }

    /// Set the parent close time exposed to views.
    pub fn set_close_time(&mut self, close_time: Timestamp) {
        self.close_time = close_time;
    }

    /// Number of objects in the ledger.
    pub fn len(&self) -> usize {
        self.sorted_ledger.len()
    }

    /// Returns `true` if the ledger holds no objects.
    pub fn is_empty(&self) -> bool {
        self.sorted_ledger.is_empty()
    }
}

impl ReadView for FinalLedger {
    fn read(&self, key: &Key) -> Option<LedgerObject> {
        self.sorted_ledger.get(key).cloned()
    }

    fn succ(&self, lo: &Key, hi: &Key) -> Option<Key> {
        self.sorted_ledger
            .range((Included(*lo), Excluded(*hi)))
            .next()
            .map(|(key, _)| *key)
    }

    fn fees(&self) -> &FeeSchedule {
        &self.config.fees
    }

    fn parent_close_time(&self) -> Timestamp {
        self.close_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_initial_ledger_loads_accounts() {
        let alice = AccountId::from_bytes(&[1u8; 32]);
        let bob = AccountId::from_bytes(&[2u8; 32]);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "{}": "100", "{}": "250.5" }}"#,
            alice.to_bs58_check(),
            bob.to_bs58_check()
        )
        .unwrap();

        let mut ledger = FinalLedger::new(LedgerConfig {
            initial_ledger_path: file.path().to_path_buf(),
            ..Default::default()
        });
        ledger.load_initial_ledger().unwrap();
        assert_eq!(ledger.len(), 2);
        let root = ledger
            .read(&keylet::account(&bob))
            .unwrap()
            .into_account()
            .unwrap();
        assert_eq!(root.balance, NativeAmount::from_drops(250_500_000));
        assert_eq!(root.sequence, 1);
    }

    #[test]
    fn test_apply_changes_sets_and_deletes() {
        let mut ledger = FinalLedger::new(LedgerConfig::default());
        let alice = AccountId::from_bytes(&[3u8; 32]);
        let key = keylet::account(&alice);
        let mut changes = LedgerChanges::default();
        changes.set(
            key,
            LedgerObject::Account(AccountRoot::new(alice, NativeAmount::from_drops(5))),
        );
        ledger.apply_changes(changes);
        assert!(ledger.exists(&key));

        let mut changes = LedgerChanges::default();
        changes.delete(key);
        ledger.apply_changes(changes);
        assert!(!ledger.exists(&key));
    }
}
