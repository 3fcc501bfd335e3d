// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! The apply view represents, in a compressed way, a speculative ledger
//! state during transaction application. It never writes to the base state
//! but keeps track of the changes applied on top of it since its creation.

use crate::changes::{Applicable, LedgerChanges, SetOrDelete};
use crate::config::FeeSchedule;
use crate::view::ReadView;
use strand_models::ledger::LedgerObject;
use strand_models::{Key, Timestamp};
use tracing::warn;

/// A mutation layer over a read-only base view.
///
/// Layers nest: [`ApplyView::sandbox`] opens a child layer whose reads
/// observe this layer's changes; [`ApplyView::apply_changes`] merges a
/// child's recorded changes back, and simply dropping a child discards
/// them. A single logical thread owns a view chain; the layers are not
/// thread-safe by design.
pub struct ApplyView<'a> {
    /// read-only access to the state below this layer
    base: &'a dyn ReadView,
    /// changes recorded by this layer since its creation
    changes: LedgerChanges,
}

impl<'a> ApplyView<'a> {
    /// Open a layer over a base view.
    pub fn new(base: &'a dyn ReadView) -> Self {
        ApplyView {
            base,
            changes: Default::default(),
        }
    }

    /// Open a nested transactional layer over this one.
    ///
    /// The child observes this layer's state; its own changes stay local
    /// until merged back with [`ApplyView::apply_changes`].
    pub fn sandbox(&self) -> ApplyView<'_> {
        ApplyView::new(self)
    }

    /// Read an object for modification; pair with [`ApplyView::update`] to
    /// write it back. The copy is taken from the nearest layer that knows
    /// the key.
    pub fn peek(&self, key: &Key) -> Option<LedgerObject> {
        self.read(key)
    }

    /// Record the creation of an object.
    pub fn insert(&mut self, key: Key, object: LedgerObject) {
        if self.exists(&key) {
            warn!("insert over an existing ledger object {}", key);
        }
        self.changes.set(key, object);
    }

    /// Record an update to an existing object.
    pub fn update(&mut self, key: Key, object: LedgerObject) {
        self.changes.set(key, object);
    }

    /// Record the removal of an object.
    pub fn erase(&mut self, key: &Key) {
        self.changes.delete(*key);
    }

    /// Returns the changes recorded by this layer since its creation,
    /// and resets their local value to nothing.
    pub fn take_changes(&mut self) -> LedgerChanges {
        std::mem::take(&mut self.changes)
    }

    /// Consume the layer, yielding its recorded changes.
    pub fn into_changes(self) -> LedgerChanges {
        self.changes
    }

    /// Borrow the changes recorded by this layer.
    pub fn changes(&self) -> &LedgerChanges {
        &self.changes
    }

    /// Merge a child layer's recorded changes into this layer.
    pub fn apply_changes(&mut self, changes: LedgerChanges) {
        self.changes.apply(changes);
    }

    /// Takes a snapshot (clone) of the changes recorded since creation.
    pub fn snapshot(&self) -> LedgerChanges {
        self.changes.clone()
    }

    /// Resets the layer to a snapshot (see the `snapshot` method).
    pub fn reset_to_snapshot(&mut self, snapshot: LedgerChanges) {
        self.changes = snapshot;
    }
}

impl ReadView for ApplyView<'_> {
    fn read(&self, key: &Key) -> Option<LedgerObject> {
        // try to read from this layer's changes, then the base
        self.changes.get_or_else(key, || self.base.read(key))
    }

    fn succ(&self, lo: &Key, hi: &Key) -> Option<Key> {
        // the first base key in range that this layer has not deleted
        let mut cursor = *lo;
        let base_candidate = loop {
            match self.base.succ(&cursor, hi) {
                None => break None,
                Some(found) if !self.changes.is_deleted(&found) => break Some(found),
                Some(found) => match found.next() {
                    Some(next) => cursor = next,
                    None => break None,
                },
            }
        };
        // overlay keys this layer set in range
        let overlay_candidate = self.changes.first_set_in_range(lo, hi);
        match (base_candidate, overlay_candidate) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn fees(&self) -> &FeeSchedule {
        self.base.fees()
    }

    fn parent_close_time(&self) -> Timestamp {
        self.base.parent_close_time()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::final_ledger::FinalLedger;
    use strand_models::keylet;
    use strand_models::ledger::AccountRoot;
    use strand_models::{AccountId, NativeAmount};

    fn base_with_account(id: AccountId, drops: i64) -> FinalLedger {
        let mut ledger = FinalLedger::new(LedgerConfig::default());
        ledger.put(
            keylet::account(&id),
            LedgerObject::Account(AccountRoot::new(id, NativeAmount::from_drops(drops))),
        );
        ledger
    }

    #[test]
    fn test_reads_observe_most_recent_layer() {
        let alice = AccountId::from_bytes(&[1u8; 32]);
        let key = keylet::account(&alice);
        let ledger = base_with_account(alice, 100);
        let mut view = ApplyView::new(&ledger);

        let mut root = view.peek(&key).unwrap().into_account().unwrap();
        root.balance = NativeAmount::from_drops(80);
        view.update(key, LedgerObject::Account(root));

        let child = view.sandbox();
        assert_eq!(
            child
                .read(&key)
                .unwrap()
                .into_account()
                .unwrap()
                .balance
                .drops(),
            80
        );
    }

    #[test]
    fn test_discarded_sandbox_leaves_parent_untouched() {
        let alice = AccountId::from_bytes(&[2u8; 32]);
        let key = keylet::account(&alice);
        let ledger = base_with_account(alice, 100);
        let mut view = ApplyView::new(&ledger);
        let before = view.snapshot();
        {
            let mut child = view.sandbox();
            child.erase(&key);
            assert!(!child.exists(&key));
            // dropped without apply_changes
        }
        assert!(view.exists(&key));
        assert_eq!(view.snapshot(), before);
    }

    #[test]
    fn test_applied_sandbox_changes_become_visible_once() {
        let alice = AccountId::from_bytes(&[3u8; 32]);
        let key = keylet::account(&alice);
        let ledger = base_with_account(alice, 100);
        let mut view = ApplyView::new(&ledger);
        let changes = {
            let mut child = view.sandbox();
            child.erase(&key);
            child.into_changes()
        };
        view.apply_changes(changes);
        assert!(!view.exists(&key));
        // the base is still untouched
        assert!(ledger.exists(&key));
    }

    #[test]
    fn test_snapshot_reset_rolls_back_in_place() {
        let alice = AccountId::from_bytes(&[4u8; 32]);
        let key = keylet::account(&alice);
        let ledger = base_with_account(alice, 100);
        let mut view = ApplyView::new(&ledger);
        let snapshot = view.snapshot();
        view.erase(&key);
        assert!(!view.exists(&key));
        view.reset_to_snapshot(snapshot);
        assert!(view.exists(&key));
    }

    #[test]
    fn test_succ_merges_overlay_and_base() {
        let alice = AccountId::from_bytes(&[5u8; 32]);
        let ledger = base_with_account(alice, 100);
        let base_key = keylet::account(&alice);
        let mut view = ApplyView::new(&ledger);

        // the base key is visible through the overlay
        assert_eq!(view.succ(&Key::ZERO, &Key::MAX), Some(base_key));

        // deleting it in the overlay hides it
        view.erase(&base_key);
        assert_eq!(view.succ(&Key::ZERO, &Key::MAX), None);

        // an overlay insert below the base key is found first
        let low = Key::ZERO.next().unwrap();
        view.insert(
            low,
            LedgerObject::Account(AccountRoot::new(alice, NativeAmount::zero())),
        );
        assert_eq!(view.succ(&Key::ZERO, &Key::MAX), Some(low));
    }
}
