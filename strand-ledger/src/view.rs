// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::config::FeeSchedule;
use strand_models::ledger::LedgerObject;
use strand_models::{Key, Timestamp};

/// Read-only access to a ledger state snapshot.
///
/// Implemented by the in-memory [`crate::FinalLedger`] base and by every
/// [`crate::ApplyView`] layer stacked on top of it.
pub trait ReadView {
    /// Read the object at a key, if present.
    fn read(&self, key: &Key) -> Option<LedgerObject>;

    /// Returns `true` if an object exists at the key.
    fn exists(&self, key: &Key) -> bool {
        self.read(key).is_some()
    }

    /// The first present key in the half-open range `[lo, hi)`.
    ///
    /// Book traversal depends on this to locate the next quality-bucket
    /// directory in key order.
    fn succ(&self, lo: &Key, hi: &Key) -> Option<Key>;

    /// The fee and reserve schedule of this ledger.
    fn fees(&self) -> &FeeSchedule;

    /// The parent ledger's close time; the engine's only clock.
    fn parent_close_time(&self) -> Timestamp;
}
