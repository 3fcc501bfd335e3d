// Copyright (c) 2022 MASSA LABS <info@massa.net>

use serde::{Deserialize, Serialize};
use std::fmt;

/// A network-agreed close time, in seconds since the network epoch.
///
/// All expiration comparisons in the engine use the parent ledger's close
/// time; the engine never reads a wall clock.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Build a timestamp from seconds since the network epoch.
    pub const fn from_secs(secs: u64) -> Self {
        Timestamp(secs)
    }

    /// Seconds since the network epoch.
    pub const fn secs(&self) -> u64 {
        self.0
    }

    /// Checked addition of a duration in seconds.
    pub fn checked_add_secs(&self, secs: u64) -> Option<Timestamp> {
        self.0.checked_add(secs).map(Timestamp)
    }

    /// Saturating addition of a duration in seconds.
    #[must_use]
    pub fn saturating_add_secs(&self, secs: u64) -> Timestamp {
        Timestamp(self.0.saturating_add(secs))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
