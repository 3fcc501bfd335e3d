// Copyright (c) 2022 MASSA LABS <info@massa.net>

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use strand_models::NativeAmount;

/// The fee and reserve schedule read from ledger metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// reference fee for a basic transaction, in drops
    pub base_fee: NativeAmount,
    /// reserve required for an account with no owned objects
    pub reserve_base: NativeAmount,
    /// additional reserve per owned ledger object
    pub reserve_increment: NativeAmount,
}

impl FeeSchedule {
    /// The reserve an account must hold given its owned-object count.
    pub fn account_reserve(&self, owner_count: u32) -> NativeAmount {
        self.reserve_base
            .saturating_add(NativeAmount::from_drops(
                self.reserve_increment
                    .drops()
                    .saturating_mul(owner_count as i64),
            ))
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        FeeSchedule {
            base_fee: NativeAmount::from_drops(10),
            reserve_base: NativeAmount::from_drops(20_000_000),
            reserve_increment: NativeAmount::from_drops(5_000_000),
        }
    }
}

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// fee and reserve schedule
    pub fees: FeeSchedule,
    /// path to the initial ledger file
    pub initial_ledger_path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            fees: FeeSchedule::default(),
            initial_ledger_path: PathBuf::from("base_config/initial_ledger.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_reserve_scales_with_owner_count() {
        let fees = FeeSchedule::default();
        assert_eq!(fees.account_reserve(0), fees.reserve_base);
        assert_eq!(
            fees.account_reserve(3),
            NativeAmount::from_drops(35_000_000)
        );
    }
}
