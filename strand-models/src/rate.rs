// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::amount::{Amount, IssuedAmount, Rounding};
use crate::constants::QUALITY_ONE;
use crate::error::ModelsError;
use crate::issue::Issue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a transfer rate.
///
/// Transfer rates are specified as fractions of 1 billion. For example, a
/// transfer rate of 1% is represented as 1,010,000,000.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rate {
    /// raw parts-per-billion value
    pub value: u32,
}

/// A transfer rate signifying a 1:1 exchange
pub const PARITY_RATE: Rate = Rate {
    value: QUALITY_ONE as u32,
};

impl Rate {
    /// Build a rate from its parts-per-billion representation.
    pub const fn new(value: u32) -> Self {
        Rate { value }
    }

    /// A valid transfer rate never destroys value (below parity) nor charges
    /// more than 100% on top of the transferred amount.
    pub fn is_valid_transfer_rate(&self) -> bool {
        (self.value as u64) >= QUALITY_ONE && (self.value as u64) <= 2 * QUALITY_ONE
    }

    fn as_amount(&self) -> Amount {
        // rate as a dimensionless factor: value * 10^-9
        Amount::Issued(
            IssuedAmount::new(self.value as i64, -9).expect("rate always normalizes"),
            Issue::native(),
        )
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Scale `amount` up by `rate`, rounding in the given direction, expressing
/// the result under the amount's own issue.
///
/// # Example
/// ```
/// # use strand_models::{Amount, Rate, Rounding};
/// # use strand_models::rate::multiply_round;
/// let fee_rate = Rate::new(1_010_000_000); // 1%
/// let amount = Amount::from_drops(1_000);
/// let debit = multiply_round(&amount, fee_rate, Rounding::Up).unwrap();
/// assert_eq!(debit, Amount::from_drops(1_010));
/// ```
pub fn multiply_round(
    amount: &Amount,
    rate: Rate,
    rounding: Rounding,
) -> Result<Amount, ModelsError> {
    multiply_round_to(amount, rate, &amount.issue(), rounding)
}

/// Scale `amount` up by `rate`, expressing the result under `issue`.
pub fn multiply_round_to(
    amount: &Amount,
    rate: Rate,
    issue: &Issue,
    rounding: Rounding,
) -> Result<Amount, ModelsError> {
    if rate == PARITY_RATE {
        // avoid introducing rounding error on the 1:1 rate
        return Ok(*amount);
    }
    Amount::mul_round(amount, &rate.as_amount(), issue, rounding)
}

/// Scale `amount` down by `rate`, rounding in the given direction,
/// expressing the result under the amount's own issue.
pub fn divide_round(
    amount: &Amount,
    rate: Rate,
    rounding: Rounding,
) -> Result<Amount, ModelsError> {
    divide_round_to(amount, rate, &amount.issue(), rounding)
}

/// Scale `amount` down by `rate`, expressing the result under `issue`.
pub fn divide_round_to(
    amount: &Amount,
    rate: Rate,
    issue: &Issue,
    rounding: Rounding,
) -> Result<Amount, ModelsError> {
    if rate == PARITY_RATE {
        return Ok(*amount);
    }
    Amount::div_round(amount, &rate.as_amount(), issue, rounding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parity_rate_is_identity() {
        let amount = Amount::from_drops(123_456_789);
        assert_eq!(
            multiply_round(&amount, PARITY_RATE, Rounding::Up).unwrap(),
            amount
        );
        assert_eq!(
            divide_round(&amount, PARITY_RATE, Rounding::Down).unwrap(),
            amount
        );
    }

    #[test]
    fn test_transfer_rate_bounds() {
        assert!(PARITY_RATE.is_valid_transfer_rate());
        assert!(Rate::new(2_000_000_000).is_valid_transfer_rate());
        assert!(!Rate::new(999_999_999).is_valid_transfer_rate());
        assert!(!Rate::new(2_000_000_001).is_valid_transfer_rate());
    }

    #[test]
    fn test_multiply_then_divide_never_gains() {
        let rate = Rate::new(1_005_000_000);
        let amount = Amount::from_drops(997);
        let scaled = multiply_round(&amount, rate, Rounding::Up).unwrap();
        assert_eq!(scaled, Amount::from_drops(1_002));
        // scaling up then back down recovers at most the original amount
        let back = divide_round(&scaled, rate, Rounding::Down).unwrap();
        assert_eq!(back, amount);
        let down = multiply_round(&amount, rate, Rounding::Down).unwrap();
        assert!(down.checked_cmp(&scaled).unwrap() != std::cmp::Ordering::Greater);
    }
}
