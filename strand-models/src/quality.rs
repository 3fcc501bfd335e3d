// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::amount::{Amount, CurrencyValue, IssuedAmount, Rounding};
use crate::error::ModelsError;
use crate::issue::Issue;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Represents a pair of input and output currency amounts.
///
/// The input amount can be converted to the output amount by multiplying by
/// the rate, represented by [`Quality`]. For offers, `input` is always
/// TakerPays and `output` is always TakerGets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amounts<TIn = Amount, TOut = Amount> {
    /// the amount the taker pays
    pub input: TIn,
    /// the amount the taker gets
    pub output: TOut,
}

impl<TIn: CurrencyValue, TOut: CurrencyValue> Amounts<TIn, TOut> {
    /// Build an amounts pair.
    pub fn new(input: TIn, output: TOut) -> Self {
        Amounts { input, output }
    }

    /// Returns `true` if either quantity is not positive.
    pub fn is_empty(&self) -> bool {
        !self.input.is_positive() || !self.output.is_positive()
    }
}

/// Number of mantissa bits in the stored quality encoding
const MANTISSA_BITS: u32 = 56;
const MANTISSA_MASK: u64 = (1u64 << MANTISSA_BITS) - 1;

/// Smallest tick size accepted by [`Quality::round`]
pub const MIN_TICK_SIZE: u8 = 3;
/// Largest tick size accepted by [`Quality::round`]
pub const MAX_TICK_SIZE: u8 = 16;

/// Represents the logical ratio of output currency to input currency.
///
/// Internally this is stored using a custom floating point encoding of the
/// *inverse* ratio (input/output), so that the unsigned representation is
/// ascending in a sequence of descending actual qualities: directory pages
/// keyed by the stored value iterate best-quality-first. The comparison
/// operators account for the inversion — a *larger* stored value compares
/// as a *lower* quality.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Quality(u64);

impl Quality {
    /// Create a quality from its stored integer encoding.
    pub const fn from_raw(value: u64) -> Self {
        Quality(value)
    }

    /// The stored integer encoding.
    pub const fn to_raw(&self) -> u64 {
        self.0
    }

    /// Create a quality from the ratio of two amounts.
    ///
    /// # Example
    /// ```
    /// # use strand_models::{Amount, Amounts, Quality};
    /// // pay 2 drops, get 4 drops: quality 2.0
    /// let cheap = Quality::from_amounts(&Amounts::new(
    ///     Amount::from_drops(2), Amount::from_drops(4))).unwrap();
    /// // pay 4, get 2: quality 0.5
    /// let dear = Quality::from_amounts(&Amounts::new(
    ///     Amount::from_drops(4), Amount::from_drops(2))).unwrap();
    /// assert!(cheap > dear);
    /// assert!(dear.to_raw() > cheap.to_raw());
    /// ```
    pub fn from_amounts(amounts: &Amounts<Amount, Amount>) -> Result<Self, ModelsError> {
        if !amounts.input.is_positive() || !amounts.output.is_positive() {
            return Err(ModelsError::QualityError(
                "quality requires positive amounts".to_string(),
            ));
        }
        let rate = Amount::ratio(&amounts.input, &amounts.output, Rounding::Down)?;
        Ok(Self::from_issued_rate(&rate))
    }

    /// Create a quality from a typed pair, lifting through the tagged
    /// representation.
    pub fn from_pair<TIn: CurrencyValue, TOut: CurrencyValue>(
        input: &TIn,
        output: &TOut,
    ) -> Result<Self, ModelsError> {
        Self::from_amounts(&Amounts::new(
            input.to_amount(&Issue::native()),
            output.to_amount(&Issue::native()),
        ))
    }

    fn from_issued_rate(rate: &IssuedAmount) -> Self {
        if rate.is_zero() {
            return Quality(0);
        }
        let exponent = (rate.exponent() + 100) as u64;
        Quality((exponent << MANTISSA_BITS) | rate.mantissa() as u64)
    }

    /// The stored input/output ratio as an issued-currency value.
    pub fn rate(&self) -> IssuedAmount {
        if self.0 == 0 {
            return IssuedAmount::zero();
        }
        let mantissa = (self.0 & MANTISSA_MASK) as i64;
        let exponent = ((self.0 >> MANTISSA_BITS) as i32) - 100;
        // decoding a value we encoded always re-normalizes cleanly; a
        // crafted raw encoding that cannot normalize decodes as zero
        IssuedAmount::new(mantissa, exponent).unwrap_or_else(|_| IssuedAmount::zero())
    }

    fn rate_amount(&self) -> Amount {
        Amount::Issued(self.rate(), Issue::native())
    }

    /// Returns the quality rounded up to the specified number of decimal
    /// digits of precision.
    ///
    /// Rounding the stored inverse ratio *up* coarsens the quality toward
    /// "worse for the taker", bucketing nearby rates together.
    pub fn round(&self, tick_size: u8) -> Quality {
        debug_assert!((MIN_TICK_SIZE..=MAX_TICK_SIZE).contains(&tick_size));
        if self.0 == 0 || tick_size >= MAX_TICK_SIZE {
            return *self;
        }
        let exponent_part = self.0 & !MANTISSA_MASK;
        let mut mantissa = self.0 & MANTISSA_MASK;
        let boost = 10u64.pow((MAX_TICK_SIZE - tick_size) as u32);
        mantissa += boost - 1;
        mantissa -= mantissa % boost;
        Quality(exponent_part | mantissa)
    }

    /// Returns the scaled amounts with `input` capped at `limit`.
    ///
    /// Math is avoided if the pair is already within the limit: the input
    /// pair is returned unchanged, by identity. The output is clamped to
    /// prevent money creation.
    pub fn ceil_in(
        &self,
        amounts: &Amounts<Amount, Amount>,
        limit: &Amount,
    ) -> Result<Amounts<Amount, Amount>, ModelsError> {
        if amounts.input.checked_cmp(limit)? != Ordering::Greater {
            return Ok(*amounts);
        }
        let out_issue = amounts.output.issue();
        let output = Amount::div_round(limit, &self.rate_amount(), &out_issue, Rounding::Up)?;
        let mut result = Amounts::new(*limit, output);
        if result.output.checked_cmp(&amounts.output)? == Ordering::Greater {
            result.output = amounts.output;
        }
        Ok(result)
    }

    /// Returns the scaled amounts with `output` capped at `limit`.
    ///
    /// Math is avoided if the pair is already within the limit. The input
    /// is clamped to prevent money creation.
    pub fn ceil_out(
        &self,
        amounts: &Amounts<Amount, Amount>,
        limit: &Amount,
    ) -> Result<Amounts<Amount, Amount>, ModelsError> {
        if amounts.output.checked_cmp(limit)? != Ordering::Greater {
            return Ok(*amounts);
        }
        let in_issue = amounts.input.issue();
        let input = Amount::mul_round(limit, &self.rate_amount(), &in_issue, Rounding::Up)?;
        let mut result = Amounts::new(input, *limit);
        if result.input.checked_cmp(&amounts.input)? == Ordering::Greater {
            result.input = amounts.input;
        }
        Ok(result)
    }

    /// Typed [`Quality::ceil_in`]: the within-limit short circuit happens
    /// before any representation change, so the returned pair is the input
    /// pair itself, not a lossy reconstruction.
    pub fn ceil_in_typed<TIn: CurrencyValue, TOut: CurrencyValue>(
        &self,
        amounts: &Amounts<TIn, TOut>,
        limit: &TIn,
        issue_in: &Issue,
        issue_out: &Issue,
    ) -> Result<Amounts<TIn, TOut>, ModelsError> {
        match amounts.input.partial_cmp(limit) {
            Some(Ordering::Greater) => {}
            Some(_) => return Ok(*amounts),
            None => {
                return Err(ModelsError::CheckedOperationError(
                    "unordered amounts in ceil_in".to_string(),
                ))
            }
        }
        let lifted = Amounts::new(
            amounts.input.to_amount(issue_in),
            amounts.output.to_amount(issue_out),
        );
        let capped = self.ceil_in(&lifted, &limit.to_amount(issue_in))?;
        Ok(Amounts::new(
            TIn::try_from_amount(&capped.input)?,
            TOut::try_from_amount(&capped.output)?,
        ))
    }

    /// Typed [`Quality::ceil_out`]; see [`Quality::ceil_in_typed`].
    pub fn ceil_out_typed<TIn: CurrencyValue, TOut: CurrencyValue>(
        &self,
        amounts: &Amounts<TIn, TOut>,
        limit: &TOut,
        issue_in: &Issue,
        issue_out: &Issue,
    ) -> Result<Amounts<TIn, TOut>, ModelsError> {
        match amounts.output.partial_cmp(limit) {
            Some(Ordering::Greater) => {}
            Some(_) => return Ok(*amounts),
            None => {
                return Err(ModelsError::CheckedOperationError(
                    "unordered amounts in ceil_out".to_string(),
                ))
            }
        }
        let lifted = Amounts::new(
            amounts.input.to_amount(issue_in),
            amounts.output.to_amount(issue_out),
        );
        let capped = self.ceil_out(&lifted, &limit.to_amount(issue_out))?;
        Ok(Amounts::new(
            TIn::try_from_amount(&capped.input)?,
            TOut::try_from_amount(&capped.output)?,
        ))
    }
}

impl PartialOrd for Quality {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quality {
    /// A larger stored value is a *lower* quality: the taker receives a
    /// worse deal. Higher quality is better for the taker.
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.cmp(&self.0)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Quality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Quality({})", self.0)
    }
}

/// Calculate the quality of a two-hop path given the two hops.
///
/// The composed rate rounds up (toward worse for the taker) so a composed
/// path never advertises a better quality than it can deliver.
pub fn composed_quality(lhs: &Quality, rhs: &Quality) -> Result<Quality, ModelsError> {
    let rate = lhs.rate().mul_round(&rhs.rate(), Rounding::Up)?;
    Ok(Quality::from_issued_rate(&rate))
}
