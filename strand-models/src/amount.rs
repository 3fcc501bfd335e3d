// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Fixed-point currency amounts with explicit rounding control.
//!
//! Two concrete representations exist: [`NativeAmount`] (signed integer
//! drops) and [`IssuedAmount`] (sign-carrying mantissa/exponent value for
//! issued currencies). [`Amount`] tags a value with its [`Issue`] and is the
//! representation transactions and ledger objects carry. All multiplication
//! and division takes an explicit [`Rounding`] direction so that fee and
//! partial-fill computations never create value through rounding.

use crate::constants::{
    DROPS_DECIMAL_FACTOR, MAX_EXPONENT, MAX_MANTISSA, MIN_EXPONENT, MIN_MANTISSA, ZERO_EXPONENT,
};
use crate::error::ModelsError;
use crate::issue::Issue;
use rust_decimal::prelude::*;
use serde::de::Unexpected;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Numeric rounding direction for lossy arithmetic.
///
/// `Up` rounds toward positive infinity and `Down` toward negative infinity;
/// for negative results the magnitude adjustment flips accordingly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rounding {
    /// round toward positive infinity
    Up,
    /// round toward negative infinity
    Down,
}

/// Exponent gap beyond which an addition operand cannot affect the result
const ADD_ALIGN_MAX: u32 = 20;

/// A native-asset quantity in drops.
///
/// The raw `i64` representation is a fixed-point value with factor
/// [`DROPS_DECIMAL_FACTOR`]. Ledger-resident balances are never negative;
/// negative values only appear transiently during computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Ord, PartialOrd, Default, Hash)]
pub struct NativeAmount(i64);

impl NativeAmount {
    /// Create a zero amount.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Construct from a raw drop count.
    pub const fn from_drops(drops: i64) -> Self {
        Self(drops)
    }

    /// Obtain the raw drop count.
    pub const fn drops(&self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is strictly negative.
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns `true` if the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// The negated amount.
    #[must_use]
    pub fn negated(&self) -> Self {
        Self(-self.0)
    }

    /// safely add self to another amount, returning None on overflow
    /// ```
    /// # use strand_models::NativeAmount;
    /// let amount_1 = NativeAmount::from_drops(42_000_000);
    /// let amount_2 = NativeAmount::from_drops(7_000_000);
    /// let res = amount_1.checked_add(amount_2).unwrap();
    /// assert_eq!(res, NativeAmount::from_drops(49_000_000));
    /// ```
    pub fn checked_add(self, amount: NativeAmount) -> Option<Self> {
        self.0.checked_add(amount.0).map(NativeAmount)
    }

    /// safely subtract another amount from self, returning None on overflow
    /// ```
    /// # use strand_models::NativeAmount;
    /// let amount_1 = NativeAmount::from_drops(42_000_000);
    /// let amount_2 = NativeAmount::from_drops(7_000_000);
    /// let res = amount_1.checked_sub(amount_2).unwrap();
    /// assert_eq!(res, NativeAmount::from_drops(35_000_000));
    /// ```
    pub fn checked_sub(self, amount: NativeAmount) -> Option<Self> {
        self.0.checked_sub(amount.0).map(NativeAmount)
    }

    /// safely add self to another amount, saturating the result on overflow
    #[must_use]
    pub fn saturating_add(self, amount: NativeAmount) -> Self {
        NativeAmount(self.0.saturating_add(amount.0))
    }

    /// safely subtract another amount from self, saturating the result on overflow
    #[must_use]
    pub fn saturating_sub(self, amount: NativeAmount) -> Self {
        NativeAmount(self.0.saturating_sub(amount.0))
    }

    /// safely multiply self with a `u64`, returning None on overflow
    pub fn checked_mul_u64(self, factor: u64) -> Option<Self> {
        self.0.checked_mul(i64::try_from(factor).ok()?).map(NativeAmount)
    }
}

/// display a NativeAmount in decimal unit form (like "10.33")
///
/// ```
/// # use strand_models::NativeAmount;
/// let value = NativeAmount::from_drops(11_111_000);
/// assert_eq!(format!("{}", value), "11.111")
/// ```
impl fmt::Display for NativeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let res_string = Decimal::from_i64(self.0)
            .unwrap() // will never panic
            .checked_div(DROPS_DECIMAL_FACTOR.into()) // will never panic
            .unwrap() // will never panic
            .to_string();
        write!(f, "{}", res_string)
    }
}

/// build a NativeAmount from decimal unit form (like "10.33")
/// note that this will fail if the string format is invalid
/// or if the conversion would cause an overflow or precision loss
///
/// ```
/// # use strand_models::NativeAmount;
/// # use std::str::FromStr;
/// assert!(NativeAmount::from_str("11.1").is_ok());
/// assert!(NativeAmount::from_str("11.1111111").is_err());
/// assert!(NativeAmount::from_str("abc").is_err());
/// ```
impl FromStr for NativeAmount {
    type Err = ModelsError;

    fn from_str(str_amount: &str) -> Result<Self, Self::Err> {
        let res = Decimal::from_str(str_amount)
            .map_err(|err| ModelsError::AmountParseError(err.to_string()))?
            .checked_mul(DROPS_DECIMAL_FACTOR.into())
            .ok_or_else(|| ModelsError::AmountParseError("amount is too large".to_string()))?;
        if !res.fract().is_zero() {
            return Err(ModelsError::AmountParseError(format!(
                "amounts cannot be more precise than 1/{}",
                DROPS_DECIMAL_FACTOR
            )));
        }
        let res = res.to_i64().ok_or_else(|| {
            ModelsError::AmountParseError("amount is too large to be represented as i64".to_string())
        })?;
        Ok(NativeAmount(res))
    }
}

impl Serialize for NativeAmount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for NativeAmount {
    fn deserialize<D: serde::de::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NativeAmount, D::Error> {
        struct NativeAmountVisitor;
        impl<'de> serde::de::Visitor<'de> for NativeAmountVisitor {
            type Value = NativeAmount;
            fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<NativeAmount, E> {
                NativeAmount::from_str(value)
                    .map_err(|_| E::invalid_value(Unexpected::Str(value), &self))
            }
            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "a NativeAmount in decimal string form")
            }
        }
        deserializer.deserialize_str(NativeAmountVisitor)
    }
}

/// An issued-currency quantity: sign-carrying mantissa and power-of-ten
/// exponent.
///
/// Normalized form has |mantissa| in `[MIN_MANTISSA, MAX_MANTISSA]` or is
/// exactly zero; equal economic values therefore compare equal regardless of
/// how they were computed. Negative values represent debt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssuedAmount {
    mantissa: i64,
    exponent: i32,
}

impl IssuedAmount {
    /// Create a zero amount.
    pub const fn zero() -> Self {
        Self {
            mantissa: 0,
            exponent: ZERO_EXPONENT,
        }
    }

    /// Build a normalized amount from a raw mantissa and exponent.
    ///
    /// # Example
    /// ```
    /// # use strand_models::IssuedAmount;
    /// let a = IssuedAmount::new(5, 0).unwrap();
    /// let b = IssuedAmount::new(5_000, -3).unwrap();
    /// assert_eq!(a, b);
    /// ```
    pub fn new(mantissa: i64, exponent: i32) -> Result<Self, ModelsError> {
        Self::normalized(
            mantissa.unsigned_abs() as u128,
            exponent,
            mantissa < 0,
            false,
        )
    }

    /// The signed mantissa.
    pub const fn mantissa(&self) -> i64 {
        self.mantissa
    }

    /// The power-of-ten exponent.
    pub const fn exponent(&self) -> i32 {
        self.exponent
    }

    /// Returns `true` if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    /// Returns `true` if the amount is strictly negative.
    pub fn is_negative(&self) -> bool {
        self.mantissa < 0
    }

    /// Returns `true` if the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.mantissa > 0
    }

    /// The negated amount.
    #[must_use]
    pub fn negated(&self) -> Self {
        Self {
            mantissa: -self.mantissa,
            exponent: self.exponent,
        }
    }

    /// Normalize a sign/magnitude/exponent triple.
    ///
    /// `round_away` controls what happens to digits shifted out on the
    /// right: they either bump the magnitude (round away from zero) or are
    /// truncated. Overflow past `MAX_EXPONENT` is an error, never a wrap;
    /// underflow collapses to zero, or to the smallest representable
    /// magnitude when rounding away from zero.
    fn normalized(
        mantissa_abs: u128,
        exponent: i32,
        negative: bool,
        round_away: bool,
    ) -> Result<Self, ModelsError> {
        let mut mant = mantissa_abs;
        let mut exp = exponent;
        if mant == 0 {
            return Ok(Self::zero());
        }
        while mant < MIN_MANTISSA as u128 {
            if exp <= MIN_EXPONENT {
                return Ok(if round_away {
                    Self {
                        mantissa: Self::signed(MIN_MANTISSA as u128, negative),
                        exponent: MIN_EXPONENT,
                    }
                } else {
                    Self::zero()
                });
            }
            mant *= 10;
            exp -= 1;
        }
        while mant > MAX_MANTISSA as u128 {
            if exp >= MAX_EXPONENT {
                return Err(ModelsError::AmountRangeError(format!(
                    "issued amount overflow: mantissa {} exponent {}",
                    mant, exp
                )));
            }
            let rem = mant % 10;
            mant /= 10;
            if round_away && rem != 0 {
                mant += 1;
            }
            exp += 1;
        }
        if exp < MIN_EXPONENT {
            return Ok(if round_away {
                Self {
                    mantissa: Self::signed(MIN_MANTISSA as u128, negative),
                    exponent: MIN_EXPONENT,
                }
            } else {
                Self::zero()
            });
        }
        if exp > MAX_EXPONENT {
            return Err(ModelsError::AmountRangeError(format!(
                "issued amount overflow: mantissa {} exponent {}",
                mant, exp
            )));
        }
        Ok(Self {
            mantissa: Self::signed(mant, negative),
            exponent: exp,
        })
    }

    fn signed(mantissa_abs: u128, negative: bool) -> i64 {
        let mant = mantissa_abs as i64;
        if negative {
            -mant
        } else {
            mant
        }
    }

    /// Checked addition.
    pub fn checked_add(&self, other: &IssuedAmount) -> Result<Self, ModelsError> {
        if self.is_zero() {
            return Ok(*other);
        }
        if other.is_zero() {
            return Ok(*self);
        }
        let gap = self.exponent.abs_diff(other.exponent);
        if gap > ADD_ALIGN_MAX {
            // the smaller operand is below the precision of the larger
            return Ok(if self.exponent > other.exponent {
                *self
            } else {
                *other
            });
        }
        let (mut m1, mut m2) = (self.mantissa as i128, other.mantissa as i128);
        let exp = self.exponent.min(other.exponent);
        if self.exponent > other.exponent {
            m1 *= 10i128.pow(gap);
        } else {
            m2 *= 10i128.pow(gap);
        }
        let sum = m1 + m2;
        Self::normalized(sum.unsigned_abs(), exp, sum < 0, false)
    }

    /// Checked subtraction.
    pub fn checked_sub(&self, other: &IssuedAmount) -> Result<Self, ModelsError> {
        self.checked_add(&other.negated())
    }

    /// Multiplication with explicit rounding direction.
    ///
    /// # Example
    /// ```
    /// # use strand_models::{IssuedAmount, Rounding};
    /// let third = IssuedAmount::new(1, 0).unwrap()
    ///     .div_round(&IssuedAmount::new(3, 0).unwrap(), Rounding::Down)
    ///     .unwrap();
    /// let down = third.mul_round(&IssuedAmount::new(3, 0).unwrap(), Rounding::Down).unwrap();
    /// let up = third.mul_round(&IssuedAmount::new(3, 0).unwrap(), Rounding::Up).unwrap();
    /// assert!(down < IssuedAmount::new(1, 0).unwrap());
    /// assert!(up >= down);
    /// ```
    pub fn mul_round(&self, other: &IssuedAmount, rounding: Rounding) -> Result<Self, ModelsError> {
        if self.is_zero() || other.is_zero() {
            return Ok(Self::zero());
        }
        let negative = self.is_negative() != other.is_negative();
        let round_away = matches!(rounding, Rounding::Up) != negative;
        let prod =
            (self.mantissa.unsigned_abs() as u128) * (other.mantissa.unsigned_abs() as u128);
        let exp = self.exponent + other.exponent + 14;
        let ten14: u128 = 100_000_000_000_000;
        let (q, r) = (prod / ten14, prod % ten14);
        let mant = if round_away && r != 0 { q + 1 } else { q };
        Self::normalized(mant, exp, negative, round_away)
    }

    /// Division with explicit rounding direction.
    pub fn div_round(&self, other: &IssuedAmount, rounding: Rounding) -> Result<Self, ModelsError> {
        if other.is_zero() {
            return Err(ModelsError::CheckedOperationError(
                "division by zero".to_string(),
            ));
        }
        if self.is_zero() {
            return Ok(Self::zero());
        }
        let negative = self.is_negative() != other.is_negative();
        let round_away = matches!(rounding, Rounding::Up) != negative;
        let num = (self.mantissa.unsigned_abs() as u128) * 10u128.pow(17);
        let den = other.mantissa.unsigned_abs() as u128;
        let exp = self.exponent - other.exponent - 17;
        let (q, r) = (num / den, num % den);
        let mant = if round_away && r != 0 { q + 1 } else { q };
        Self::normalized(mant, exp, negative, round_away)
    }
}

impl PartialOrd for IssuedAmount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IssuedAmount {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.mantissa.signum(), other.mantissa.signum()) {
            (a, b) if a != b => a.cmp(&b),
            (0, 0) => Ordering::Equal,
            (sign, _) => {
                // same sign, both non-zero: larger exponent wins on magnitude
                let ord = self
                    .exponent
                    .cmp(&other.exponent)
                    .then(self.mantissa.unsigned_abs().cmp(&other.mantissa.unsigned_abs()));
                if sign < 0 {
                    ord.reverse()
                } else {
                    ord
                }
            }
        }
    }
}

impl fmt::Display for IssuedAmount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        write!(f, "{}e{}", self.mantissa, self.exponent)
    }
}

/// A currency value tagged with its issue.
///
/// This is the representation transactions and ledger objects carry. The
/// entrywise operations require matching issues and fail loudly otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Amount {
    /// a native-asset quantity
    Native(NativeAmount),
    /// an issued-currency quantity under a given issue
    Issued(IssuedAmount, Issue),
}

impl Amount {
    /// A zero native amount.
    pub const fn native_zero() -> Self {
        Amount::Native(NativeAmount::zero())
    }

    /// Build a native amount from drops.
    pub const fn from_drops(drops: i64) -> Self {
        Amount::Native(NativeAmount::from_drops(drops))
    }

    /// The issue of this amount.
    pub fn issue(&self) -> Issue {
        match self {
            Amount::Native(_) => Issue::native(),
            Amount::Issued(_, issue) => *issue,
        }
    }

    /// Returns `true` for native-asset amounts.
    pub fn is_native(&self) -> bool {
        matches!(self, Amount::Native(_))
    }

    /// The distinguished zero of the same issue.
    #[must_use]
    pub fn zeroed(&self) -> Self {
        match self {
            Amount::Native(_) => Amount::Native(NativeAmount::zero()),
            Amount::Issued(_, issue) => Amount::Issued(IssuedAmount::zero(), *issue),
        }
    }

    /// Returns `true` if the amount is zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Amount::Native(value) => value.is_zero(),
            Amount::Issued(value, _) => value.is_zero(),
        }
    }

    /// Returns `true` if the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        match self {
            Amount::Native(value) => value.is_positive(),
            Amount::Issued(value, _) => value.is_positive(),
        }
    }

    /// Returns `true` if the amount is strictly negative.
    pub fn is_negative(&self) -> bool {
        match self {
            Amount::Native(value) => value.is_negative(),
            Amount::Issued(value, _) => value.is_negative(),
        }
    }

    /// The negated amount.
    #[must_use]
    pub fn negated(&self) -> Self {
        match self {
            Amount::Native(value) => Amount::Native(value.negated()),
            Amount::Issued(value, issue) => Amount::Issued(value.negated(), *issue),
        }
    }

    fn check_same_issue(&self, other: &Amount) -> Result<(), ModelsError> {
        if self.issue() != other.issue() {
            return Err(ModelsError::IssueMismatch(
                self.issue().to_string(),
                other.issue().to_string(),
            ));
        }
        Ok(())
    }

    /// Checked addition; the issues must match.
    pub fn checked_add(&self, other: &Amount) -> Result<Amount, ModelsError> {
        self.check_same_issue(other)?;
        match (self, other) {
            (Amount::Native(a), Amount::Native(b)) => a
                .checked_add(*b)
                .map(Amount::Native)
                .ok_or_else(|| {
                    ModelsError::CheckedOperationError("native amount overflow".to_string())
                }),
            (Amount::Issued(a, issue), Amount::Issued(b, _)) => {
                Ok(Amount::Issued(a.checked_add(b)?, *issue))
            }
            // an issued value tagged with the native issue never reaches
            // entrywise arithmetic
            _ => Err(ModelsError::IssueMismatch(
                self.issue().to_string(),
                other.issue().to_string(),
            )),
        }
    }

    /// Checked subtraction; the issues must match.
    pub fn checked_sub(&self, other: &Amount) -> Result<Amount, ModelsError> {
        self.checked_add(&other.negated())
    }

    /// Compare two amounts of the same issue.
    pub fn checked_cmp(&self, other: &Amount) -> Result<Ordering, ModelsError> {
        self.check_same_issue(other)?;
        match (self, other) {
            (Amount::Native(a), Amount::Native(b)) => Ok(a.cmp(b)),
            (Amount::Issued(a, _), Amount::Issued(b, _)) => Ok(a.cmp(b)),
            _ => Err(ModelsError::IssueMismatch(
                self.issue().to_string(),
                other.issue().to_string(),
            )),
        }
    }

    fn raw_parts(&self) -> (u128, i32, bool) {
        match self {
            Amount::Native(value) => (value.drops().unsigned_abs() as u128, 0, value.is_negative()),
            Amount::Issued(value, _) => (
                value.mantissa().unsigned_abs() as u128,
                value.exponent(),
                value.is_negative(),
            ),
        }
    }

    fn from_scaled(
        mantissa: u128,
        exponent: i32,
        negative: bool,
        round_away: bool,
        issue: &Issue,
    ) -> Result<Amount, ModelsError> {
        if issue.is_native() {
            let drops = scale_to_integer(mantissa, exponent, round_away)?;
            let drops = i64::try_from(drops).map_err(|_| {
                ModelsError::AmountRangeError("native amount overflow".to_string())
            })?;
            Ok(Amount::Native(NativeAmount::from_drops(if negative {
                -drops
            } else {
                drops
            })))
        } else {
            Ok(Amount::Issued(
                IssuedAmount::normalized(mantissa, exponent, negative, round_away)?,
                *issue,
            ))
        }
    }

    /// Multiply two amounts, rounding in the given direction, and express
    /// the result under `issue` (integer drops for the native asset,
    /// canonical mantissa/exponent otherwise).
    ///
    /// The issue tags of the operands are ignored: this is raw ratio math,
    /// used by quality scaling and transfer-rate application.
    pub fn mul_round(
        lhs: &Amount,
        rhs: &Amount,
        issue: &Issue,
        rounding: Rounding,
    ) -> Result<Amount, ModelsError> {
        if lhs.is_zero() || rhs.is_zero() {
            return Ok(Amount::from_scaled(0, 0, false, false, issue)?);
        }
        let (m1, e1, n1) = lhs.raw_parts();
        let (m2, e2, n2) = rhs.raw_parts();
        let negative = n1 != n2;
        let round_away = matches!(rounding, Rounding::Up) != negative;
        let prod = m1.checked_mul(m2).ok_or_else(|| {
            ModelsError::AmountRangeError("multiplication overflow".to_string())
        })?;
        if issue.is_native() {
            Amount::from_scaled(prod, e1 + e2, negative, round_away, issue)
        } else {
            let ten14: u128 = 100_000_000_000_000;
            let (q, r) = (prod / ten14, prod % ten14);
            let mant = if round_away && r != 0 { q + 1 } else { q };
            Amount::from_scaled(mant, e1 + e2 + 14, negative, round_away, issue)
        }
    }

    /// The ratio `lhs / rhs` in canonical mantissa/exponent form,
    /// disregarding the operands' issue tags.
    pub fn ratio(
        lhs: &Amount,
        rhs: &Amount,
        rounding: Rounding,
    ) -> Result<IssuedAmount, ModelsError> {
        if rhs.is_zero() {
            return Err(ModelsError::CheckedOperationError(
                "division by zero".to_string(),
            ));
        }
        if lhs.is_zero() {
            return Ok(IssuedAmount::zero());
        }
        let (m1, e1, n1) = lhs.raw_parts();
        let (m2, e2, n2) = rhs.raw_parts();
        let negative = n1 != n2;
        let round_away = matches!(rounding, Rounding::Up) != negative;
        let num = m1.checked_mul(10u128.pow(17)).ok_or_else(|| {
            ModelsError::AmountRangeError("division overflow".to_string())
        })?;
        let (q, r) = (num / m2, num % m2);
        let mant = if round_away && r != 0 { q + 1 } else { q };
        IssuedAmount::normalized(mant, e1 - e2 - 17, negative, round_away)
    }

    /// Divide two amounts, rounding in the given direction, and express the
    /// result under `issue`. See [`Amount::mul_round`].
    pub fn div_round(
        lhs: &Amount,
        rhs: &Amount,
        issue: &Issue,
        rounding: Rounding,
    ) -> Result<Amount, ModelsError> {
        if rhs.is_zero() {
            return Err(ModelsError::CheckedOperationError(
                "division by zero".to_string(),
            ));
        }
        if lhs.is_zero() {
            return Ok(Amount::from_scaled(0, 0, false, false, issue)?);
        }
        let (m1, e1, n1) = lhs.raw_parts();
        let (m2, e2, n2) = rhs.raw_parts();
        let negative = n1 != n2;
        let round_away = matches!(rounding, Rounding::Up) != negative;
        let num = m1.checked_mul(10u128.pow(17)).ok_or_else(|| {
            ModelsError::AmountRangeError("division overflow".to_string())
        })?;
        let (q, r) = (num / m2, num % m2);
        let mant = if round_away && r != 0 { q + 1 } else { q };
        Amount::from_scaled(mant, e1 - e2 - 17, negative, round_away, issue)
    }
}

impl PartialOrd for Amount {
    /// Ordering is only defined within one issue; `None` otherwise.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.checked_cmp(other).ok()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Amount::Native(value) => write!(f, "{} {}", value, Issue::native()),
            Amount::Issued(value, issue) => write!(f, "{} {}", value, issue),
        }
    }
}

/// Scale an integer magnitude by a power of ten, producing an integer.
///
/// Digits shifted out on the right bump the result when `round_away` is set.
fn scale_to_integer(value: u128, exponent: i32, round_away: bool) -> Result<u128, ModelsError> {
    let mut value = value;
    if exponent >= 0 {
        for _ in 0..exponent {
            value = value.checked_mul(10).ok_or_else(|| {
                ModelsError::AmountRangeError("scaling overflow".to_string())
            })?;
        }
        Ok(value)
    } else {
        let mut lost = false;
        for _ in 0..(-exponent) {
            lost |= value % 10 != 0;
            value /= 10;
            if value == 0 && !round_away {
                return Ok(0);
            }
        }
        if lost && round_away {
            value += 1;
        }
        Ok(value)
    }
}

/// Capability set shared by all currency-value representations.
///
/// The matching engine is generic over this trait and monomorphizes per
/// (input, output) representation pair; the tagged [`Amount`] also
/// implements it so untyped callers can use the same machinery.
pub trait CurrencyValue: Copy + PartialEq + PartialOrd + fmt::Debug {
    /// Returns `true` if the value is zero.
    fn is_zero(&self) -> bool;
    /// Returns `true` if the value is strictly positive.
    fn is_positive(&self) -> bool;
    /// Checked addition.
    fn add(&self, other: &Self) -> Result<Self, ModelsError>;
    /// Checked subtraction.
    fn sub(&self, other: &Self) -> Result<Self, ModelsError>;
    /// Lift into the tagged representation under `issue`.
    fn to_amount(&self, issue: &Issue) -> Amount;
    /// Project out of the tagged representation.
    fn try_from_amount(amount: &Amount) -> Result<Self, ModelsError>;
}

impl CurrencyValue for NativeAmount {
    fn is_zero(&self) -> bool {
        NativeAmount::is_zero(self)
    }
    fn is_positive(&self) -> bool {
        NativeAmount::is_positive(self)
    }
    fn add(&self, other: &Self) -> Result<Self, ModelsError> {
        self.checked_add(*other).ok_or_else(|| {
            ModelsError::CheckedOperationError("native amount overflow".to_string())
        })
    }
    fn sub(&self, other: &Self) -> Result<Self, ModelsError> {
        self.checked_sub(*other).ok_or_else(|| {
            ModelsError::CheckedOperationError("native amount overflow".to_string())
        })
    }
    fn to_amount(&self, _issue: &Issue) -> Amount {
        Amount::Native(*self)
    }
    fn try_from_amount(amount: &Amount) -> Result<Self, ModelsError> {
        match amount {
            Amount::Native(value) => Ok(*value),
            Amount::Issued(..) => Err(ModelsError::CheckedOperationError(
                "expected a native amount".to_string(),
            )),
        }
    }
}

impl CurrencyValue for IssuedAmount {
    fn is_zero(&self) -> bool {
        IssuedAmount::is_zero(self)
    }
    fn is_positive(&self) -> bool {
        IssuedAmount::is_positive(self)
    }
    fn add(&self, other: &Self) -> Result<Self, ModelsError> {
        self.checked_add(other)
    }
    fn sub(&self, other: &Self) -> Result<Self, ModelsError> {
        self.checked_sub(other)
    }
    fn to_amount(&self, issue: &Issue) -> Amount {
        Amount::Issued(*self, *issue)
    }
    fn try_from_amount(amount: &Amount) -> Result<Self, ModelsError> {
        match amount {
            Amount::Issued(value, _) => Ok(*value),
            Amount::Native(_) => Err(ModelsError::CheckedOperationError(
                "expected an issued amount".to_string(),
            )),
        }
    }
}

impl CurrencyValue for Amount {
    fn is_zero(&self) -> bool {
        Amount::is_zero(self)
    }
    fn is_positive(&self) -> bool {
        Amount::is_positive(self)
    }
    fn add(&self, other: &Self) -> Result<Self, ModelsError> {
        self.checked_add(other)
    }
    fn sub(&self, other: &Self) -> Result<Self, ModelsError> {
        self.checked_sub(other)
    }
    fn to_amount(&self, _issue: &Issue) -> Amount {
        *self
    }
    fn try_from_amount(amount: &Amount) -> Result<Self, ModelsError> {
        Ok(*amount)
    }
}
