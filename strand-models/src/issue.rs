// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::account::AccountId;
use crate::error::ModelsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Size of a currency code in bytes
pub const CURRENCY_CODE_SIZE_BYTES: usize = 20;

/// Display code of the native asset
pub const NATIVE_CURRENCY_CODE: &str = "SRD";

/// A 160-bit currency code. The all-zero code is the native asset sentinel.
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Default)]
pub struct Currency([u8; CURRENCY_CODE_SIZE_BYTES]);

impl Currency {
    /// The native asset sentinel.
    pub const fn native() -> Self {
        Currency([0u8; CURRENCY_CODE_SIZE_BYTES])
    }

    /// Build a currency from an ASCII code such as `"USD"`.
    ///
    /// # Example
    /// ```
    /// # use strand_models::Currency;
    /// let usd = Currency::from_code("USD").unwrap();
    /// assert!(!usd.is_native());
    /// assert_eq!(usd.to_string(), "USD");
    /// assert!(Currency::from_code("").is_err());
    /// ```
    pub fn from_code(code: &str) -> Result<Self, ModelsError> {
        let bytes = code.as_bytes();
        if bytes.is_empty() || bytes.len() > CURRENCY_CODE_SIZE_BYTES {
            return Err(ModelsError::CurrencyParseError(format!(
                "invalid currency code length: {}",
                bytes.len()
            )));
        }
        if !bytes
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || *b == b'_')
        {
            return Err(ModelsError::CurrencyParseError(format!(
                "invalid currency code: {}",
                code
            )));
        }
        let mut buf = [0u8; CURRENCY_CODE_SIZE_BYTES];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Currency(buf))
    }

    /// Returns `true` for the native asset sentinel.
    pub fn is_native(&self) -> bool {
        self.0 == [0u8; CURRENCY_CODE_SIZE_BYTES]
    }

    /// Serialize the code as bytes.
    pub fn to_bytes(&self) -> [u8; CURRENCY_CODE_SIZE_BYTES] {
        self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_native() {
            return write!(f, "{}", NATIVE_CURRENCY_CODE);
        }
        let len = self.0.iter().position(|b| *b == 0).unwrap_or(self.0.len());
        write!(f, "{}", String::from_utf8_lossy(&self.0[..len]))
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl FromStr for Currency {
    type Err = ModelsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == NATIVE_CURRENCY_CODE {
            return Ok(Currency::native());
        }
        Currency::from_code(s)
    }
}

impl Serialize for Currency {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: serde::de::Deserializer<'de>>(deserializer: D) -> Result<Currency, D::Error> {
        let s = String::deserialize(deserializer)?;
        Currency::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// A fungible asset: a currency code plus its issuing account.
///
/// The native asset uses the zero sentinel for both fields.
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Default, Serialize, Deserialize)]
pub struct Issue {
    /// currency code
    pub currency: Currency,
    /// issuing account; `AccountId::ZERO` for the native asset
    pub issuer: AccountId,
}

impl Issue {
    /// The native asset.
    pub const fn native() -> Self {
        Issue {
            currency: Currency::native(),
            issuer: AccountId::ZERO,
        }
    }

    /// Build an issued-currency issue.
    pub fn new(currency: Currency, issuer: AccountId) -> Self {
        Issue { currency, issuer }
    }

    /// Returns `true` for the native asset.
    pub fn is_native(&self) -> bool {
        self.currency.is_native()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_native() {
            write!(f, "{}", NATIVE_CURRENCY_CODE)
        } else {
            write!(f, "{}/{}", self.currency, self.issuer)
        }
    }
}

impl fmt::Debug for Issue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// One side of the order-book space: the asset pair (input, output) takers
/// trade against. Offers in a book deliver `output` in exchange for `input`.
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Serialize, Deserialize)]
pub struct Book {
    /// the asset takers pay in
    pub input: Issue,
    /// the asset takers receive
    pub output: Issue,
}

impl Book {
    /// Build a book from its asset pair.
    pub fn new(input: Issue, output: Issue) -> Self {
        Book { input, output }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} -> {}", self.input, self.output)
    }
}

impl fmt::Debug for Book {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}
