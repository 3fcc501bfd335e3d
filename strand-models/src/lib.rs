// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Value types and protocol model for the strand transaction engine:
//! fixed-point currency amounts, exchange-rate qualities, transfer rates,
//! ledger object layouts, key derivation and stable transaction result codes.

#![warn(missing_docs)]

pub use account::AccountId;
pub use amount::{Amount, CurrencyValue, IssuedAmount, NativeAmount, Rounding};
pub use error::{ModelsError, ModelsResult};
pub use issue::{Book, Currency, Issue};
pub use key::Key;
pub use quality::{Amounts, Quality};
pub use rate::Rate;
pub use result::{ResultCategory, TransResult};
pub use timestamp::Timestamp;

/// account identifiers
pub mod account;
/// fixed-point currency amounts
pub mod amount;
/// protocol constants
pub mod constants;
/// models error
pub mod error;
/// currency / issuer pairs and order books
pub mod issue;
/// ledger object keys
pub mod key;
/// deterministic key derivation
pub mod keylet;
/// ledger object layouts
pub mod ledger;
/// exchange-rate ordering
pub mod quality;
/// transfer rates
pub mod rate;
/// transaction result codes
pub mod result;
/// network close time
pub mod timestamp;
/// transaction model
pub mod transaction;
