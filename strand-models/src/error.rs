// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use thiserror::Error;

/// Result alias for models operations
pub type ModelsResult<T, E = ModelsError> = core::result::Result<T, E>;

/// Errors of the models component.
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelsError {
    /// amount parse error: {0}
    AmountParseError(String),
    /// amount out of representable range: {0}
    AmountRangeError(String),
    /// checked operation error: {0}
    CheckedOperationError(String),
    /// currency parse error: {0}
    CurrencyParseError(String),
    /// issue mismatch: {0} vs {1}
    IssueMismatch(String, String),
    /// key parse error: {0}
    KeyParseError(String),
    /// quality error: {0}
    QualityError(String),
}
