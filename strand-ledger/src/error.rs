// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! this file defines all possible ledger error categories

use displaydoc::Display;
use strand_models::ModelsError;
use thiserror::Error;

/// Errors of the ledger component.
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum LedgerError {
    /// file error: {0}
    FileError(String),
    /// missing entry: {0}
    MissingEntry(String),
    /// ledger object type mismatch: {0}
    TypeMismatch(String),
    /// models error: {0}
    ModelsError(#[from] ModelsError),
}
