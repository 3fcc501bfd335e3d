// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! this file defines all possible execution error categories

use displaydoc::Display;
use thiserror::Error;

/// Errors of the execution component.
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum ExecutionError {
    /// configuration error: {0}
    ConfigError(String),

    /// runtime error: {0}
    RuntimeError(String),

    /// models error: {0}
    ModelsError(#[from] strand_models::ModelsError),
}
