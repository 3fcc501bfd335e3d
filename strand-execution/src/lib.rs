// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! The strand transaction execution engine: the step-budgeted offer stream
//! and order-crossing flow, plus the three-phase transaction processors
//! (preflight, preclaim, apply) for offer cancellation and payment
//! channels.

#![warn(missing_docs)]

pub use book_tip::BookTip;
pub use context::{ApplyContext, PreclaimContext, PreflightContext};
pub use error::ExecutionError;
pub use offer::Offer;
pub use offer_stream::{OfferStream, RemovalPolicy};
pub use settings::{ExecutionConfig, Feature, Rules};
pub use step_counter::StepCounter;
pub use transactor::{apply_transaction, preclaim, preflight, ApplyResult};

/// book-directory cursor
pub mod book_tip;
/// offer cancellation processor
pub mod cancel_offer;
/// transaction phase contexts
pub mod context;
/// execution error
pub mod error;
/// order-crossing flow
pub mod flow;
/// typed offer handles
pub mod offer;
/// the matching offer stream
pub mod offer_stream;
/// payment channel processors
pub mod paychan;
/// feature rules and configuration
pub mod settings;
/// shared matching step budget
pub mod step_counter;
/// the transaction pipeline
pub mod transactor;

#[cfg(test)]
mod tests;
