// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Ledger state access for the strand transaction engine: the read view
//! trait, the layered copy-on-write [`ApplyView`], the in-memory
//! [`FinalLedger`] base, paginated directory structures and the ledger view
//! operations built on them.

#![warn(missing_docs)]

pub use apply_view::ApplyView;
pub use changes::{Applicable, LedgerChanges, SetOrDelete};
pub use config::{FeeSchedule, LedgerConfig};
pub use dir::{Dir, DirIter};
pub use error::LedgerError;
pub use final_ledger::FinalLedger;
pub use view::ReadView;

/// layered copy-on-write view
pub mod apply_view;
/// ledger change sets
pub mod changes;
/// ledger configuration
pub mod config;
/// directory iteration
pub mod dir;
/// ledger error
pub mod error;
/// in-memory base ledger
pub mod final_ledger;
/// read-only view trait
pub mod view;
/// ledger view operations
pub mod view_ops;
