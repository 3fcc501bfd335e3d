// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::settings::Rules;
use strand_ledger::{ApplyView, ReadView};
use strand_models::transaction::Transaction;

/// State available to preflight: the transaction and the enabled feature
/// rules, no ledger access.
pub struct PreflightContext<'a> {
    /// the transaction under validation
    pub tx: &'a Transaction,
    /// enabled protocol features
    pub rules: &'a Rules,
}

/// State available to preclaim: read-only access to a ledger snapshot.
pub struct PreclaimContext<'a> {
    /// the ledger snapshot checked against
    pub view: &'a dyn ReadView,
    /// the transaction under validation
    pub tx: &'a Transaction,
}

/// State available to apply: the mutable transactional view layer.
pub struct ApplyContext<'a, 'b> {
    /// the transactional layer this apply phase mutates
    pub view: &'a mut ApplyView<'b>,
    /// the transaction being applied
    pub tx: &'a Transaction,
}
