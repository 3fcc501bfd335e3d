// Copyright (c) 2022 MASSA LABS <info@massa.net>

use strand_ledger::ApplyView;
use strand_models::ledger::{LedgerObject, OfferEntry};
use strand_models::{
    AccountId, Amounts, CurrencyValue, Issue, Key, ModelsError, Quality, TransResult,
};

/// A typed, non-owning handle onto a ledger-resident offer.
///
/// The handle carries the offer's remaining amounts in the concrete
/// currency-value representations the matching session is monomorphized
/// over; the ledger object stays owned by the view.
#[derive(Debug, Clone)]
pub struct Offer<TIn, TOut> {
    key: Key,
    quality: Quality,
    entry: OfferEntry,
    amounts: Amounts<TIn, TOut>,
}

impl<TIn: CurrencyValue, TOut: CurrencyValue> Offer<TIn, TOut> {
    /// Build a handle from a ledger entry, projecting the amounts into the
    /// session's representations.
    pub fn from_entry(key: Key, quality: Quality, entry: OfferEntry) -> Result<Self, ModelsError> {
        let amounts = Amounts::new(
            TIn::try_from_amount(&entry.taker_pays)?,
            TOut::try_from_amount(&entry.taker_gets)?,
        );
        Ok(Offer {
            key,
            quality,
            entry,
            amounts,
        })
    }

    /// The offer's ledger key.
    pub fn key(&self) -> Key {
        self.key
    }

    /// The owner of the offer.
    pub fn owner(&self) -> AccountId {
        self.entry.account
    }

    /// The quality bucket the offer was found under.
    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// The offer's remaining amounts.
    pub fn amounts(&self) -> &Amounts<TIn, TOut> {
        &self.amounts
    }

    /// The issue of the amount the taker pays.
    pub fn issue_in(&self) -> Issue {
        self.entry.taker_pays.issue()
    }

    /// The issue of the amount the taker gets.
    pub fn issue_out(&self) -> Issue {
        self.entry.taker_gets.issue()
    }

    /// The underlying ledger entry.
    pub fn entry(&self) -> &OfferEntry {
        &self.entry
    }

    /// Consume part of the offer: reduce the remaining amounts by `filled`
    /// and write the reduced entry back to the view.
    ///
    /// Amounts decrease monotonically across successive fills in a session.
    pub fn consume(
        &mut self,
        view: &mut ApplyView,
        filled: &Amounts<TIn, TOut>,
    ) -> Result<(), TransResult> {
        let input = self
            .amounts
            .input
            .sub(&filled.input)
            .map_err(|_| TransResult::TefInternal)?;
        let output = self
            .amounts
            .output
            .sub(&filled.output)
            .map_err(|_| TransResult::TefInternal)?;
        self.amounts = Amounts::new(input, output);
        self.entry.taker_pays = input.to_amount(&self.entry.taker_pays.issue());
        self.entry.taker_gets = output.to_amount(&self.entry.taker_gets.issue());
        view.update(self.key, LedgerObject::Offer(self.entry.clone()));
        Ok(())
    }

    /// Returns `true` once either remaining amount is exhausted.
    pub fn fully_consumed(&self) -> bool {
        self.amounts.is_empty()
    }
}
