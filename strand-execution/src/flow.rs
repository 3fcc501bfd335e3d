// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! The order-crossing flow: drives an offer stream against a taker's
//! amounts, computing fills with quality scaling and the owner-funds
//! clamp, and settling balances with issuer transfer fees.

use crate::offer_stream::{OfferStream, RemovalPolicy};
use crate::step_counter::StepCounter;
use std::collections::BTreeSet;
use strand_ledger::view_ops::{account_send, offer_delete, transfer_rate};
use strand_ledger::{ApplyView, ReadView};
use strand_models::rate::multiply_round;
use strand_models::{AccountId, Amount, Amounts, Book, Key, Quality, Rounding, TransResult};
use tracing::{debug, trace, warn};

/// Outcome of one crossing pass.
#[derive(Debug)]
pub struct CrossResult {
    /// total input the taker surrendered to offer owners (before issuer
    /// transfer fees)
    pub taker_paid: Amount,
    /// total output delivered to the taker
    pub taker_got: Amount,
    /// offers found permanently unusable during the pass; already applied
    /// to the live view, returned so an enclosing computation can re-apply
    /// them if this layer's changes are later discarded
    pub removed: BTreeSet<Key>,
}

/// Move `amount` from `from` to `to`, charging the issuer's transfer fee
/// when a third party moves issued obligations.
fn send_with_issuer_fee(
    view: &mut ApplyView,
    from: &AccountId,
    to: &AccountId,
    amount: &Amount,
) -> Result<(), TransResult> {
    let issue = amount.issue();
    if !amount.is_native() && *from != issue.issuer && *to != issue.issuer {
        let rate = transfer_rate(&*view, &issue.issuer);
        let debit =
            multiply_round(amount, rate, Rounding::Up).map_err(|_| TransResult::TefInternal)?;
        // the sender surrenders the scaled amount; the receiver gets the
        // face amount; the difference stays with the issuer
        account_send(view, from, &issue.issuer, &debit)?;
        account_send(view, &issue.issuer, to, amount)?;
    } else {
        account_send(view, from, to, amount)?;
    }
    Ok(())
}

/// Apply a deferred-removal set to a view, skipping offers that are
/// already gone.
pub fn apply_deferred_removals(view: &mut ApplyView, removed: &BTreeSet<Key>) {
    for key in removed {
        if view.exists(key) {
            if let Err(code) = offer_delete(view, key) {
                warn!("failed to apply deferred removal of {}: {}", key, code);
            }
        }
    }
}

/// Cross `amounts` against the book on behalf of `taker`.
///
/// Pulls offers best-quality-first, stopping at `limit_quality` (when
/// given), at taker exhaustion, or when the step budget runs out. Fill
/// amounts are computed with `ceil_in`/`ceil_out` and clamped by the offer
/// owner's spendable funds; settlement routes issued amounts through the
/// issuer so transfer fees apply. The offer stream runs with the deferred
/// removal policy; the pending set is applied before returning and also
/// handed back in the result.
pub fn cross(
    view: &mut ApplyView,
    cancel_view: &mut ApplyView,
    taker: &AccountId,
    book: &Book,
    amounts: Amounts<Amount, Amount>,
    limit_quality: Option<Quality>,
    counter: StepCounter,
) -> Result<CrossResult, TransResult> {
    let close_time = view.parent_close_time();
    let mut stream: OfferStream<Amount, Amount> = OfferStream::new(
        *book,
        close_time,
        counter,
        RemovalPolicy::Deferred(BTreeSet::new()),
    );

    let mut remaining = amounts;
    let mut taker_paid = amounts.input.zeroed();
    let mut taker_got = amounts.output.zeroed();

    while remaining.input.is_positive() && remaining.output.is_positive() {
        if !stream.step(view, cancel_view) {
            break;
        }
        let offer = stream.tip().expect("step returned a candidate");
        let quality = offer.quality();
        if let Some(limit) = limit_quality {
            if quality < limit {
                trace!("offer quality below limit, stopping");
                break;
            }
        }

        // cap the fill by what the owner can actually deliver, then by
        // what the taker still wants and can pay
        let funds = *stream.owner_funds().expect("funded candidate");
        let mut fill = *offer.amounts();
        fill = quality
            .ceil_out(&fill, &funds)
            .map_err(|_| TransResult::TefInternal)?;
        fill = quality
            .ceil_out(&fill, &remaining.output)
            .map_err(|_| TransResult::TefInternal)?;
        fill = quality
            .ceil_in(&fill, &remaining.input)
            .map_err(|_| TransResult::TefInternal)?;
        if fill.is_empty() {
            break;
        }

        let owner = offer.owner();
        send_with_issuer_fee(view, taker, &owner, &fill.input)?;
        send_with_issuer_fee(view, &owner, taker, &fill.output)?;

        let offer_key = offer.key();
        let offer = stream.tip_mut().expect("step returned a candidate");
        offer.consume(view, &fill)?;
        if offer.fully_consumed() {
            offer_delete(view, &offer_key)?;
            stream.forget_current();
        }

        taker_paid = taker_paid
            .checked_add(&fill.input)
            .map_err(|_| TransResult::TefInternal)?;
        taker_got = taker_got
            .checked_add(&fill.output)
            .map_err(|_| TransResult::TefInternal)?;
        remaining.input = remaining
            .input
            .checked_sub(&fill.input)
            .map_err(|_| TransResult::TefInternal)?;
        remaining.output = remaining
            .output
            .checked_sub(&fill.output)
            .map_err(|_| TransResult::TefInternal)?;
    }

    let removed = stream.into_permanently_removed();
    apply_deferred_removals(view, &removed);
    debug!(
        "crossed book {}: paid {}, got {}, {} offers permanently removed",
        book,
        taker_paid,
        taker_got,
        removed.len()
    );
    Ok(CrossResult {
        taker_paid,
        taker_got,
        removed,
    })
}
