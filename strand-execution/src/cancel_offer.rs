// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::context::{ApplyContext, PreclaimContext, PreflightContext};
use crate::transactor::{preflight1, preflight2};
use strand_ledger::view_ops::offer_delete;
use strand_ledger::ReadView;
use strand_models::keylet;
use strand_models::ledger::LedgerObject;
use strand_models::transaction::{TxKind, TF_UNIVERSAL_MASK};
use strand_models::TransResult;
use tracing::{debug, trace};

/// Stateless checks for offer cancellation.
pub fn preflight(ctx: &PreflightContext) -> TransResult {
    let ret = preflight1(ctx);
    if !ret.is_tes() {
        return ret;
    }

    if ctx.tx.flags() & TF_UNIVERSAL_MASK != 0 {
        trace!("Malformed transaction: Invalid flags set.");
        return TransResult::TemInvalidFlag;
    }

    let TxKind::OfferCancel(tx) = &ctx.tx.kind else {
        return TransResult::TemInvalid;
    };
    if tx.offer_sequence == 0 {
        trace!("preflight: missing offer sequence");
        return TransResult::TemBadSequence;
    }

    preflight2(ctx)
}

/// The cancelled sequence must already be consumed by the account.
pub fn preclaim(ctx: &PreclaimContext) -> TransResult {
    let TxKind::OfferCancel(tx) = &ctx.tx.kind else {
        return TransResult::TemInvalid;
    };
    let Some(root) = ctx
        .view
        .read(&keylet::account(&ctx.tx.common.account))
        .and_then(LedgerObject::into_account)
    else {
        return TransResult::TerNoAccount;
    };
    if root.sequence <= tx.offer_sequence {
        trace!(
            "Malformed transaction: Sequence {} is invalid.",
            tx.offer_sequence
        );
        return TransResult::TemBadSequence;
    }
    TransResult::TesSuccess
}

/// Delete the offer if it exists. A missing offer is not an error: the
/// cancel is idempotent and still succeeds.
pub fn do_apply(ctx: &mut ApplyContext) -> Result<(), TransResult> {
    let TxKind::OfferCancel(tx) = &ctx.tx.kind else {
        return Err(TransResult::TemInvalid);
    };
    let offer_key = keylet::offer(&ctx.tx.common.account, tx.offer_sequence);
    if ctx.view.exists(&offer_key) {
        debug!("Trying to cancel offer #{}", tx.offer_sequence);
        offer_delete(ctx.view, &offer_key)?;
    } else {
        debug!("Offer #{} can't be found.", tx.offer_sequence);
    }
    Ok(())
}
