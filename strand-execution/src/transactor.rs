// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! The three-phase transaction pipeline: stateless preflight, read-only
//! preclaim, and the layered apply that commits in full on success, keeps
//! only fee and sequence effects on claim-fee outcomes, and leaves the
//! view untouched otherwise.

use crate::cancel_offer;
use crate::context::{ApplyContext, PreclaimContext, PreflightContext};
use crate::paychan;
use crate::settings::Rules;
use strand_ledger::{ApplyView, ReadView};
use strand_models::keylet;
use strand_models::ledger::LedgerObject;
use strand_models::transaction::{Transaction, TxKind, TF_FULLY_CANONICAL_SIG};
use strand_models::{AccountId, TransResult};
use tracing::{debug, trace};

/// Outcome of applying one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyResult {
    /// the stable result code
    pub result: TransResult,
    /// `true` when the transaction left a trace in the ledger (success or
    /// claim-fee outcomes)
    pub applied: bool,
}

/// Checks common to every transaction type, before touching the payload.
pub(crate) fn preflight1(ctx: &PreflightContext) -> TransResult {
    if ctx.tx.common.account == AccountId::ZERO {
        trace!("preflight: zero source account");
        return TransResult::TemBadSrcAccount;
    }
    if ctx.tx.common.fee.is_negative() {
        trace!("preflight: negative fee");
        return TransResult::TemBadFee;
    }
    TransResult::TesSuccess
}

/// The transaction signature check, run after every other stateless check.
pub(crate) fn preflight2(ctx: &PreflightContext) -> TransResult {
    let require_canonical = ctx.tx.flags() & TF_FULLY_CANONICAL_SIG != 0;
    if !strand_signature::verify(
        &ctx.tx.common.signing_key,
        &ctx.tx.signing_bytes(),
        &ctx.tx.common.signature,
        require_canonical,
    ) {
        trace!("preflight: bad transaction signature");
        return TransResult::TemBadSignature;
    }
    TransResult::TesSuccess
}

/// Stateless validation of a transaction against the enabled rules.
pub fn preflight(ctx: &PreflightContext) -> TransResult {
    match &ctx.tx.kind {
        TxKind::OfferCancel(_) => cancel_offer::preflight(ctx),
        TxKind::ChannelCreate(_) => paychan::create_preflight(ctx),
        TxKind::ChannelFund(_) => paychan::fund_preflight(ctx),
        TxKind::ChannelClaim(_) => paychan::claim_preflight(ctx),
    }
}

/// Read-only validation against a ledger snapshot; never mutates.
pub fn preclaim(ctx: &PreclaimContext) -> TransResult {
    let Some(root) = ctx
        .view
        .read(&keylet::account(&ctx.tx.common.account))
        .and_then(LedgerObject::into_account)
    else {
        return TransResult::TerNoAccount;
    };
    // the signing key must resolve to the source account
    if AccountId::from_public_key(&ctx.tx.common.signing_key) != ctx.tx.common.account {
        return TransResult::TefBadAuth;
    }
    if ctx.tx.common.fee < ctx.view.fees().base_fee {
        return TransResult::TelInsufFeeP;
    }
    if root.balance < ctx.tx.common.fee {
        return TransResult::TerInsufFeeB;
    }
    if ctx.tx.common.sequence < root.sequence {
        return TransResult::TefPastSeq;
    }
    if ctx.tx.common.sequence > root.sequence {
        return TransResult::TerPreSeq;
    }
    match &ctx.tx.kind {
        TxKind::OfferCancel(_) => cancel_offer::preclaim(ctx),
        TxKind::ChannelCreate(_) => paychan::create_preclaim(ctx),
        TxKind::ChannelFund(_) => TransResult::TesSuccess,
        TxKind::ChannelClaim(_) => TransResult::TesSuccess,
    }
}

/// Debit the fee and consume the sequence number. These effects survive
/// claim-fee outcomes.
fn pay_fee(view: &mut ApplyView, tx: &Transaction) -> Result<(), TransResult> {
    let key = keylet::account(&tx.common.account);
    let mut root = view
        .peek(&key)
        .and_then(LedgerObject::into_account)
        .ok_or(TransResult::TefInternal)?;
    root.balance = root
        .balance
        .checked_sub(tx.common.fee)
        .ok_or(TransResult::TerInsufFeeB)?;
    root.sequence += 1;
    view.update(key, LedgerObject::Account(root));
    Ok(())
}

fn do_apply(ctx: &mut ApplyContext) -> TransResult {
    let applied = match &ctx.tx.kind {
        TxKind::OfferCancel(_) => cancel_offer::do_apply(ctx),
        TxKind::ChannelCreate(_) => paychan::create_apply(ctx),
        TxKind::ChannelFund(_) => paychan::fund_apply(ctx),
        TxKind::ChannelClaim(_) => paychan::claim_apply(ctx),
    };
    match applied {
        Ok(()) => TransResult::TesSuccess,
        Err(code) => code,
    }
}

/// Run the full pipeline on one transaction, committing into `view` only
/// what the outcome allows.
pub fn apply_transaction(view: &mut ApplyView, tx: &Transaction, rules: &Rules) -> ApplyResult {
    let result = preflight(&PreflightContext { tx, rules });
    if !result.is_tes() {
        trace!("preflight rejected transaction: {}", result);
        return ApplyResult {
            result,
            applied: false,
        };
    }
    let result = preclaim(&PreclaimContext { view: &*view, tx });
    if !result.is_tes() {
        trace!("preclaim rejected transaction: {}", result);
        return ApplyResult {
            result,
            applied: false,
        };
    }

    // outer layer: fee and sequence, retained on claim-fee outcomes
    let mut outer = view.sandbox();
    if let Err(code) = pay_fee(&mut outer, tx) {
        return ApplyResult {
            result: code,
            applied: false,
        };
    }

    // inner layer: the type-specific state transition
    let (result, inner_changes) = {
        let mut inner = outer.sandbox();
        let result = do_apply(&mut ApplyContext {
            view: &mut inner,
            tx,
        });
        if result.is_tes() {
            (result, Some(inner.into_changes()))
        } else {
            // discarded: the inner layer's mutations never existed
            (result, None)
        }
    };
    if let Some(changes) = inner_changes {
        outer.apply_changes(changes);
    }

    if result.applied() {
        let changes = outer.into_changes();
        view.apply_changes(changes);
        debug!("transaction applied with {}", result);
        ApplyResult {
            result,
            applied: true,
        }
    } else {
        debug!("transaction failed with {}, view untouched", result);
        ApplyResult {
            result,
            applied: false,
        }
    }
}
