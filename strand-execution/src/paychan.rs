// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Payment channel processors.
//!
//! Payment channels permit off-ledger checkpoints of native-asset payments
//! flowing in a single direction. A channel sequesters the owner's funds in
//! its own ledger entry. The owner authorizes the recipient to claim up to
//! a given balance by handing over a signed message off-ledger; the
//! recipient uses it to claim any unpaid balance while the channel remains
//! open. The owner can top up the channel as needed. If the channel has not
//! paid out all its funds, the owner must wait out the settle delay to
//! close it, giving the recipient a chance to present outstanding claims;
//! the recipient can close at any time. Any transaction that touches the
//! channel after its expiration closes it. The total amount paid increases
//! monotonically as newer claims are issued; on close, any remaining
//! balance returns to the owner.

use crate::context::{ApplyContext, PreclaimContext, PreflightContext};
use crate::settings::Feature;
use crate::transactor::{preflight1, preflight2};
use strand_ledger::view_ops::{adjust_owner_count, describe_owner_dir, dir_add, dir_delete};
use strand_ledger::{ApplyView, ReadView};
use strand_models::keylet;
use strand_models::ledger::{
    LedgerObject, PayChannel, ACCOUNT_DISALLOW_NATIVE, ACCOUNT_REQUIRE_DEST_TAG,
};
use strand_models::transaction::{TxKind, TF_CLOSE, TF_PAYCHAN_CLAIM_MASK, TF_RENEW};
use strand_models::{Key, TransResult};
use tracing::{debug, trace};

/// The message layout a claim authorization signature covers:
/// `CLM\0` followed by the channel key and the claimed drops, big endian.
pub fn serialize_paychan_authorization(channel: &Key, drops: u64) -> Vec<u8> {
    let mut msg = Vec::with_capacity(4 + 32 + 8);
    msg.extend_from_slice(b"CLM\0");
    msg.extend_from_slice(&channel.to_bytes());
    msg.extend_from_slice(&drops.to_be_bytes());
    msg
}

/// Close a channel: unlink it from the owner's directory, return the
/// unclaimed funds, release the owner's reserve and erase the object.
///
/// Invoked from explicit close requests and as a side effect of any
/// channel transaction past the cancellation deadline.
fn close_channel(view: &mut ApplyView, key: &Key) -> Result<(), TransResult> {
    let channel = view
        .read(key)
        .and_then(LedgerObject::into_channel)
        .ok_or(TransResult::TefInternal)?;

    // Remove the channel from the owner directory
    let owner_root = keylet::owner_dir(&channel.account);
    dir_delete(view, &owner_root, channel.owner_node, key, true)?;

    // Transfer the remaining amount back to the owner, decrement the owner
    // count
    debug_assert!(channel.amount >= channel.balance);
    let account_key = keylet::account(&channel.account);
    let mut root = view
        .peek(&account_key)
        .and_then(LedgerObject::into_account)
        .ok_or(TransResult::TefInternal)?;
    let refund = channel
        .amount
        .checked_sub(channel.balance)
        .ok_or(TransResult::TefInternal)?;
    root.balance = root
        .balance
        .checked_add(refund)
        .ok_or(TransResult::TefInternal)?;
    view.update(account_key, LedgerObject::Account(root));
    adjust_owner_count(view, &channel.account, -1)?;

    // Remove the channel from the ledger
    view.erase(key);
    debug!("closed channel {}, returned {} to owner", key, refund);
    Ok(())
}

/// Returns `true` when the channel's cancel-after or expiration time is at
/// or before the given close time.
fn past_deadline(channel: &PayChannel, close_time: strand_models::Timestamp) -> bool {
    channel.cancel_after.map_or(false, |t| close_time >= t)
        || channel.expiration.map_or(false, |t| close_time >= t)
}

// --- PaymentChannelCreate ---------------------------------------------------

/// Stateless checks for channel creation.
pub fn create_preflight(ctx: &PreflightContext) -> TransResult {
    if !ctx.rules.enabled(Feature::PaymentChannels) {
        return TransResult::TemDisabled;
    }
    let ret = preflight1(ctx);
    if !ret.is_tes() {
        return ret;
    }
    let TxKind::ChannelCreate(tx) = &ctx.tx.kind else {
        return TransResult::TemInvalid;
    };
    if !tx.amount.is_positive() {
        return TransResult::TemBadAmount;
    }
    if ctx.tx.common.account == tx.destination {
        return TransResult::TemDstIsSrc;
    }
    preflight2(ctx)
}

/// Reserve, funding and destination checks for channel creation.
pub fn create_preclaim(ctx: &PreclaimContext) -> TransResult {
    let TxKind::ChannelCreate(tx) = &ctx.tx.kind else {
        return TransResult::TemInvalid;
    };
    let Some(root) = ctx
        .view
        .read(&keylet::account(&ctx.tx.common.account))
        .and_then(LedgerObject::into_account)
    else {
        return TransResult::TerNoAccount;
    };

    // Check reserve and funds availability
    let reserve = ctx.view.fees().account_reserve(root.owner_count + 1);
    if root.balance < reserve {
        return TransResult::TecInsufficientReserve;
    }
    if root.balance < reserve.saturating_add(tx.amount) {
        return TransResult::TecUnfunded;
    }

    // Check destination account
    let Some(destination) = ctx
        .view
        .read(&keylet::account(&tx.destination))
        .and_then(LedgerObject::into_account)
    else {
        return TransResult::TecNoDst;
    };
    if destination.flags & ACCOUNT_REQUIRE_DEST_TAG != 0 && tx.destination_tag.is_none() {
        return TransResult::TecDstTagNeeded;
    }
    if destination.flags & ACCOUNT_DISALLOW_NATIVE != 0 {
        return TransResult::TecNoTarget;
    }
    TransResult::TesSuccess
}

/// Create the channel object, link it into the owner's directory and
/// sequester the funds.
pub fn create_apply(ctx: &mut ApplyContext) -> Result<(), TransResult> {
    let TxKind::ChannelCreate(tx) = &ctx.tx.kind else {
        return Err(TransResult::TemInvalid);
    };
    let account = ctx.tx.common.account;
    let account_key = keylet::account(&account);
    let mut root = ctx
        .view
        .peek(&account_key)
        .and_then(LedgerObject::into_account)
        .ok_or(TransResult::TefInternal)?;

    // the fee layer already consumed the sequence, so the channel is keyed
    // by the sequence this transaction used
    let key = keylet::channel(&account, &tx.destination, root.sequence - 1);

    // Add the channel to the owner directory
    let owner_node = dir_add(
        ctx.view,
        &keylet::owner_dir(&account),
        key,
        describe_owner_dir(account),
    )?;

    ctx.view.insert(
        key,
        LedgerObject::Channel(PayChannel {
            account,
            destination: tx.destination,
            // funds held in this channel
            amount: tx.amount,
            // amount the channel has already paid
            balance: strand_models::NativeAmount::zero(),
            settle_delay: tx.settle_delay,
            expiration: None,
            cancel_after: tx.cancel_after,
            public_key: tx.public_key,
            source_tag: ctx.tx.common.source_tag,
            destination_tag: tx.destination_tag,
            owner_node,
        }),
    );

    // Deduct the owner's balance, increment the owner count
    root.balance = root
        .balance
        .checked_sub(tx.amount)
        .ok_or(TransResult::TecUnfunded)?;
    root.owner_count += 1;
    ctx.view.update(account_key, LedgerObject::Account(root));
    Ok(())
}

// --- PaymentChannelFund -----------------------------------------------------

/// Stateless checks for channel funding.
pub fn fund_preflight(ctx: &PreflightContext) -> TransResult {
    if !ctx.rules.enabled(Feature::PaymentChannels) {
        return TransResult::TemDisabled;
    }
    let ret = preflight1(ctx);
    if !ret.is_tes() {
        return ret;
    }
    let TxKind::ChannelFund(tx) = &ctx.tx.kind else {
        return TransResult::TemInvalid;
    };
    if !tx.amount.is_positive() {
        return TransResult::TemBadAmount;
    }
    preflight2(ctx)
}

/// Top up a channel, optionally extending its expiration. Touches past the
/// deadline auto-close instead.
pub fn fund_apply(ctx: &mut ApplyContext) -> Result<(), TransResult> {
    let TxKind::ChannelFund(tx) = &ctx.tx.kind else {
        return Err(TransResult::TemInvalid);
    };
    let key = tx.channel;
    let Some(mut channel) = ctx.view.peek(&key).and_then(LedgerObject::into_channel) else {
        return Err(TransResult::TecNoEntry);
    };

    let close_time = ctx.view.parent_close_time();
    if past_deadline(&channel, close_time) {
        return close_channel(ctx.view, &key);
    }

    if channel.account != ctx.tx.common.account {
        // only the owner can add funds or extend
        return Err(TransResult::TecNoPermission);
    }

    if let Some(extend) = tx.expiration {
        let mut min_expiration = close_time.saturating_add_secs(channel.settle_delay);
        if let Some(current) = channel.expiration {
            if current < min_expiration {
                min_expiration = current;
            }
        }
        if extend < min_expiration {
            return Err(TransResult::TemBadExpiration);
        }
        channel.expiration = Some(extend);
        ctx.view.update(key, LedgerObject::Channel(channel.clone()));
    }

    // Check reserve and funds availability
    let account_key = keylet::account(&ctx.tx.common.account);
    let mut root = ctx
        .view
        .peek(&account_key)
        .and_then(LedgerObject::into_account)
        .ok_or(TransResult::TefInternal)?;
    let reserve = ctx.view.fees().account_reserve(root.owner_count);
    if root.balance < reserve {
        return Err(TransResult::TecInsufficientReserve);
    }
    if root.balance < reserve.saturating_add(tx.amount) {
        return Err(TransResult::TecUnfunded);
    }

    channel.amount = channel
        .amount
        .checked_add(tx.amount)
        .ok_or(TransResult::TefInternal)?;
    ctx.view.update(key, LedgerObject::Channel(channel));

    root.balance = root
        .balance
        .checked_sub(tx.amount)
        .ok_or(TransResult::TecUnfunded)?;
    ctx.view.update(account_key, LedgerObject::Account(root));
    Ok(())
}

// --- PaymentChannelClaim ----------------------------------------------------

/// Stateless checks for channel claims, including the claim authorization
/// signature when present.
pub fn claim_preflight(ctx: &PreflightContext) -> TransResult {
    if !ctx.rules.enabled(Feature::PaymentChannels) {
        return TransResult::TemDisabled;
    }
    let ret = preflight1(ctx);
    if !ret.is_tes() {
        return ret;
    }
    let TxKind::ChannelClaim(tx) = &ctx.tx.kind else {
        return TransResult::TemInvalid;
    };

    if let Some(balance) = tx.balance {
        if !balance.is_positive() {
            return TransResult::TemBadAmount;
        }
    }
    if let Some(amount) = tx.amount {
        if !amount.is_positive() {
            return TransResult::TemBadAmount;
        }
    }
    if let (Some(balance), Some(amount)) = (tx.balance, tx.amount) {
        if balance > amount {
            return TransResult::TecNoPermission;
        }
    }

    let flags = ctx.tx.flags();
    if flags & TF_PAYCHAN_CLAIM_MASK != 0 {
        return TransResult::TemInvalidFlag;
    }
    if (flags & TF_CLOSE != 0) && (flags & TF_RENEW != 0) {
        return TransResult::TemMalformed;
    }

    if let Some(signature) = &tx.signature {
        let (Some(public_key), Some(balance)) = (&tx.public_key, tx.balance) else {
            return TransResult::TemMalformed;
        };

        // The signature isn't needed if the transaction account is the
        // channel owner, but if it's present, check it
        let req_balance = balance.drops() as u64;
        let auth_amount = tx.amount.map(|a| a.drops() as u64).unwrap_or(req_balance);
        if req_balance > auth_amount {
            return TransResult::TecNoPermission;
        }
        let msg = serialize_paychan_authorization(&tx.channel, auth_amount);
        if !strand_signature::verify(public_key, &msg, signature, true) {
            return TransResult::TemBadSignature;
        }
    }

    preflight2(ctx)
}

/// Process a claim: move the claimed delta to the destination, handle
/// renew and close requests, and auto-close past the deadline.
pub fn claim_apply(ctx: &mut ApplyContext) -> Result<(), TransResult> {
    let TxKind::ChannelClaim(tx) = &ctx.tx.kind else {
        return Err(TransResult::TemInvalid);
    };
    let key = tx.channel;
    let Some(mut channel) = ctx.view.peek(&key).and_then(LedgerObject::into_channel) else {
        return Err(TransResult::TecNoTarget);
    };

    let close_time = ctx.view.parent_close_time();
    if past_deadline(&channel, close_time) {
        return close_channel(ctx.view, &key);
    }

    let src = channel.account;
    let dst = channel.destination;
    let tx_account = ctx.tx.common.account;
    if tx_account != src && tx_account != dst {
        return Err(TransResult::TecNoPermission);
    }

    if let Some(req_balance) = tx.balance {
        // the destination can only claim with an authorization
        if tx_account == dst && tx.signature.is_none() {
            return Err(TransResult::TemBadSignature);
        }
        if tx.signature.is_some() && tx.public_key != Some(channel.public_key) {
            return Err(TransResult::TemBadSigner);
        }

        if req_balance > channel.amount {
            return Err(TransResult::TecUnfundedPayment);
        }
        if req_balance <= channel.balance {
            // nothing requested
            return Err(TransResult::TecUnfundedPayment);
        }

        let dst_key = keylet::account(&dst);
        let Some(mut dst_root) = ctx.view.peek(&dst_key).and_then(LedgerObject::into_account)
        else {
            return Err(TransResult::TerNoAccount);
        };
        if tx_account == src && dst_root.flags & ACCOUNT_DISALLOW_NATIVE != 0 {
            return Err(TransResult::TecNoTarget);
        }

        let delta = req_balance
            .checked_sub(channel.balance)
            .ok_or(TransResult::TefInternal)?;
        debug_assert!(delta.is_positive());
        channel.balance = req_balance;
        dst_root.balance = dst_root
            .balance
            .checked_add(delta)
            .ok_or(TransResult::TefInternal)?;
        ctx.view.update(dst_key, LedgerObject::Account(dst_root));
        ctx.view.update(key, LedgerObject::Channel(channel.clone()));
        trace!("claimed {} through channel {}", delta, key);
    }

    if ctx.tx.flags() & TF_RENEW != 0 {
        if src != tx_account {
            return Err(TransResult::TecNoPermission);
        }
        channel.expiration = None;
        ctx.view.update(key, LedgerObject::Channel(channel.clone()));
    }

    if ctx.tx.flags() & TF_CLOSE != 0 {
        // the channel closes immediately if it is dry or the receiver asks
        if dst == tx_account || channel.balance == channel.amount {
            return close_channel(ctx.view, &key);
        }

        let settle_expiration = close_time.saturating_add_secs(channel.settle_delay);
        if channel.expiration.map_or(true, |t| t > settle_expiration) {
            channel.expiration = Some(settle_expiration);
            ctx.view.update(key, LedgerObject::Channel(channel));
        }
    }

    Ok(())
}
