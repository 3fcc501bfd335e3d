// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! The transaction model: common fields, per-type payloads and the
//! deterministic signing payload.

use crate::account::AccountId;
use crate::amount::NativeAmount;
use crate::key::Key;
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use strand_signature::{PublicKey, Signature};

/// Flag requesting strict canonical-signature checking; allowed on every
/// transaction type.
pub const TF_FULLY_CANONICAL_SIG: u32 = 0x8000_0000;

/// Flags allowed on every transaction type.
pub const TF_UNIVERSAL: u32 = TF_FULLY_CANONICAL_SIG;

/// Bits that a transaction type without specific flags must not set.
pub const TF_UNIVERSAL_MASK: u32 = !TF_UNIVERSAL;

/// Channel claim flag: reset the channel's expiration. Owner only.
pub const TF_RENEW: u32 = 0x0001_0000;

/// Channel claim flag: request that the channel be closed.
pub const TF_CLOSE: u32 = 0x0002_0000;

/// Bits a channel claim must not set.
pub const TF_PAYCHAN_CLAIM_MASK: u32 = !(TF_UNIVERSAL | TF_RENEW | TF_CLOSE);

/// Fields common to every transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxCommon {
    /// the source account
    pub account: AccountId,
    /// the source account sequence number this transaction consumes
    pub sequence: u32,
    /// the fee offered, in drops
    pub fee: NativeAmount,
    /// transaction flags
    pub flags: u32,
    /// tag identifying the sender's own bookkeeping
    pub source_tag: Option<u32>,
    /// the public key whose signature authorizes this transaction
    pub signing_key: PublicKey,
    /// the transaction signature over [`Transaction::signing_bytes`]
    pub signature: Signature,
}

/// Cancel a previously created offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferCancelTx {
    /// sequence number of the transaction that created the offer
    pub offer_sequence: u32,
}

/// Create a unidirectional payment channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCreateTx {
    /// the recipient at the end of the channel
    pub destination: AccountId,
    /// the amount of native asset to deposit immediately
    pub amount: NativeAmount,
    /// seconds everyone but the recipient must wait for a superior claim
    pub settle_delay: u64,
    /// the key that will sign claims against the channel
    pub public_key: PublicKey,
    /// any channel transaction after this time closes the channel
    pub cancel_after: Option<Timestamp>,
    /// tag required if the destination demands one
    pub destination_tag: Option<u32>,
}

/// Add funds to an existing channel; owner only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelFundTx {
    /// the channel to fund
    pub channel: Key,
    /// the amount of native asset to add
    pub amount: NativeAmount,
    /// optional new expiration, bounded below by the settle delay
    pub expiration: Option<Timestamp>,
}

/// Place a claim against an existing channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelClaimTx {
    /// the channel claimed against
    pub channel: Key,
    /// total amount delivered after this claim is processed
    pub balance: Option<NativeAmount>,
    /// the amount the claim signature authorizes
    pub amount: Option<NativeAmount>,
    /// claim authorization signed by the channel's key
    pub signature: Option<Signature>,
    /// the public key that made the claim signature
    pub public_key: Option<PublicKey>,
}

/// The type-specific payload of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxKind {
    /// cancel an offer
    OfferCancel(OfferCancelTx),
    /// create a payment channel
    ChannelCreate(ChannelCreateTx),
    /// fund a payment channel
    ChannelFund(ChannelFundTx),
    /// claim against a payment channel
    ChannelClaim(ChannelClaimTx),
}

/// A signed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// common fields
    pub common: TxCommon,
    /// type-specific payload
    pub kind: TxKind,
}

fn push_opt_u32(buf: &mut Vec<u8>, value: &Option<u32>) {
    match value {
        Some(v) => {
            buf.push(1);
            buf.extend_from_slice(&v.to_be_bytes());
        }
        None => buf.push(0),
    }
}

fn push_opt_u64(buf: &mut Vec<u8>, value: &Option<u64>) {
    match value {
        Some(v) => {
            buf.push(1);
            buf.extend_from_slice(&v.to_be_bytes());
        }
        None => buf.push(0),
    }
}

impl Transaction {
    /// The transaction's flags.
    pub fn flags(&self) -> u32 {
        self.common.flags
    }

    fn kind_tag(&self) -> u8 {
        match self.kind {
            TxKind::OfferCancel(_) => 1,
            TxKind::ChannelCreate(_) => 2,
            TxKind::ChannelFund(_) => 3,
            TxKind::ChannelClaim(_) => 4,
        }
    }

    /// The deterministic payload the transaction signature covers.
    ///
    /// This is the signing payload only, not a wire format: every field is
    /// appended in a fixed order with presence bytes for optional fields.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(192);
        buf.push(0x01);
        buf.push(self.kind_tag());
        buf.extend_from_slice(&self.common.account.to_bytes());
        buf.extend_from_slice(&self.common.sequence.to_be_bytes());
        buf.extend_from_slice(&self.common.fee.drops().to_be_bytes());
        buf.extend_from_slice(&self.common.flags.to_be_bytes());
        push_opt_u32(&mut buf, &self.common.source_tag);
        buf.extend_from_slice(&self.common.signing_key.to_bytes());
        match &self.kind {
            TxKind::OfferCancel(tx) => {
                buf.extend_from_slice(&tx.offer_sequence.to_be_bytes());
            }
            TxKind::ChannelCreate(tx) => {
                buf.extend_from_slice(&tx.destination.to_bytes());
                buf.extend_from_slice(&tx.amount.drops().to_be_bytes());
                buf.extend_from_slice(&tx.settle_delay.to_be_bytes());
                buf.extend_from_slice(&tx.public_key.to_bytes());
                push_opt_u64(&mut buf, &tx.cancel_after.map(|t| t.secs()));
                push_opt_u32(&mut buf, &tx.destination_tag);
            }
            TxKind::ChannelFund(tx) => {
                buf.extend_from_slice(&tx.channel.to_bytes());
                buf.extend_from_slice(&tx.amount.drops().to_be_bytes());
                push_opt_u64(&mut buf, &tx.expiration.map(|t| t.secs()));
            }
            TxKind::ChannelClaim(tx) => {
                buf.extend_from_slice(&tx.channel.to_bytes());
                push_opt_u64(&mut buf, &tx.balance.map(|b| b.drops() as u64));
                push_opt_u64(&mut buf, &tx.amount.map(|a| a.drops() as u64));
                match &tx.signature {
                    Some(sig) => {
                        buf.push(1);
                        buf.extend_from_slice(&sig.to_bytes());
                    }
                    None => buf.push(0),
                }
                match &tx.public_key {
                    Some(pk) => {
                        buf.push(1);
                        buf.extend_from_slice(&pk.to_bytes());
                    }
                    None => buf.push(0),
                }
            }
        }
        buf
    }
}
