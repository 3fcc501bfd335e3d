// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Transaction engine result codes.
//!
//! Codes are grouped in stable numeric ranges by outcome category. The
//! ranges are stable and so is every assigned number: codes are persisted
//! in historical transaction metadata, so a number is frozen once assigned.
//! Always match on tokens in code, never on raw numbers.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The outcome category of a transaction result, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCategory {
    /// rejected by local policy before relaying; retriable elsewhere
    Local,
    /// can never succeed in any ledger state
    Malformed,
    /// ledger state contradiction; could succeed in a different history
    Failure,
    /// current ledger state prevents success for now
    Retry,
    /// applied in full
    Success,
    /// applied, consuming fee and sequence, with a degraded or no-op outcome
    ClaimFee,
}

/// Transaction engine result.
///
/// - `-399..=-300`: local error, not forwarded, no fee claimed
/// - `-299..=-200`: malformed, can not succeed in any imagined ledger
/// - `-199..=-100`: failure, could succeed in an imagined ledger
/// - `-99..=-1`: retry, a different order of transactions may succeed
/// - `0`: success
/// - `100..=199`: the transaction claimed its fee and sequence only
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    IntoPrimitive,
    TryFromPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(i32)]
pub enum TransResult {
    /// unspecified local error
    TelLocalError = -399,
    /// public key rejected by local policy
    TelBadPublicKey = -398,
    /// fee below the local relay threshold
    TelInsufFeeP = -397,
    /// local processing failure
    TelFailedProcessing = -396,

    /// unspecified malformation
    TemMalformed = -299,
    /// malformed or out-of-range amount
    TemBadAmount = -298,
    /// malformed currency
    TemBadCurrency = -297,
    /// expiration violates the settle-delay constraints
    TemBadExpiration = -296,
    /// malformed fee
    TemBadFee = -295,
    /// malformed offer
    TemBadOffer = -294,
    /// zero or out-of-order sequence reference
    TemBadSequence = -293,
    /// signature fails verification or is non-canonical
    TemBadSignature = -292,
    /// signer is not the key authorized for this object
    TemBadSigner = -291,
    /// malformed source account
    TemBadSrcAccount = -290,
    /// transfer rate out of the valid range
    TemBadTransferRate = -289,
    /// destination is the source
    TemDstIsSrc = -288,
    /// destination missing
    TemDstNeeded = -287,
    /// generic invalid transaction
    TemInvalid = -286,
    /// flag outside the type's allowed mask, or a contradictory combination
    TemInvalidFlag = -285,
    /// the transaction would do nothing
    TemRedundant = -284,
    /// the required feature is not enabled
    TemDisabled = -283,

    /// unspecified failure
    TefFailure = -199,
    /// the signing key is not authorized for the source account
    TefBadAuth = -198,
    /// the ledger state is internally inconsistent
    TefBadLedger = -197,
    /// unexpected internal error
    TefInternal = -196,
    /// the sequence number was already consumed
    TefPastSeq = -195,

    /// unspecified retry
    TerRetry = -99,
    /// the source cannot cover the fee right now
    TerInsufFeeB = -98,
    /// the source account does not exist
    TerNoAccount = -97,
    /// the sequence number is ahead of the account
    TerPreSeq = -96,

    /// applied in full
    TesSuccess = 0,

    /// fee claimed, unspecified degraded outcome
    TecClaim = 100,
    /// a directory ran out of pages
    TecDirFull = 101,
    /// the object expired before the transaction touched it
    TecExpired = 102,
    /// processing failed after the fee was committed
    TecFailedProcessing = 103,
    /// the asset is frozen for this holder
    TecFrozen = 104,
    /// the reserve requirement is not met
    TecInsufficientReserve = 105,
    /// the destination account does not exist
    TecNoDst = 106,
    /// the destination requires a destination tag
    TecDstTagNeeded = 107,
    /// the referenced object does not exist
    TecNoEntry = 108,
    /// the source is not permitted to perform this operation
    TecNoPermission = 109,
    /// the target account cannot receive this transfer
    TecNoTarget = 110,
    /// no liquidity on the path
    TecPathDry = 111,
    /// insufficient funds beyond the reserve
    TecUnfunded = 112,
    /// the offer owner has no funds for the output asset
    TecUnfundedOffer = 113,
    /// the claimed or transferred amount exceeds the available funds
    TecUnfundedPayment = 114,
}

impl TransResult {
    /// The outcome category of this code.
    pub fn category(&self) -> ResultCategory {
        match i32::from(*self) {
            -399..=-300 => ResultCategory::Local,
            -299..=-200 => ResultCategory::Malformed,
            -199..=-100 => ResultCategory::Failure,
            -99..=-1 => ResultCategory::Retry,
            0 => ResultCategory::Success,
            _ => ResultCategory::ClaimFee,
        }
    }

    /// Returns `true` for full success.
    pub fn is_tes(&self) -> bool {
        *self == TransResult::TesSuccess
    }

    /// Returns `true` for fee-claiming degraded outcomes.
    pub fn is_tec(&self) -> bool {
        self.category() == ResultCategory::ClaimFee
    }

    /// Returns `true` when the transaction leaves a trace in the ledger:
    /// full success or a fee-claiming outcome.
    pub fn applied(&self) -> bool {
        self.is_tes() || self.is_tec()
    }

    /// The stable token for this code.
    pub fn token(&self) -> &'static str {
        match self {
            TransResult::TelLocalError => "telLOCAL_ERROR",
            TransResult::TelBadPublicKey => "telBAD_PUBLIC_KEY",
            TransResult::TelInsufFeeP => "telINSUF_FEE_P",
            TransResult::TelFailedProcessing => "telFAILED_PROCESSING",
            TransResult::TemMalformed => "temMALFORMED",
            TransResult::TemBadAmount => "temBAD_AMOUNT",
            TransResult::TemBadCurrency => "temBAD_CURRENCY",
            TransResult::TemBadExpiration => "temBAD_EXPIRATION",
            TransResult::TemBadFee => "temBAD_FEE",
            TransResult::TemBadOffer => "temBAD_OFFER",
            TransResult::TemBadSequence => "temBAD_SEQUENCE",
            TransResult::TemBadSignature => "temBAD_SIGNATURE",
            TransResult::TemBadSigner => "temBAD_SIGNER",
            TransResult::TemBadSrcAccount => "temBAD_SRC_ACCOUNT",
            TransResult::TemBadTransferRate => "temBAD_TRANSFER_RATE",
            TransResult::TemDstIsSrc => "temDST_IS_SRC",
            TransResult::TemDstNeeded => "temDST_NEEDED",
            TransResult::TemInvalid => "temINVALID",
            TransResult::TemInvalidFlag => "temINVALID_FLAG",
            TransResult::TemRedundant => "temREDUNDANT",
            TransResult::TemDisabled => "temDISABLED",
            TransResult::TefFailure => "tefFAILURE",
            TransResult::TefBadAuth => "tefBAD_AUTH",
            TransResult::TefBadLedger => "tefBAD_LEDGER",
            TransResult::TefInternal => "tefINTERNAL",
            TransResult::TefPastSeq => "tefPAST_SEQ",
            TransResult::TerRetry => "terRETRY",
            TransResult::TerInsufFeeB => "terINSUF_FEE_B",
            TransResult::TerNoAccount => "terNO_ACCOUNT",
            TransResult::TerPreSeq => "terPRE_SEQ",
            TransResult::TesSuccess => "tesSUCCESS",
            TransResult::TecClaim => "tecCLAIM",
            TransResult::TecDirFull => "tecDIR_FULL",
            TransResult::TecExpired => "tecEXPIRED",
            TransResult::TecFailedProcessing => "tecFAILED_PROCESSING",
            TransResult::TecFrozen => "tecFROZEN",
            TransResult::TecInsufficientReserve => "tecINSUFFICIENT_RESERVE",
            TransResult::TecNoDst => "tecNO_DST",
            TransResult::TecDstTagNeeded => "tecDST_TAG_NEEDED",
            TransResult::TecNoEntry => "tecNO_ENTRY",
            TransResult::TecNoPermission => "tecNO_PERMISSION",
            TransResult::TecNoTarget => "tecNO_TARGET",
            TransResult::TecPathDry => "tecPATH_DRY",
            TransResult::TecUnfunded => "tecUNFUNDED",
            TransResult::TecUnfundedOffer => "tecUNFUNDED_OFFER",
            TransResult::TecUnfundedPayment => "tecUNFUNDED_PAYMENT",
        }
    }

    /// A human-readable description of this code.
    pub fn description(&self) -> &'static str {
        match self {
            TransResult::TelLocalError => "Local failure.",
            TransResult::TelBadPublicKey => "Public key is not valid.",
            TransResult::TelInsufFeeP => "Fee insufficient.",
            TransResult::TelFailedProcessing => "Failed to correctly process transaction.",
            TransResult::TemMalformed => "Malformed transaction.",
            TransResult::TemBadAmount => "Can only send positive amounts.",
            TransResult::TemBadCurrency => "Malformed: Bad currency.",
            TransResult::TemBadExpiration => "Malformed: Bad expiration.",
            TransResult::TemBadFee => "Invalid fee, negative or not native.",
            TransResult::TemBadOffer => "Malformed: Bad offer.",
            TransResult::TemBadSequence => "Malformed: Sequence is not in the past.",
            TransResult::TemBadSignature => "Malformed: Bad signature.",
            TransResult::TemBadSigner => "Malformed: No signer may duplicate account or other signers.",
            TransResult::TemBadSrcAccount => "Malformed: Bad source account.",
            TransResult::TemBadTransferRate => "Malformed: Transfer rate must be >= 1.0 and <= 2.0",
            TransResult::TemDstIsSrc => "Destination may not be source.",
            TransResult::TemDstNeeded => "Destination not specified.",
            TransResult::TemInvalid => "The transaction is ill-formed.",
            TransResult::TemInvalidFlag => "The transaction has an invalid flag.",
            TransResult::TemRedundant => "Sends same currency to self.",
            TransResult::TemDisabled => "The transaction requires logic that is currently disabled.",
            TransResult::TefFailure => "Failed to apply.",
            TransResult::TefBadAuth => "Transaction's public key is not authorized.",
            TransResult::TefBadLedger => "Ledger in unexpected state.",
            TransResult::TefInternal => "Internal error.",
            TransResult::TefPastSeq => "This sequence number has already passed.",
            TransResult::TerRetry => "Retry transaction.",
            TransResult::TerInsufFeeB => "Account balance can't pay fee.",
            TransResult::TerNoAccount => "The source account does not exist.",
            TransResult::TerPreSeq => "Missing/inapplicable prior transaction.",
            TransResult::TesSuccess => "The transaction was applied. Only final in a validated ledger.",
            TransResult::TecClaim => "Fee claimed. Sequence used. No action.",
            TransResult::TecDirFull => "Can not add entry to full directory.",
            TransResult::TecExpired => "Expiration time is passed.",
            TransResult::TecFailedProcessing => "Failed to correctly process transaction.",
            TransResult::TecFrozen => "Asset is frozen.",
            TransResult::TecInsufficientReserve => "Insufficient reserve to complete requested operation.",
            TransResult::TecNoDst => "Destination does not exist. Send to create it.",
            TransResult::TecDstTagNeeded => "A destination tag is required.",
            TransResult::TecNoEntry => "No matching entry found.",
            TransResult::TecNoPermission => "No permission to perform requested operation.",
            TransResult::TecNoTarget => "Target account is not applicable.",
            TransResult::TecPathDry => "Path could not send partial amount.",
            TransResult::TecUnfunded => "One of _ADD, _OFFER, or _SEND. Deprecated.",
            TransResult::TecUnfundedOffer => "Insufficient balance to fund created offer.",
            TransResult::TecUnfundedPayment => "Insufficient funds balance for payment.",
        }
    }
}

impl fmt::Display for TransResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_follow_ranges() {
        assert_eq!(TransResult::TelInsufFeeP.category(), ResultCategory::Local);
        assert_eq!(
            TransResult::TemBadSignature.category(),
            ResultCategory::Malformed
        );
        assert_eq!(TransResult::TefPastSeq.category(), ResultCategory::Failure);
        assert_eq!(TransResult::TerPreSeq.category(), ResultCategory::Retry);
        assert_eq!(TransResult::TesSuccess.category(), ResultCategory::Success);
        assert_eq!(
            TransResult::TecUnfundedPayment.category(),
            ResultCategory::ClaimFee
        );
    }

    #[test]
    fn test_applied_means_fee_consumed() {
        assert!(TransResult::TesSuccess.applied());
        assert!(TransResult::TecExpired.applied());
        assert!(!TransResult::TerPreSeq.applied());
        assert!(!TransResult::TemMalformed.applied());
    }

    #[test]
    fn test_numeric_codes_round_trip() {
        for code in [
            TransResult::TelLocalError,
            TransResult::TemDisabled,
            TransResult::TefPastSeq,
            TransResult::TerNoAccount,
            TransResult::TesSuccess,
            TransResult::TecDirFull,
        ] {
            let raw: i32 = code.into();
            assert_eq!(TransResult::try_from(raw).unwrap(), code);
        }
    }
}
