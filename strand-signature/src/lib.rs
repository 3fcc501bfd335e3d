// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Signature management for claim authorizations and transaction signing.
//!
//! Two schemes are supported and are distinguished by the first byte of the
//! public key encoding: `0xED` marks an ed25519 key, `0x02`/`0x03` mark a
//! compressed secp256k1 key. Verification can optionally require canonical
//! signature form (low-S for secp256k1, strict encoding for ed25519).

#![warn(missing_docs)]
mod error;
mod signature_impl;

pub use error::StrandSignatureError;
pub use signature_impl::{
    verify, KeyPair, PublicKey, Signature, PUBLIC_KEY_SIZE_BYTES, SIGNATURE_SIZE_BYTES,
};
