// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::constants::KEY_SIZE_BYTES;
use crate::error::ModelsError;
use serde::de::Unexpected;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// An account identifier, derived by hashing the account's master public key.
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Default)]
pub struct AccountId([u8; KEY_SIZE_BYTES]);

impl AccountId {
    /// Sentinel identifier used as the issuer of the native asset.
    pub const ZERO: AccountId = AccountId([0u8; KEY_SIZE_BYTES]);

    /// Derive an account identifier from a public key.
    ///
    /// # Example
    /// ```
    /// # use strand_models::AccountId;
    /// # use strand_signature::KeyPair;
    /// let keypair = KeyPair::generate_ed25519();
    /// let id = AccountId::from_public_key(&keypair.public_key());
    /// assert_ne!(id, AccountId::ZERO);
    /// ```
    pub fn from_public_key(public_key: &strand_signature::PublicKey) -> Self {
        AccountId(Sha256::digest(public_key.to_bytes()).into())
    }

    /// Build an identifier from raw bytes.
    pub fn from_bytes(data: &[u8; KEY_SIZE_BYTES]) -> Self {
        AccountId(*data)
    }

    /// Serialize the identifier as bytes.
    pub fn to_bytes(&self) -> [u8; KEY_SIZE_BYTES] {
        self.0
    }

    /// Serialize using bs58 encoding with checksum.
    pub fn to_bs58_check(&self) -> String {
        bs58::encode(self.0).with_check().into_string()
    }

    /// Deserialize using bs58 encoding with checksum.
    pub fn from_bs58_check(data: &str) -> Result<AccountId, ModelsError> {
        let decoded = bs58::decode(data)
            .with_check(None)
            .into_vec()
            .map_err(|err| ModelsError::KeyParseError(format!("{}", err)))?;
        let bytes: [u8; KEY_SIZE_BYTES] = decoded
            .as_slice()
            .try_into()
            .map_err(|err| ModelsError::KeyParseError(format!("{}", err)))?;
        Ok(AccountId(bytes))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_bs58_check())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_bs58_check())
    }
}

impl FromStr for AccountId {
    type Err = ModelsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountId::from_bs58_check(s)
    }
}

impl serde::Serialize for AccountId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_bs58_check())
    }
}

impl<'de> serde::Deserialize<'de> for AccountId {
    fn deserialize<D: serde::de::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<AccountId, D::Error> {
        struct AccountIdVisitor;
        impl<'de> serde::de::Visitor<'de> for AccountIdVisitor {
            type Value = AccountId;
            fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<AccountId, E> {
                AccountId::from_bs58_check(value)
                    .map_err(|_| E::invalid_value(Unexpected::Str(value), &self))
            }
            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "a bs58-check encoded account identifier")
            }
        }
        deserializer.deserialize_str(AccountIdVisitor)
    }
}
