// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::constants::KEY_SIZE_BYTES;
use crate::error::ModelsError;
use serde::de::Unexpected;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// A 256-bit ledger object key.
///
/// Keys are derived deterministically from semantic identifiers (see
/// [`crate::keylet`]) and order the ledger object space; book directories
/// rely on that ordering for best-quality-first traversal.
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Default)]
pub struct Key([u8; KEY_SIZE_BYTES]);

impl Key {
    /// The all-zero key.
    pub const ZERO: Key = Key([0u8; KEY_SIZE_BYTES]);

    /// The all-ones key, upper bound of the key space.
    pub const MAX: Key = Key([0xFFu8; KEY_SIZE_BYTES]);

    /// Compute a key by hashing raw data.
    ///
    /// # Example
    /// ```
    /// # use strand_models::Key;
    /// let key = Key::compute_from(b"hello world");
    /// assert_ne!(key, Key::ZERO);
    /// ```
    pub fn compute_from(data: &[u8]) -> Self {
        Key(Sha256::digest(data).into())
    }

    /// Serialize a key as bytes.
    pub fn to_bytes(&self) -> [u8; KEY_SIZE_BYTES] {
        self.0
    }

    /// Deserialize a key from bytes.
    pub fn from_bytes(data: &[u8; KEY_SIZE_BYTES]) -> Self {
        Key(*data)
    }

    /// Serialize using bs58 encoding with checksum.
    pub fn to_bs58_check(&self) -> String {
        bs58::encode(self.0).with_check().into_string()
    }

    /// Deserialize using bs58 encoding with checksum.
    pub fn from_bs58_check(data: &str) -> Result<Key, ModelsError> {
        let decoded = bs58::decode(data)
            .with_check(None)
            .into_vec()
            .map_err(|err| ModelsError::KeyParseError(format!("{}", err)))?;
        let bytes: [u8; KEY_SIZE_BYTES] = decoded
            .as_slice()
            .try_into()
            .map_err(|err| ModelsError::KeyParseError(format!("{}", err)))?;
        Ok(Key(bytes))
    }

    /// The next key in big-endian order, or `None` at the top of the space.
    pub fn next(&self) -> Option<Key> {
        let mut bytes = self.0;
        for byte in bytes.iter_mut().rev() {
            if *byte != 0xFF {
                *byte += 1;
                return Some(Key(bytes));
            }
            *byte = 0;
        }
        None
    }

    /// Return a copy with the low 64 bits replaced by `value` (big-endian).
    pub fn with_low_64(&self, value: u64) -> Key {
        let mut bytes = self.0;
        bytes[KEY_SIZE_BYTES - 8..].copy_from_slice(&value.to_be_bytes());
        Key(bytes)
    }

    /// Read the low 64 bits of the key (big-endian).
    pub fn low_64(&self) -> u64 {
        u64::from_be_bytes(self.0[KEY_SIZE_BYTES - 8..].try_into().unwrap())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_bs58_check())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_bs58_check())
    }
}

impl FromStr for Key {
    type Err = ModelsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Key::from_bs58_check(s)
    }
}

impl serde::Serialize for Key {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_bs58_check())
    }
}

impl<'de> serde::Deserialize<'de> for Key {
    fn deserialize<D: serde::de::Deserializer<'de>>(deserializer: D) -> Result<Key, D::Error> {
        struct KeyVisitor;
        impl<'de> serde::de::Visitor<'de> for KeyVisitor {
            type Value = Key;
            fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<Key, E> {
                Key::from_bs58_check(value)
                    .map_err(|_| E::invalid_value(Unexpected::Str(value), &self))
            }
            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "a bs58-check encoded ledger key")
            }
        }
        deserializer.deserialize_str(KeyVisitor)
    }
}
