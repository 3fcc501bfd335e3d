// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::error::StrandSignatureError;
use ed25519_dalek::{Signer, Verifier};
use serde::de::Unexpected;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Size of the tagged public key encoding
pub const PUBLIC_KEY_SIZE_BYTES: usize = 33;
/// Size of a signature, both schemes
pub const SIGNATURE_SIZE_BYTES: usize = 64;

/// First byte of an ed25519 public key encoding
const ED25519_PREFIX_BYTE: u8 = 0xED;

/// A public key, tagged with its signature scheme.
///
/// The encoding is 33 bytes: `0xED` followed by the 32-byte ed25519 key, or
/// a compressed secp256k1 point starting with `0x02`/`0x03`. Any other
/// leading byte is not a valid public key encoding.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum PublicKey {
    /// ed25519 verifying key bytes
    Ed25519([u8; 32]),
    /// compressed secp256k1 point
    Secp256k1([u8; 33]),
}

impl PublicKey {
    /// Return the tagged 33-byte encoding of the key.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE_BYTES] {
        match self {
            PublicKey::Ed25519(key) => {
                let mut bytes = [0u8; PUBLIC_KEY_SIZE_BYTES];
                bytes[0] = ED25519_PREFIX_BYTE;
                bytes[1..].copy_from_slice(key);
                bytes
            }
            PublicKey::Secp256k1(bytes) => *bytes,
        }
    }

    /// Classify and decode a public key from its tagged encoding.
    ///
    /// # Example
    /// ```
    /// # use strand_signature::{KeyPair, PublicKey};
    /// let keypair = KeyPair::generate_ed25519();
    /// let bytes = keypair.public_key().to_bytes();
    /// let decoded = PublicKey::from_bytes(&bytes).unwrap();
    /// assert_eq!(decoded, keypair.public_key());
    /// ```
    pub fn from_bytes(data: &[u8]) -> Result<PublicKey, StrandSignatureError> {
        if data.len() != PUBLIC_KEY_SIZE_BYTES {
            return Err(StrandSignatureError::ParsingError(format!(
                "invalid public key length: {}",
                data.len()
            )));
        }
        match data[0] {
            ED25519_PREFIX_BYTE => {
                let mut key = [0u8; 32];
                key.copy_from_slice(&data[1..]);
                // reject encodings that are not a valid curve point
                ed25519_dalek::VerifyingKey::from_bytes(&key).map_err(|err| {
                    StrandSignatureError::ParsingError(format!("invalid ed25519 key: {}", err))
                })?;
                Ok(PublicKey::Ed25519(key))
            }
            0x02 | 0x03 => {
                let mut key = [0u8; 33];
                key.copy_from_slice(data);
                libsecp256k1::PublicKey::parse_compressed(&key)?;
                Ok(PublicKey::Secp256k1(key))
            }
            prefix => Err(StrandSignatureError::ParsingError(format!(
                "unknown public key prefix: {:#04x}",
                prefix
            ))),
        }
    }

    /// Serialize using bs58 encoding with checksum.
    pub fn to_bs58_check(&self) -> String {
        bs58::encode(self.to_bytes()).with_check().into_string()
    }

    /// Deserialize using bs58 encoding with checksum.
    pub fn from_bs58_check(data: &str) -> Result<PublicKey, StrandSignatureError> {
        let decoded = bs58::decode(data)
            .with_check(None)
            .into_vec()
            .map_err(|err| StrandSignatureError::ParsingError(format!("{}", err)))?;
        PublicKey::from_bytes(&decoded)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_bs58_check())
    }
}

impl FromStr for PublicKey {
    type Err = StrandSignatureError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PublicKey::from_bs58_check(s)
    }
}

impl serde::Serialize for PublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_bs58_check())
    }
}

impl<'de> serde::Deserialize<'de> for PublicKey {
    fn deserialize<D: serde::de::Deserializer<'de>>(deserializer: D) -> Result<PublicKey, D::Error> {
        struct PublicKeyVisitor;
        impl<'de> serde::de::Visitor<'de> for PublicKeyVisitor {
            type Value = PublicKey;
            fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<PublicKey, E> {
                PublicKey::from_bs58_check(value)
                    .map_err(|_| E::invalid_value(Unexpected::Str(value), &self))
            }
            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "a bs58-check encoded tagged public key")
            }
        }
        deserializer.deserialize_str(PublicKeyVisitor)
    }
}

/// A 64-byte signature (ed25519, or secp256k1 in compact `r || s` form).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Signature([u8; SIGNATURE_SIZE_BYTES]);

impl Signature {
    /// Return the raw signature bytes.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_SIZE_BYTES] {
        self.0
    }

    /// Build a signature from raw bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Signature, StrandSignatureError> {
        let bytes: [u8; SIGNATURE_SIZE_BYTES] = data.try_into().map_err(|_| {
            StrandSignatureError::ParsingError(format!("invalid signature length: {}", data.len()))
        })?;
        Ok(Signature(bytes))
    }

    /// Serialize using bs58 encoding with checksum.
    pub fn to_bs58_check(&self) -> String {
        bs58::encode(self.0).with_check().into_string()
    }

    /// Deserialize using bs58 encoding with checksum.
    pub fn from_bs58_check(data: &str) -> Result<Signature, StrandSignatureError> {
        let decoded = bs58::decode(data)
            .with_check(None)
            .into_vec()
            .map_err(|err| StrandSignatureError::ParsingError(format!("{}", err)))?;
        Signature::from_bytes(&decoded)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_bs58_check())
    }
}

impl FromStr for Signature {
    type Err = StrandSignatureError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Signature::from_bs58_check(s)
    }
}

impl serde::Serialize for Signature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_bs58_check())
    }
}

impl<'de> serde::Deserialize<'de> for Signature {
    fn deserialize<D: serde::de::Deserializer<'de>>(deserializer: D) -> Result<Signature, D::Error> {
        struct SignatureVisitor;
        impl<'de> serde::de::Visitor<'de> for SignatureVisitor {
            type Value = Signature;
            fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<Signature, E> {
                Signature::from_bs58_check(value)
                    .map_err(|_| E::invalid_value(Unexpected::Str(value), &self))
            }
            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "a bs58-check encoded signature")
            }
        }
        deserializer.deserialize_str(SignatureVisitor)
    }
}

/// `KeyPair` is used for signing claim authorizations and transactions.
#[derive(Clone)]
pub enum KeyPair {
    /// ed25519 signing key
    Ed25519(ed25519_dalek::SigningKey),
    /// secp256k1 secret key
    Secp256k1(libsecp256k1::SecretKey),
}

impl KeyPair {
    /// Generate a new ed25519 `KeyPair`.
    ///
    /// # Example
    /// ```
    /// # use strand_signature::{verify, KeyPair};
    /// let keypair = KeyPair::generate_ed25519();
    /// let signature = keypair.sign(b"Hello World!").unwrap();
    /// assert!(verify(&keypair.public_key(), b"Hello World!", &signature, true));
    /// ```
    pub fn generate_ed25519() -> KeyPair {
        let mut rng = rand::rngs::OsRng;
        KeyPair::Ed25519(ed25519_dalek::SigningKey::generate(&mut rng))
    }

    /// Generate a new secp256k1 `KeyPair`.
    pub fn generate_secp256k1() -> KeyPair {
        let mut rng = rand::rngs::OsRng;
        KeyPair::Secp256k1(libsecp256k1::SecretKey::random(&mut rng))
    }

    /// Build an ed25519 keypair from 32 secret bytes.
    pub fn ed25519_from_bytes(bytes: &[u8; 32]) -> KeyPair {
        KeyPair::Ed25519(ed25519_dalek::SigningKey::from_bytes(bytes))
    }

    /// Build a secp256k1 keypair from 32 secret bytes.
    pub fn secp256k1_from_bytes(bytes: &[u8; 32]) -> Result<KeyPair, StrandSignatureError> {
        Ok(KeyPair::Secp256k1(libsecp256k1::SecretKey::parse(bytes)?))
    }

    /// Sign a message, producing a canonical signature.
    ///
    /// secp256k1 messages are hashed with SHA-256 before signing; the
    /// resulting signature is normalized to low-S form.
    pub fn sign(&self, message: &[u8]) -> Result<Signature, StrandSignatureError> {
        match self {
            KeyPair::Ed25519(sk) => Signature::from_bytes(&sk.sign(message).to_bytes()),
            KeyPair::Secp256k1(sk) => {
                let digest: [u8; 32] = Sha256::digest(message).into();
                let msg = libsecp256k1::Message::parse(&digest);
                let (mut sig, _) = libsecp256k1::sign(&msg, sk);
                sig.normalize_s();
                Signature::from_bytes(&sig.serialize())
            }
        }
    }

    /// Return the `PublicKey` matching this keypair.
    pub fn public_key(&self) -> PublicKey {
        match self {
            KeyPair::Ed25519(sk) => PublicKey::Ed25519(sk.verifying_key().to_bytes()),
            KeyPair::Secp256k1(sk) => PublicKey::Secp256k1(
                libsecp256k1::PublicKey::from_secret_key(sk).serialize_compressed(),
            ),
        }
    }
}

/// Verify a signature against a public key and message.
///
/// With `require_canonical`, non-canonical signatures are rejected even when
/// mathematically valid: high-S secp256k1 signatures and non-strict ed25519
/// encodings. Canonical-form checking is a correctness requirement for
/// consensus-visible signatures, not optional hardening.
pub fn verify(
    public_key: &PublicKey,
    message: &[u8],
    signature: &Signature,
    require_canonical: bool,
) -> bool {
    match public_key {
        PublicKey::Ed25519(key) => {
            let vk = match ed25519_dalek::VerifyingKey::from_bytes(key) {
                Ok(vk) => vk,
                Err(_) => return false,
            };
            let sig = ed25519_dalek::Signature::from_bytes(&signature.to_bytes());
            if require_canonical {
                vk.verify_strict(message, &sig).is_ok()
            } else {
                vk.verify(message, &sig).is_ok()
            }
        }
        PublicKey::Secp256k1(key) => {
            let pk = match libsecp256k1::PublicKey::parse_compressed(key) {
                Ok(pk) => pk,
                Err(_) => return false,
            };
            let sig = match libsecp256k1::Signature::parse_standard(&signature.to_bytes()) {
                Ok(sig) => sig,
                Err(_) => return false,
            };
            if require_canonical && sig.s.is_high() {
                return false;
            }
            let digest: [u8; 32] = Sha256::digest(message).into();
            let msg = libsecp256k1::Message::parse(&digest);
            libsecp256k1::verify(&msg, &sig, &pk)
        }
    }
}
