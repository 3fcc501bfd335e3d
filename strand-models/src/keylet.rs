// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Deterministic derivation of ledger object keys from semantic
//! identifiers.
//!
//! These functions are pure and their output is part of the persisted state
//! layout: they must remain stable across versions.
//!
//! Book directories embed the offer quality in the low 64 bits of the page
//! key, so iterating the key range `[book_base, book_end)` visits quality
//! buckets best-first.

use crate::account::AccountId;
use crate::issue::{Book, Issue};
use crate::key::Key;
use sha2::{Digest, Sha256};

const ACCOUNT_SPACE: u8 = b'a';
const OFFER_SPACE: u8 = b'o';
const OWNER_DIR_SPACE: u8 = b'O';
const PAGE_SPACE: u8 = b'p';
const CHANNEL_SPACE: u8 = b'x';
const LINE_SPACE: u8 = b'r';
const BOOK_SPACE: u8 = b'B';

fn hash_parts(space: u8, parts: &[&[u8]]) -> Key {
    let mut hasher = Sha256::new();
    hasher.update([space]);
    for part in parts {
        hasher.update(part);
    }
    Key::from_bytes(&hasher.finalize().into())
}

/// Key of an account root.
pub fn account(id: &AccountId) -> Key {
    hash_parts(ACCOUNT_SPACE, &[&id.to_bytes()])
}

/// Key of the offer created by `owner` with the given sequence number.
pub fn offer(owner: &AccountId, sequence: u32) -> Key {
    hash_parts(OFFER_SPACE, &[&owner.to_bytes(), &sequence.to_be_bytes()])
}

/// Key of the root page of an account's owner directory.
pub fn owner_dir(owner: &AccountId) -> Key {
    hash_parts(OWNER_DIR_SPACE, &[&owner.to_bytes()])
}

/// Key of a directory page; page 0 is the root itself.
pub fn page(root: &Key, index: u64) -> Key {
    if index == 0 {
        return *root;
    }
    hash_parts(PAGE_SPACE, &[&root.to_bytes(), &index.to_be_bytes()])
}

/// Key of the payment channel created by `owner` toward `destination` with
/// the given sequence number.
pub fn channel(owner: &AccountId, destination: &AccountId, sequence: u32) -> Key {
    hash_parts(
        CHANNEL_SPACE,
        &[
            &owner.to_bytes(),
            &destination.to_bytes(),
            &sequence.to_be_bytes(),
        ],
    )
}

/// Key of the trust line between `owner` and the issue.
pub fn line(owner: &AccountId, issue: &Issue) -> Key {
    hash_parts(
        LINE_SPACE,
        &[
            &owner.to_bytes(),
            &issue.currency.to_bytes(),
            &issue.issuer.to_bytes(),
        ],
    )
}

/// Base key of a book: the low 64 bits are zeroed so quality-bucket
/// directory keys derived from it sort by quality.
pub fn book_base(book: &Book) -> Key {
    hash_parts(
        BOOK_SPACE,
        &[
            &book.input.currency.to_bytes(),
            &book.input.issuer.to_bytes(),
            &book.output.currency.to_bytes(),
            &book.output.issuer.to_bytes(),
        ],
    )
    .with_low_64(0)
}

/// Key of the quality-bucket directory within a book.
pub fn quality_dir(book_base: &Key, quality: u64) -> Key {
    book_base.with_low_64(quality)
}

/// Exclusive upper bound of a book's key range.
pub fn book_end(book_base: &Key) -> Key {
    book_base.with_low_64(u64::MAX)
}

/// Read back the quality bucket from a book directory key.
pub fn quality_from_key(key: &Key) -> u64 {
    key.low_64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::Currency;

    #[test]
    fn test_keylets_are_stable_and_distinct() {
        let alice = AccountId::from_bytes(&[1u8; 32]);
        let bob = AccountId::from_bytes(&[2u8; 32]);
        assert_eq!(account(&alice), account(&alice));
        assert_ne!(account(&alice), account(&bob));
        assert_ne!(account(&alice), owner_dir(&alice));
        assert_ne!(offer(&alice, 1), offer(&alice, 2));
        assert_ne!(channel(&alice, &bob, 1), channel(&bob, &alice, 1));
    }

    #[test]
    fn test_page_zero_is_root() {
        let root = owner_dir(&AccountId::from_bytes(&[3u8; 32]));
        assert_eq!(page(&root, 0), root);
        assert_ne!(page(&root, 1), root);
    }

    #[test]
    fn test_book_quality_dirs_sort_by_quality() {
        let usd = Issue::new(
            Currency::from_code("USD").unwrap(),
            AccountId::from_bytes(&[7u8; 32]),
        );
        let base = book_base(&Book::new(Issue::native(), usd));
        let better = quality_dir(&base, 500);
        let worse = quality_dir(&base, 900);
        assert!(base <= better);
        assert!(better < worse);
        assert!(worse < book_end(&base));
        assert_eq!(quality_from_key(&better), 500);
    }
}
