// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Ledger object layouts: the typed state entries the engine reads and
//! mutates through a view.

use crate::account::AccountId;
use crate::amount::{Amount, IssuedAmount, NativeAmount};
use crate::issue::{Book, Issue};
use crate::key::Key;
use crate::rate::Rate;
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use strand_signature::PublicKey;

/// Account flag: incoming transfers must carry a destination tag.
pub const ACCOUNT_REQUIRE_DEST_TAG: u32 = 0x0001;
/// Account flag: the account refuses native-asset transfers.
pub const ACCOUNT_DISALLOW_NATIVE: u32 = 0x0002;
/// Account flag: the issuer froze all its issued obligations.
pub const ACCOUNT_GLOBAL_FREEZE: u32 = 0x0004;

/// Trust line flag: the line is frozen by its issuer.
pub const LINE_FREEZE: u32 = 0x0001;

/// The root state object of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRoot {
    /// account identifier
    pub id: AccountId,
    /// native-asset balance in drops
    pub balance: NativeAmount,
    /// sequence number of the next valid transaction
    pub sequence: u32,
    /// number of owned ledger objects, for reserve computation
    pub owner_count: u32,
    /// account flags
    pub flags: u32,
    /// transfer fee charged when third parties move this account's issues
    pub transfer_rate: Option<Rate>,
}

impl AccountRoot {
    /// A fresh account with the given identifier and balance.
    pub fn new(id: AccountId, balance: NativeAmount) -> Self {
        AccountRoot {
            id,
            balance,
            sequence: 1,
            owner_count: 0,
            flags: 0,
            transfer_rate: None,
        }
    }
}

/// A standing limit order to exchange one asset for another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferEntry {
    /// the offer owner
    pub account: AccountId,
    /// sequence number of the transaction that created the offer
    pub sequence: u32,
    /// the amount the taker pays to consume the whole offer
    pub taker_pays: Amount,
    /// the amount the taker gets for consuming the whole offer
    pub taker_gets: Amount,
    /// key of the book-directory page holding this offer
    pub book_directory: Key,
    /// page number within the book directory
    pub book_node: u64,
    /// page number within the owner directory
    pub owner_node: u64,
    /// optional expiration close time
    pub expiration: Option<Timestamp>,
    /// offer flags
    pub flags: u32,
}

impl OfferEntry {
    /// The book this offer belongs to.
    pub fn book(&self) -> Book {
        Book::new(self.taker_pays.issue(), self.taker_gets.issue())
    }
}

/// One page of a paginated directory.
///
/// A directory is a root page plus zero or more continuation pages, each
/// holding an ordered list of entry keys. `index_previous` on the root
/// tracks the last allocated page so appends do not walk the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    /// key of the directory's root page
    pub root: Key,
    /// ordered entry keys held by this page
    pub indexes: Vec<Key>,
    /// page number of the next page, 0 if none
    pub index_next: u64,
    /// on the root page: number of the last page in the chain; on other
    /// pages: number of the previous page
    pub index_previous: u64,
    /// owning account, for owner directories
    pub owner: Option<AccountId>,
    /// the traded pair, for order-book directories
    pub book: Option<Book>,
}

impl DirectoryNode {
    /// A fresh, empty page under `root`.
    pub fn new(root: Key) -> Self {
        DirectoryNode {
            root,
            indexes: Vec::new(),
            index_next: 0,
            index_previous: 0,
            owner: None,
            book: None,
        }
    }
}

/// A unidirectional payment channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayChannel {
    /// channel owner; the source of all channel payments
    pub account: AccountId,
    /// the recipient at the end of the channel
    pub destination: AccountId,
    /// total amount of native asset funded into the channel
    pub amount: NativeAmount,
    /// amount already paid out; monotonically non-decreasing
    pub balance: NativeAmount,
    /// seconds everyone but the recipient must wait for a superior claim
    pub settle_delay: u64,
    /// close time after which any channel transaction closes the channel
    pub expiration: Option<Timestamp>,
    /// hard deadline set at creation; behaves like `expiration` but cannot
    /// be renewed away
    pub cancel_after: Option<Timestamp>,
    /// the key that signs claims against the channel
    pub public_key: PublicKey,
    /// tag identifying the owner's side of the channel
    pub source_tag: Option<u32>,
    /// tag identifying the destination's side of the channel
    pub destination_tag: Option<u32>,
    /// page number within the owner directory
    pub owner_node: u64,
}

/// One side of an issued-currency relationship: `account`'s holding of
/// `issue`, possibly negative when the holder is in debt to the issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustLine {
    /// the holding account
    pub account: AccountId,
    /// the held asset
    pub issue: Issue,
    /// current holding
    pub balance: IssuedAmount,
    /// line flags
    pub flags: u32,
}

/// A typed ledger state object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerObject {
    /// an account root
    Account(AccountRoot),
    /// an order-book offer
    Offer(OfferEntry),
    /// a directory page
    Directory(DirectoryNode),
    /// a payment channel
    Channel(PayChannel),
    /// a trust line
    Line(TrustLine),
}

impl LedgerObject {
    /// A short tag for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            LedgerObject::Account(_) => "account",
            LedgerObject::Offer(_) => "offer",
            LedgerObject::Directory(_) => "directory",
            LedgerObject::Channel(_) => "channel",
            LedgerObject::Line(_) => "line",
        }
    }

    /// Borrow as an account root.
    pub fn as_account(&self) -> Option<&AccountRoot> {
        match self {
            LedgerObject::Account(account) => Some(account),
            _ => None,
        }
    }

    /// Borrow as an offer.
    pub fn as_offer(&self) -> Option<&OfferEntry> {
        match self {
            LedgerObject::Offer(offer) => Some(offer),
            _ => None,
        }
    }

    /// Borrow as a directory page.
    pub fn as_directory(&self) -> Option<&DirectoryNode> {
        match self {
            LedgerObject::Directory(dir) => Some(dir),
            _ => None,
        }
    }

    /// Borrow as a payment channel.
    pub fn as_channel(&self) -> Option<&PayChannel> {
        match self {
            LedgerObject::Channel(channel) => Some(channel),
            _ => None,
        }
    }

    /// Borrow as a trust line.
    pub fn as_line(&self) -> Option<&TrustLine> {
        match self {
            LedgerObject::Line(line) => Some(line),
            _ => None,
        }
    }

    /// Take as an account root.
    pub fn into_account(self) -> Option<AccountRoot> {
        match self {
            LedgerObject::Account(account) => Some(account),
            _ => None,
        }
    }

    /// Take as an offer.
    pub fn into_offer(self) -> Option<OfferEntry> {
        match self {
            LedgerObject::Offer(offer) => Some(offer),
            _ => None,
        }
    }

    /// Take as a directory page.
    pub fn into_directory(self) -> Option<DirectoryNode> {
        match self {
            LedgerObject::Directory(dir) => Some(dir),
            _ => None,
        }
    }

    /// Take as a payment channel.
    pub fn into_channel(self) -> Option<PayChannel> {
        match self {
            LedgerObject::Channel(channel) => Some(channel),
            _ => None,
        }
    }

    /// Take as a trust line.
    pub fn into_line(self) -> Option<TrustLine> {
        match self {
            LedgerObject::Line(line) => Some(line),
            _ => None,
        }
    }
}
