// Copyright (c) 2022 MASSA LABS <info@massa.net>

use strand_ledger::dir::dir_first;
use strand_ledger::view_ops::offer_delete;
use strand_ledger::{ApplyView, ReadView};
use strand_models::keylet;
use strand_models::ledger::{LedgerObject, OfferEntry};
use strand_models::{Book, Key, Quality};
use tracing::warn;

/// A cursor over the best entries of an order book.
///
/// The book is a key range of quality-bucket directories; the cursor walks
/// them best-quality-first via [`ReadView::succ`], always reading the first
/// entry of the current bucket. Advancing consumes the previously yielded
/// offer: it is deleted from the view before the cursor moves, unless its
/// ledger entry was already missing.
pub struct BookTip {
    book_base: Key,
    book_end: Key,
    dir: Option<Key>,
    index: Key,
    entry: Option<OfferEntry>,
    done: bool,
}

impl BookTip {
    /// Open a cursor over `book`.
    pub fn new(book: &Book) -> Self {
        let base = keylet::book_base(book);
        BookTip {
            book_base: base,
            book_end: keylet::book_end(&base),
            dir: None,
            index: Key::ZERO,
            entry: None,
            done: false,
        }
    }

    /// The current quality directory. Only meaningful after a successful
    /// [`BookTip::step`].
    pub fn dir(&self) -> Key {
        self.dir.unwrap_or(Key::ZERO)
    }

    /// The current directory entry key. Only meaningful after a successful
    /// [`BookTip::step`].
    pub fn index(&self) -> Key {
        self.index
    }

    /// The ledger entry at the cursor, `None` when the directory entry
    /// dangles.
    pub fn entry(&self) -> Option<&OfferEntry> {
        self.entry.as_ref()
    }

    /// The quality bucket at the cursor, decoded from the directory key.
    pub fn quality(&self) -> Quality {
        Quality::from_raw(keylet::quality_from_key(&self.dir()))
    }

    /// Drop the cached entry so the next step does not consume it.
    ///
    /// Used when the caller already removed the offer from the view.
    pub fn clear_entry(&mut self) {
        self.entry = None;
    }

    /// Advance to the next book entry, consuming the previously yielded
    /// offer. Returns `false` when the book is exhausted.
    pub fn step(&mut self, view: &mut ApplyView) -> bool {
        if self.done {
            return false;
        }
        if self.entry.take().is_some() && view.exists(&self.index) {
            if let Err(code) = offer_delete(view, &self.index) {
                warn!("failed to consume offer {}: {}", self.index, code);
            }
        }
        loop {
            let dir = match self.dir {
                Some(dir) => dir,
                None => match view.succ(&self.book_base, &self.book_end) {
                    Some(dir) => {
                        self.dir = Some(dir);
                        dir
                    }
                    None => {
                        self.done = true;
                        return false;
                    }
                },
            };
            if let Some((_page, _pos, key)) = dir_first(&*view, &dir) {
                self.index = key;
                self.entry = view.read(&key).and_then(LedgerObject::into_offer);
                return true;
            }
            // quality bucket exhausted: advance the cursor past it
            match dir.next() {
                Some(next) => {
                    self.book_base = next;
                    self.dir = None;
                }
                None => {
                    self.done = true;
                    return false;
                }
            }
        }
    }
}
