// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::book_tip::BookTip;
use crate::offer::Offer;
use crate::step_counter::StepCounter;
use std::collections::BTreeSet;
use strand_ledger::view_ops::{account_funds, offer_delete, FreezeHandling};
use strand_ledger::ApplyView;
use strand_models::ledger::LedgerObject;
use strand_models::{Book, CurrencyValue, Key, Timestamp};
use tracing::{error, trace, warn};

/// What to do with offers found permanently unusable (expired, malformed,
/// never funded).
///
/// The plain stream removes them from the cancel view immediately; the
/// payment-flow stream defers removal into a pending set, applied only once
/// the surrounding computation commits, so a discarded computation does not
/// destroy state it may need to see again.
#[derive(Debug)]
pub enum RemovalPolicy {
    /// erase directly through the cancel view
    Immediate,
    /// record keys for removal after the surrounding computation commits
    Deferred(BTreeSet<Key>),
}

/// A stream of usable offers from one book, best quality first.
///
/// Each [`OfferStream::step`] yields the next unexpired, well-formed,
/// funded offer, permanently removing the ones that never can match and
/// self-healing directory entries whose ledger object is missing.
pub struct OfferStream<TIn, TOut> {
    book: Book,
    expire: Timestamp,
    tip: BookTip,
    counter: StepCounter,
    policy: RemovalPolicy,
    offer: Option<Offer<TIn, TOut>>,
    owner_funds: Option<TOut>,
}

impl<TIn: CurrencyValue, TOut: CurrencyValue> OfferStream<TIn, TOut> {
    /// Open a stream over `book`.
    ///
    /// `when` is the parent close time used for expiration checks;
    /// `counter` is the session's shared step budget.
    pub fn new(book: Book, when: Timestamp, counter: StepCounter, policy: RemovalPolicy) -> Self {
        OfferStream {
            tip: BookTip::new(&book),
            book,
            expire: when,
            counter,
            policy,
            offer: None,
            owner_funds: None,
        }
    }

    /// The book this stream reads.
    pub fn book(&self) -> &Book {
        &self.book
    }

    /// The current match candidate, after a successful step.
    pub fn tip(&self) -> Option<&Offer<TIn, TOut>> {
        self.offer.as_ref()
    }

    /// Mutable access to the current match candidate.
    pub fn tip_mut(&mut self) -> Option<&mut Offer<TIn, TOut>> {
        self.offer.as_mut()
    }

    /// Tell the underlying cursor the current offer is already gone from
    /// the view, so advancing must not try to consume it again.
    pub fn forget_current(&mut self) {
        self.tip.clear_entry();
    }

    /// The owner's spendable funds toward the current offer's output.
    pub fn owner_funds(&self) -> Option<&TOut> {
        self.owner_funds.as_ref()
    }

    /// The keys recorded for deferred removal, empty under the immediate
    /// policy.
    pub fn into_permanently_removed(self) -> BTreeSet<Key> {
        match self.policy {
            RemovalPolicy::Immediate => BTreeSet::new(),
            RemovalPolicy::Deferred(set) => set,
        }
    }

    fn perm_rm_offer(&mut self, cancel_view: &mut ApplyView, key: &Key) {
        match &mut self.policy {
            RemovalPolicy::Immediate => {
                if let Err(code) = offer_delete(cancel_view, key) {
                    warn!("failed to permanently remove offer {}: {}", key, code);
                }
            }
            RemovalPolicy::Deferred(set) => {
                set.insert(*key);
            }
        }
    }

    /// Remove a dangling directory index in place.
    ///
    /// NOTE: this should be using `dir_delete`, which would correctly
    /// unlink an emptied page. Unfortunately that is a compatibility
    /// breaking change, so only the index is taken out of its page.
    fn erase(view: &mut ApplyView, dir: &Key, index: &Key) {
        let Some(mut node) = view.peek(dir).and_then(LedgerObject::into_directory) else {
            error!("missing directory {} for offer {}", dir, index);
            return;
        };
        let Some(pos) = node.indexes.iter().position(|key| key == index) else {
            error!("missing offer {} for directory {}", index, dir);
            return;
        };
        node.indexes.remove(pos);
        view.update(*dir, LedgerObject::Directory(node));
        trace!("missing offer {} removed from directory {}", index, dir);
    }

    /// Advance to the next usable offer.
    ///
    /// Returns `false` when the book is exhausted or the step budget ran
    /// out; afterwards [`OfferStream::tip`] is the match candidate.
    pub fn step(&mut self, view: &mut ApplyView, cancel_view: &mut ApplyView) -> bool {
        // Modifying the order or logic of these operations is a
        // compatibility breaking change.
        loop {
            self.owner_funds = None;
            self.offer = None;

            // BookTip::step deletes the current offer from the view before
            // advancing to the next (unless the ledger entry is missing).
            if !self.tip.step(view) {
                return false;
            }

            // If we exceed the maximum number of allowed steps, we're done.
            if !self.counter.step() {
                return false;
            }

            let index = self.tip.index();
            let entry = match self.tip.entry() {
                Some(entry) => entry.clone(),
                None => {
                    // a directory entry with no backing ledger object
                    // shouldn't happen, but if it does we clean it up
                    let dir = self.tip.dir();
                    Self::erase(view, &dir, &index);
                    Self::erase(cancel_view, &dir, &index);
                    continue;
                }
            };

            // Remove if expired
            if let Some(expiration) = entry.expiration {
                if expiration <= self.expire {
                    trace!("removing expired offer {}", index);
                    self.perm_rm_offer(cancel_view, &index);
                    continue;
                }
            }

            let offer: Offer<TIn, TOut> = match Offer::from_entry(index, self.tip.quality(), entry) {
                Ok(offer) => offer,
                Err(err) => {
                    warn!("removing mistyped offer {}: {}", index, err);
                    self.perm_rm_offer(cancel_view, &index);
                    continue;
                }
            };

            // Remove if either amount is zero
            if offer.amounts().is_empty() {
                warn!("removing bad offer {}", index);
                self.perm_rm_offer(cancel_view, &index);
                continue;
            }

            // Calculate owner funds
            let default_amount = offer.amounts().output.to_amount(&offer.issue_out());
            let funds_amount = account_funds(
                &*view,
                &offer.owner(),
                &default_amount,
                FreezeHandling::ZeroIfFrozen,
            );
            let funds = match TOut::try_from_amount(&funds_amount) {
                Ok(funds) => funds,
                Err(err) => {
                    warn!("funds for offer {} do not project: {}", index, err);
                    self.perm_rm_offer(cancel_view, &index);
                    continue;
                }
            };

            // Check for unfunded offer
            if !funds.is_positive() {
                // If the owner's balance in the pristine view is the same,
                // we haven't modified the balance and therefore the offer
                // is "found unfunded" versus "became unfunded"
                let original_funds = account_funds(
                    &*cancel_view,
                    &offer.owner(),
                    &default_amount,
                    FreezeHandling::ZeroIfFrozen,
                );
                if original_funds == funds_amount {
                    self.perm_rm_offer(cancel_view, &index);
                    trace!("removing unfunded offer {}", index);
                } else {
                    trace!("removing became unfunded offer {}", index);
                }
                continue;
            }

            self.owner_funds = Some(funds);
            self.offer = Some(offer);
            return true;
        }
    }
}
