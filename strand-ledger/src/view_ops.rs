// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Ledger view operations: directory maintenance, offer removal, funds and
//! freeze queries, balance transfers.

use crate::apply_view::ApplyView;
use crate::view::ReadView;
use strand_models::constants::{DIR_NODE_MAX, DIR_PAGE_MAX};
use strand_models::keylet;
use strand_models::ledger::{
    DirectoryNode, LedgerObject, TrustLine, ACCOUNT_GLOBAL_FREEZE, LINE_FREEZE,
};
use strand_models::rate::PARITY_RATE;
use strand_models::{
    AccountId, Amount, Book, IssuedAmount, Issue, Key, NativeAmount, Rate, TransResult,
};
use tracing::{trace, warn};

/// How freeze state affects a funds query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreezeHandling {
    /// a frozen holding counts as zero funds
    ZeroIfFrozen,
    /// report the holding regardless of freeze state
    IgnoreFreeze,
}

/// Directory metadata setter for owner directories.
pub fn describe_owner_dir(owner: AccountId) -> impl FnOnce(&mut DirectoryNode) {
    move |node| node.owner = Some(owner)
}

/// Directory metadata setter for order-book directories.
pub fn describe_book_dir(book: Book) -> impl FnOnce(&mut DirectoryNode) {
    move |node| node.book = Some(book)
}

/// Append `entry` to the directory rooted at `root`, creating the root or a
/// new continuation page as needed. Returns the page number that received
/// the entry.
pub fn dir_add(
    view: &mut ApplyView,
    root: &Key,
    entry: Key,
    describe: impl FnOnce(&mut DirectoryNode),
) -> Result<u64, TransResult> {
    let root_key = keylet::page(root, 0);
    let mut root_node = match view.peek(&root_key).and_then(LedgerObject::into_directory) {
        None => {
            let mut node = DirectoryNode::new(*root);
            describe(&mut node);
            node.indexes.push(entry);
            view.insert(root_key, LedgerObject::Directory(node));
            return Ok(0);
        }
        Some(node) => node,
    };

    let last = root_node.index_previous;
    if last == 0 {
        if root_node.indexes.len() < DIR_NODE_MAX {
            root_node.indexes.push(entry);
            view.update(root_key, LedgerObject::Directory(root_node));
            return Ok(0);
        }
    } else {
        let last_key = keylet::page(root, last);
        let mut last_node = view
            .peek(&last_key)
            .and_then(LedgerObject::into_directory)
            .ok_or_else(|| {
                warn!("directory {} missing last page {}", root, last);
                TransResult::TefBadLedger
            })?;
        if last_node.indexes.len() < DIR_NODE_MAX {
            last_node.indexes.push(entry);
            view.update(last_key, LedgerObject::Directory(last_node));
            return Ok(last);
        }
    }

    // allocate a fresh page after the current last
    let new_page = last + 1;
    if new_page > DIR_PAGE_MAX {
        return Err(TransResult::TecDirFull);
    }
    let mut node = DirectoryNode::new(*root);
    node.owner = root_node.owner;
    node.book = root_node.book;
    node.index_previous = last;
    node.indexes.push(entry);
    view.insert(keylet::page(root, new_page), LedgerObject::Directory(node));

    if last == 0 {
        root_node.index_next = new_page;
    } else {
        let last_key = keylet::page(root, last);
        let mut last_node = view
            .peek(&last_key)
            .and_then(LedgerObject::into_directory)
            .ok_or(TransResult::TefBadLedger)?;
        last_node.index_next = new_page;
        view.update(last_key, LedgerObject::Directory(last_node));
    }
    root_node.index_previous = new_page;
    view.update(root_key, LedgerObject::Directory(root_node));
    Ok(new_page)
}

/// Remove `entry` from page `page_no` of the directory rooted at `root`.
///
/// A continuation page losing its last entry is unlinked from the chain and
/// erased. The root page is erased only once it is empty, has no further
/// pages, and `keep_root` is false.
pub fn dir_delete(
    view: &mut ApplyView,
    root: &Key,
    page_no: u64,
    entry: &Key,
    keep_root: bool,
) -> Result<(), TransResult> {
    let page_key = keylet::page(root, page_no);
    let mut node = view
        .peek(&page_key)
        .and_then(LedgerObject::into_directory)
        .ok_or_else(|| {
            warn!("missing directory page {} for entry {}", page_key, entry);
            TransResult::TefBadLedger
        })?;
    let pos = node.indexes.iter().position(|key| key == entry).ok_or_else(|| {
        warn!("missing entry {} in directory page {}", entry, page_key);
        TransResult::TefBadLedger
    })?;
    node.indexes.remove(pos);

    if !node.indexes.is_empty() {
        view.update(page_key, LedgerObject::Directory(node));
        return Ok(());
    }

    if page_no == 0 {
        if node.index_next == 0 && !keep_root {
            view.erase(&page_key);
        } else {
            view.update(page_key, LedgerObject::Directory(node));
        }
        return Ok(());
    }

    // unlink the empty continuation page
    let prev = node.index_previous;
    let next = node.index_next;
    view.erase(&page_key);

    let root_key = keylet::page(root, 0);
    if prev == 0 {
        let mut root_node = view
            .peek(&root_key)
            .and_then(LedgerObject::into_directory)
            .ok_or(TransResult::TefBadLedger)?;
        root_node.index_next = next;
        if next == 0 {
            root_node.index_previous = 0;
        }
        if next == 0 && root_node.indexes.is_empty() && !keep_root {
            view.erase(&root_key);
        } else {
            view.update(root_key, LedgerObject::Directory(root_node));
        }
    } else {
        let prev_key = keylet::page(root, prev);
        let mut prev_node = view
            .peek(&prev_key)
            .and_then(LedgerObject::into_directory)
            .ok_or(TransResult::TefBadLedger)?;
        prev_node.index_next = next;
        view.update(prev_key, LedgerObject::Directory(prev_node));
        if next == 0 {
            let mut root_node = view
                .peek(&root_key)
                .and_then(LedgerObject::into_directory)
                .ok_or(TransResult::TefBadLedger)?;
            root_node.index_previous = prev;
            view.update(root_key, LedgerObject::Directory(root_node));
        }
    }
    if next != 0 {
        let next_key = keylet::page(root, next);
        let mut next_node = view
            .peek(&next_key)
            .and_then(LedgerObject::into_directory)
            .ok_or(TransResult::TefBadLedger)?;
        next_node.index_previous = prev;
        view.update(next_key, LedgerObject::Directory(next_node));
    }
    Ok(())
}

/// Remove an offer from the ledger: both directory memberships, the owner
/// count, and the object itself.
pub fn offer_delete(view: &mut ApplyView, offer_key: &Key) -> Result<(), TransResult> {
    let offer = view
        .read(offer_key)
        .and_then(LedgerObject::into_offer)
        .ok_or_else(|| {
            warn!("offer {} missing at delete", offer_key);
            TransResult::TefInternal
        })?;
    dir_delete(view, &offer.book_directory, offer.book_node, offer_key, false)?;
    let owner_root = keylet::owner_dir(&offer.account);
    dir_delete(view, &owner_root, offer.owner_node, offer_key, true)?;
    adjust_owner_count(view, &offer.account, -1)?;
    view.erase(offer_key);
    trace!("removed offer {}", offer_key);
    Ok(())
}

/// Adjust an account's owned-object count.
pub fn adjust_owner_count(
    view: &mut ApplyView,
    owner: &AccountId,
    delta: i32,
) -> Result<(), TransResult> {
    let key = keylet::account(owner);
    let mut root = view
        .peek(&key)
        .and_then(LedgerObject::into_account)
        .ok_or_else(|| {
            warn!("missing account root for {}", owner);
            TransResult::TefInternal
        })?;
    root.owner_count = root.owner_count.saturating_add_signed(delta);
    view.update(key, LedgerObject::Account(root));
    Ok(())
}

/// Returns `true` if the issuer froze all its obligations, or this holder's
/// line specifically.
pub fn is_frozen(view: &dyn ReadView, account: &AccountId, issue: &Issue) -> bool {
    if issue.is_native() {
        return false;
    }
    if let Some(root) = view
        .read(&keylet::account(&issue.issuer))
        .and_then(LedgerObject::into_account)
    {
        if root.flags & ACCOUNT_GLOBAL_FREEZE != 0 {
            return true;
        }
    }
    view.read(&keylet::line(account, issue))
        .and_then(LedgerObject::into_line)
        .map(|line| line.flags & LINE_FREEZE != 0)
        .unwrap_or(false)
}

/// The amount of `issue` the account holds and can spend.
///
/// For the native asset this is the balance above the account's reserve,
/// floored at zero. For issued currencies it is the trust line balance,
/// zeroed when frozen and the query says so.
pub fn account_holds(
    view: &dyn ReadView,
    account: &AccountId,
    issue: &Issue,
    freeze: FreezeHandling,
) -> Amount {
    if issue.is_native() {
        let Some(root) = view
            .read(&keylet::account(account))
            .and_then(LedgerObject::into_account)
        else {
            return Amount::native_zero();
        };
        let reserve = view.fees().account_reserve(root.owner_count);
        let available = root.balance.saturating_sub(reserve);
        return Amount::Native(if available.is_negative() {
            NativeAmount::zero()
        } else {
            available
        });
    }
    if matches!(freeze, FreezeHandling::ZeroIfFrozen) && is_frozen(view, account, issue) {
        return Amount::Issued(IssuedAmount::zero(), *issue);
    }
    match view
        .read(&keylet::line(account, issue))
        .and_then(LedgerObject::into_line)
    {
        Some(line) => Amount::Issued(line.balance, *issue),
        None => Amount::Issued(IssuedAmount::zero(), *issue),
    }
}

/// The funds an account can deliver against `default`.
///
/// An issuer is always good for its own obligations up to the requested
/// amount; anyone else is limited to their actual holding.
pub fn account_funds(
    view: &dyn ReadView,
    account: &AccountId,
    default: &Amount,
    freeze: FreezeHandling,
) -> Amount {
    if !default.is_native() && default.issue().issuer == *account {
        // self funded
        *default
    } else {
        account_holds(view, account, &default.issue(), freeze)
    }
}

/// The transfer rate charged by an issuer, parity when unset.
pub fn transfer_rate(view: &dyn ReadView, issuer: &AccountId) -> Rate {
    if *issuer == AccountId::ZERO {
        return PARITY_RATE;
    }
    view.read(&keylet::account(issuer))
        .and_then(LedgerObject::into_account)
        .and_then(|root| root.transfer_rate)
        .unwrap_or(PARITY_RATE)
}

fn line_credit(
    view: &mut ApplyView,
    holder: &AccountId,
    issue: &Issue,
    delta: &IssuedAmount,
) -> Result<(), TransResult> {
    let key = keylet::line(holder, issue);
    match view.peek(&key).and_then(LedgerObject::into_line) {
        Some(mut line) => {
            line.balance = line
                .balance
                .checked_add(delta)
                .map_err(|_| TransResult::TefInternal)?;
            view.update(key, LedgerObject::Line(line));
        }
        None => {
            view.insert(
                key,
                LedgerObject::Line(TrustLine {
                    account: *holder,
                    issue: *issue,
                    balance: *delta,
                    flags: 0,
                }),
            );
        }
    }
    Ok(())
}

/// Move `amount` from one account to another.
///
/// Native transfers move account balances; issued transfers adjust the
/// endpoint trust lines, with the issuer itself carrying no line. Funding
/// checks belong to the caller.
pub fn account_send(
    view: &mut ApplyView,
    from: &AccountId,
    to: &AccountId,
    amount: &Amount,
) -> Result<(), TransResult> {
    if amount.is_zero() {
        return Ok(());
    }
    match amount {
        Amount::Native(value) => {
            let from_key = keylet::account(from);
            let mut from_root = view
                .peek(&from_key)
                .and_then(LedgerObject::into_account)
                .ok_or(TransResult::TerNoAccount)?;
            from_root.balance = from_root
                .balance
                .checked_sub(*value)
                .ok_or(TransResult::TecUnfundedPayment)?;
            view.update(from_key, LedgerObject::Account(from_root));

            let to_key = keylet::account(to);
            let mut to_root = view
                .peek(&to_key)
                .and_then(LedgerObject::into_account)
                .ok_or(TransResult::TecNoDst)?;
            to_root.balance = to_root
                .balance
                .checked_add(*value)
                .ok_or(TransResult::TefInternal)?;
            view.update(to_key, LedgerObject::Account(to_root));
        }
        Amount::Issued(value, issue) => {
            if *from != issue.issuer {
                line_credit(view, from, issue, &value.negated())?;
            }
            if *to != issue.issuer {
                line_credit(view, to, issue, value)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::dir::{dir_first, Dir};
    use crate::final_ledger::FinalLedger;
    use strand_models::ledger::AccountRoot;
    use strand_models::Currency;

    fn empty_ledger() -> FinalLedger {
        FinalLedger::new(LedgerConfig::default())
    }

    fn entry_key(n: u8) -> Key {
        Key::compute_from(&[b'e', n])
    }

    #[test]
    fn test_dir_add_links_pages_and_iterates_in_order() {
        let ledger = empty_ledger();
        let mut view = ApplyView::new(&ledger);
        let owner = AccountId::from_bytes(&[1u8; 32]);
        let root = keylet::owner_dir(&owner);

        let mut expected = Vec::new();
        for n in 0..(DIR_NODE_MAX as u8 + 3) {
            let key = entry_key(n);
            let page = dir_add(&mut view, &root, key, describe_owner_dir(owner)).unwrap();
            assert_eq!(page, if (n as usize) < DIR_NODE_MAX { 0 } else { 1 });
            expected.push(key);
        }

        let collected: Vec<Key> = Dir::new(&view, root).iter().collect();
        assert_eq!(collected, expected);
    }

    #[test]
    fn test_dir_delete_unlinks_empty_middle_page() {
        let ledger = empty_ledger();
        let mut view = ApplyView::new(&ledger);
        let owner = AccountId::from_bytes(&[2u8; 32]);
        let root = keylet::owner_dir(&owner);

        // fill root and page 1, then start page 2
        let total = DIR_NODE_MAX * 2 + 1;
        let keys: Vec<Key> = (0..total as u8).map(entry_key).collect();
        for key in &keys {
            dir_add(&mut view, &root, *key, describe_owner_dir(owner)).unwrap();
        }
        // empty page 1 entirely
        for key in &keys[DIR_NODE_MAX..DIR_NODE_MAX * 2] {
            dir_delete(&mut view, &root, 1, key, true).unwrap();
        }
        assert!(!view.exists(&keylet::page(&root, 1)));
        let collected: Vec<Key> = Dir::new(&view, root).iter().collect();
        let mut expected: Vec<Key> = keys[..DIR_NODE_MAX].to_vec();
        expected.extend_from_slice(&keys[DIR_NODE_MAX * 2..]);
        assert_eq!(collected, expected);
        // the chain now runs root -> page 2
        let root_node = view
            .read(&keylet::page(&root, 0))
            .unwrap()
            .into_directory()
            .unwrap();
        assert_eq!(root_node.index_next, 2);
        assert_eq!(root_node.index_previous, 2);
    }

    #[test]
    fn test_dir_delete_erases_empty_unkept_root() {
        let ledger = empty_ledger();
        let mut view = ApplyView::new(&ledger);
        let root = Key::compute_from(b"book dir");
        let key = entry_key(1);
        dir_add(&mut view, &root, key, |_| {}).unwrap();
        dir_delete(&mut view, &root, 0, &key, false).unwrap();
        assert!(!view.exists(&root));
        assert!(dir_first(&view, &root).is_none());
    }

    #[test]
    fn test_account_holds_native_respects_reserve() {
        let mut ledger = empty_ledger();
        let alice = AccountId::from_bytes(&[3u8; 32]);
        let mut root = AccountRoot::new(alice, NativeAmount::from_drops(25_000_000));
        root.owner_count = 1;
        ledger.put(keylet::account(&alice), LedgerObject::Account(root));

        // reserve for one owned object is 25, leaving nothing
        let held = account_holds(
            &ledger,
            &alice,
            &Issue::native(),
            FreezeHandling::ZeroIfFrozen,
        );
        assert!(held.is_zero());
    }

    #[test]
    fn test_account_funds_issuer_self_funded() {
        let ledger = empty_ledger();
        let issuer = AccountId::from_bytes(&[4u8; 32]);
        let issue = Issue::new(Currency::from_code("USD").unwrap(), issuer);
        let want = Amount::Issued(IssuedAmount::new(50, 0).unwrap(), issue);
        let funds = account_funds(&ledger, &issuer, &want, FreezeHandling::ZeroIfFrozen);
        assert_eq!(funds, want);
        // a non-issuer with no line has nothing
        let other = AccountId::from_bytes(&[5u8; 32]);
        let funds = account_funds(&ledger, &other, &want, FreezeHandling::ZeroIfFrozen);
        assert!(funds.is_zero());
    }

    #[test]
    fn test_frozen_line_counts_as_zero() {
        let mut ledger = empty_ledger();
        let issuer = AccountId::from_bytes(&[6u8; 32]);
        let holder = AccountId::from_bytes(&[7u8; 32]);
        let issue = Issue::new(Currency::from_code("EUR").unwrap(), issuer);
        ledger.put(
            keylet::line(&holder, &issue),
            LedgerObject::Line(TrustLine {
                account: holder,
                issue,
                balance: IssuedAmount::new(9, 0).unwrap(),
                flags: LINE_FREEZE,
            }),
        );
        let held = account_holds(&ledger, &holder, &issue, FreezeHandling::ZeroIfFrozen);
        assert!(held.is_zero());
        let held = account_holds(&ledger, &holder, &issue, FreezeHandling::IgnoreFreeze);
        assert!(held.is_positive());
    }

    #[test]
    fn test_account_send_issued_moves_lines() {
        let mut ledger = empty_ledger();
        let issuer = AccountId::from_bytes(&[8u8; 32]);
        let alice = AccountId::from_bytes(&[9u8; 32]);
        let bob = AccountId::from_bytes(&[10u8; 32]);
        let issue = Issue::new(Currency::from_code("USD").unwrap(), issuer);
        ledger.put(
            keylet::line(&alice, &issue),
            LedgerObject::Line(TrustLine {
                account: alice,
                issue,
                balance: IssuedAmount::new(10, 0).unwrap(),
                flags: 0,
            }),
        );
        let mut view = ApplyView::new(&ledger);
        let amount = Amount::Issued(IssuedAmount::new(4, 0).unwrap(), issue);
        account_send(&mut view, &alice, &bob, &amount).unwrap();

        let alice_line = view
            .read(&keylet::line(&alice, &issue))
            .unwrap()
            .into_line()
            .unwrap();
        assert_eq!(alice_line.balance, IssuedAmount::new(6, 0).unwrap());
        let bob_line = view
            .read(&keylet::line(&bob, &issue))
            .unwrap()
            .into_line()
            .unwrap();
        assert_eq!(bob_line.balance, IssuedAmount::new(4, 0).unwrap());
    }
}
