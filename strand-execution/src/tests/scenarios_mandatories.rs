// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::flow::cross;
use crate::offer_stream::{OfferStream, RemovalPolicy};
use crate::paychan::serialize_paychan_authorization;
use crate::settings::Rules;
use crate::step_counter::StepCounter;
use crate::tests::universe::*;
use crate::transactor::{apply_transaction, ApplyResult};
use assert_matches::assert_matches;
use std::collections::BTreeSet;
use strand_ledger::{ApplyView, Dir, FinalLedger, ReadView};
use strand_models::keylet;
use strand_models::ledger::LedgerObject;
use strand_models::transaction::{
    ChannelClaimTx, ChannelCreateTx, ChannelFundTx, OfferCancelTx, Transaction, TxKind, TF_CLOSE,
    TF_RENEW,
};
use strand_models::{
    Amount, Amounts, Book, Issue, IssuedAmount, Key, NativeAmount, Timestamp, TransResult,
};

const FUNDED: i64 = 100_000_000;
const FEE: i64 = 10;

fn apply_to_ledger(ledger: &mut FinalLedger, tx: &Transaction) -> ApplyResult {
    let rules = Rules::default();
    let (result, changes) = {
        let mut view = ApplyView::new(ledger);
        let result = apply_transaction(&mut view, tx, &rules);
        (result, view.into_changes())
    };
    ledger.apply_changes(changes);
    result
}

fn claim_auth(
    channel_keypair: &strand_signature::KeyPair,
    channel: &Key,
    drops: u64,
) -> (
    Option<strand_signature::Signature>,
    Option<strand_signature::PublicKey>,
) {
    let msg = serialize_paychan_authorization(channel, drops);
    (
        Some(channel_keypair.sign(&msg).unwrap()),
        Some(channel_keypair.public_key()),
    )
}

// --- payment channels -------------------------------------------------------

#[test]
fn test_channel_create_claim_close_scenario() {
    let alice = account(1);
    let bob = account(2);
    let channel_kp = keypair(9);
    let mut ledger = ledger_with_accounts(&[(alice, FUNDED), (bob, FUNDED)]);
    ledger.set_close_time(Timestamp::from_secs(1_000));

    // create a channel with amount 100 and settle delay 60
    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(1),
            1,
            0,
            TxKind::ChannelCreate(ChannelCreateTx {
                destination: bob,
                amount: NativeAmount::from_drops(100),
                settle_delay: 60,
                public_key: channel_kp.public_key(),
                cancel_after: None,
                destination_tag: None,
            }),
        ),
    );
    assert_eq!(result.result, TransResult::TesSuccess);
    let channel_key = keylet::channel(&alice, &bob, 1);
    let channel = ledger
        .read(&channel_key)
        .unwrap()
        .into_channel()
        .unwrap();
    assert_eq!(channel.amount, NativeAmount::from_drops(100));
    assert!(channel.balance.is_zero());
    assert_eq!(balance_of(&ledger, &alice), FUNDED - FEE - 100);

    // a correctly signed claim for 40 pays the destination
    let (signature, public_key) = claim_auth(&channel_kp, &channel_key, 40);
    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(2),
            1,
            0,
            TxKind::ChannelClaim(ChannelClaimTx {
                channel: channel_key,
                balance: Some(NativeAmount::from_drops(40)),
                amount: None,
                signature,
                public_key,
            }),
        ),
    );
    assert_eq!(result.result, TransResult::TesSuccess);
    assert_eq!(balance_of(&ledger, &bob), FUNDED - FEE + 40);
    let channel = ledger
        .read(&channel_key)
        .unwrap()
        .into_channel()
        .unwrap();
    assert_eq!(channel.balance, NativeAmount::from_drops(40));

    // the claimed balance can never move backward
    let (signature, public_key) = claim_auth(&channel_kp, &channel_key, 30);
    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(2),
            2,
            0,
            TxKind::ChannelClaim(ChannelClaimTx {
                channel: channel_key,
                balance: Some(NativeAmount::from_drops(30)),
                amount: None,
                signature,
                public_key,
            }),
        ),
    );
    assert_eq!(result.result, TransResult::TecUnfundedPayment);
    assert!(result.applied);
    let channel = ledger
        .read(&channel_key)
        .unwrap()
        .into_channel()
        .unwrap();
    assert_eq!(channel.balance, NativeAmount::from_drops(40));

    // the destination may close immediately; the unclaimed 60 returns to
    // the owner
    let alice_before = balance_of(&ledger, &alice);
    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(2),
            3,
            TF_CLOSE,
            TxKind::ChannelClaim(ChannelClaimTx {
                channel: channel_key,
                balance: None,
                amount: None,
                signature: None,
                public_key: None,
            }),
        ),
    );
    assert_eq!(result.result, TransResult::TesSuccess);
    assert!(!ledger.exists(&channel_key));
    assert_eq!(balance_of(&ledger, &alice), alice_before + 60);
    let root = ledger
        .read(&keylet::account(&alice))
        .unwrap()
        .into_account()
        .unwrap();
    assert_eq!(root.owner_count, 0);
}

#[test]
fn test_channel_claim_rejects_wrong_signer_and_destination_without_auth() {
    let alice = account(1);
    let bob = account(2);
    let channel_kp = keypair(9);
    let mut ledger = ledger_with_accounts(&[(alice, FUNDED), (bob, FUNDED)]);
    ledger.set_close_time(Timestamp::from_secs(1_000));
    apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(1),
            1,
            0,
            TxKind::ChannelCreate(ChannelCreateTx {
                destination: bob,
                amount: NativeAmount::from_drops(100),
                settle_delay: 60,
                public_key: channel_kp.public_key(),
                cancel_after: None,
                destination_tag: None,
            }),
        ),
    );
    let channel_key = keylet::channel(&alice, &bob, 1);

    // a claim authorized by a key other than the channel's is refused
    let impostor = keypair(8);
    let (signature, public_key) = claim_auth(&impostor, &channel_key, 40);
    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(2),
            1,
            0,
            TxKind::ChannelClaim(ChannelClaimTx {
                channel: channel_key,
                balance: Some(NativeAmount::from_drops(40)),
                amount: None,
                signature,
                public_key,
            }),
        ),
    );
    assert_eq!(result.result, TransResult::TemBadSigner);
    assert!(!result.applied);

    // the destination cannot claim a balance without an authorization
    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(2),
            1,
            0,
            TxKind::ChannelClaim(ChannelClaimTx {
                channel: channel_key,
                balance: Some(NativeAmount::from_drops(40)),
                amount: None,
                signature: None,
                public_key: None,
            }),
        ),
    );
    assert_eq!(result.result, TransResult::TemBadSignature);
    assert!(!result.applied);
}

#[test]
fn test_channel_fund_bounds_expiration_by_settle_delay() {
    let alice = account(1);
    let bob = account(2);
    let mut ledger = ledger_with_accounts(&[(alice, FUNDED), (bob, FUNDED)]);
    ledger.set_close_time(Timestamp::from_secs(1_000));
    apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(1),
            1,
            0,
            TxKind::ChannelCreate(ChannelCreateTx {
                destination: bob,
                amount: NativeAmount::from_drops(100),
                settle_delay: 60,
                public_key: keypair(9).public_key(),
                cancel_after: None,
                destination_tag: None,
            }),
        ),
    );
    let channel_key = keylet::channel(&alice, &bob, 1);
    let alice_after_create = balance_of(&ledger, &alice);

    // an expiration below close time + settle delay cannot be set
    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(1),
            2,
            0,
            TxKind::ChannelFund(ChannelFundTx {
                channel: channel_key,
                amount: NativeAmount::from_drops(50),
                expiration: Some(Timestamp::from_secs(1_059)),
            }),
        ),
    );
    assert_eq!(result.result, TransResult::TemBadExpiration);
    assert!(!result.applied);
    // malformed outcomes leave even the fee untouched
    assert_eq!(balance_of(&ledger, &alice), alice_after_create);

    // the settle-delay floor itself is acceptable
    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(1),
            2,
            0,
            TxKind::ChannelFund(ChannelFundTx {
                channel: channel_key,
                amount: NativeAmount::from_drops(50),
                expiration: Some(Timestamp::from_secs(1_060)),
            }),
        ),
    );
    assert_eq!(result.result, TransResult::TesSuccess);
    let channel = ledger
        .read(&channel_key)
        .unwrap()
        .into_channel()
        .unwrap();
    assert_eq!(channel.amount, NativeAmount::from_drops(150));
    assert_eq!(channel.expiration, Some(Timestamp::from_secs(1_060)));
    assert_eq!(balance_of(&ledger, &alice), alice_after_create - FEE - 50);

    // only the owner may fund
    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(2),
            1,
            0,
            TxKind::ChannelFund(ChannelFundTx {
                channel: channel_key,
                amount: NativeAmount::from_drops(50),
                expiration: None,
            }),
        ),
    );
    assert_eq!(result.result, TransResult::TecNoPermission);
    assert!(result.applied);
}

#[test]
fn test_channel_touch_past_cancel_after_closes() {
    let alice = account(1);
    let bob = account(2);
    let mut ledger = ledger_with_accounts(&[(alice, FUNDED), (bob, FUNDED)]);
    ledger.set_close_time(Timestamp::from_secs(400));
    apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(1),
            1,
            0,
            TxKind::ChannelCreate(ChannelCreateTx {
                destination: bob,
                amount: NativeAmount::from_drops(100),
                settle_delay: 60,
                public_key: keypair(9).public_key(),
                cancel_after: Some(Timestamp::from_secs(500)),
                destination_tag: None,
            }),
        ),
    );
    let channel_key = keylet::channel(&alice, &bob, 1);
    let alice_after_create = balance_of(&ledger, &alice);

    // any channel transaction after cancel-after closes instead of acting
    ledger.set_close_time(Timestamp::from_secs(600));
    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(1),
            2,
            0,
            TxKind::ChannelFund(ChannelFundTx {
                channel: channel_key,
                amount: NativeAmount::from_drops(50),
                expiration: None,
            }),
        ),
    );
    assert_eq!(result.result, TransResult::TesSuccess);
    assert!(!ledger.exists(&channel_key));
    // the sequestered 100 came back; the 50 top-up never happened
    assert_eq!(balance_of(&ledger, &alice), alice_after_create - FEE + 100);
}

#[test]
fn test_channel_claim_renew_is_owner_only() {
    let alice = account(1);
    let bob = account(2);
    let mut ledger = ledger_with_accounts(&[(alice, FUNDED), (bob, FUNDED)]);
    ledger.set_close_time(Timestamp::from_secs(1_000));
    apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(1),
            1,
            0,
            TxKind::ChannelCreate(ChannelCreateTx {
                destination: bob,
                amount: NativeAmount::from_drops(100),
                settle_delay: 60,
                public_key: keypair(9).public_key(),
                cancel_after: None,
                destination_tag: None,
            }),
        ),
    );
    let channel_key = keylet::channel(&alice, &bob, 1);

    // the owner requests close: expiration is scheduled, not immediate
    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(1),
            2,
            TF_CLOSE,
            TxKind::ChannelClaim(ChannelClaimTx {
                channel: channel_key,
                balance: None,
                amount: None,
                signature: None,
                public_key: None,
            }),
        ),
    );
    assert_eq!(result.result, TransResult::TesSuccess);
    let channel = ledger
        .read(&channel_key)
        .unwrap()
        .into_channel()
        .unwrap();
    assert_eq!(channel.expiration, Some(Timestamp::from_secs(1_060)));

    // the destination cannot renew the expiration away
    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(2),
            1,
            TF_RENEW,
            TxKind::ChannelClaim(ChannelClaimTx {
                channel: channel_key,
                balance: None,
                amount: None,
                signature: None,
                public_key: None,
            }),
        ),
    );
    assert_eq!(result.result, TransResult::TecNoPermission);

    // the owner can
    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(1),
            3,
            TF_RENEW,
            TxKind::ChannelClaim(ChannelClaimTx {
                channel: channel_key,
                balance: None,
                amount: None,
                signature: None,
                public_key: None,
            }),
        ),
    );
    assert_eq!(result.result, TransResult::TesSuccess);
    let channel = ledger
        .read(&channel_key)
        .unwrap()
        .into_channel()
        .unwrap();
    assert_eq!(channel.expiration, None);
}

// --- offer cancellation -----------------------------------------------------

#[test]
fn test_cancel_missing_offer_is_idempotent_success() {
    let alice = account(1);
    let mut ledger = ledger_with_accounts(&[(alice, FUNDED)]);
    set_sequence(&mut ledger, &alice, 5);
    let objects_before = ledger.len();

    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(1),
            5,
            0,
            TxKind::OfferCancel(OfferCancelTx { offer_sequence: 2 }),
        ),
    );
    assert_eq!(result.result, TransResult::TesSuccess);
    assert!(result.applied);
    // no object appeared or vanished; only the account root moved
    assert_eq!(ledger.len(), objects_before);
    assert_eq!(balance_of(&ledger, &alice), FUNDED - FEE);
}

#[test]
fn test_cancel_existing_offer_removes_it_and_its_directories() {
    let alice = account(1);
    let mut ledger = ledger_with_accounts(&[(alice, FUNDED)]);
    set_sequence(&mut ledger, &alice, 5);
    let offer_key = place_offer(
        &mut ledger,
        &alice,
        Amount::from_drops(100),
        Amount::Issued(IssuedAmount::new(100, 0).unwrap(), usd_of(3)),
        2,
        None,
    );
    let book_dir = ledger
        .read(&offer_key)
        .unwrap()
        .into_offer()
        .unwrap()
        .book_directory;

    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(1),
            5,
            0,
            TxKind::OfferCancel(OfferCancelTx { offer_sequence: 2 }),
        ),
    );
    assert_eq!(result.result, TransResult::TesSuccess);
    assert!(!ledger.exists(&offer_key));
    // the emptied book directory is gone, the owner directory root stays
    assert!(!ledger.exists(&book_dir));
    assert!(ledger.exists(&keylet::owner_dir(&alice)));
    let root = ledger
        .read(&keylet::account(&alice))
        .unwrap()
        .into_account()
        .unwrap();
    assert_eq!(root.owner_count, 0);
}

#[test]
fn test_cancel_preflight_and_preclaim_reject_malformed() {
    let alice = account(1);
    let mut ledger = ledger_with_accounts(&[(alice, FUNDED)]);
    set_sequence(&mut ledger, &alice, 5);

    // zero offer sequence never passes preflight
    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(1),
            5,
            0,
            TxKind::OfferCancel(OfferCancelTx { offer_sequence: 0 }),
        ),
    );
    assert_eq!(result.result, TransResult::TemBadSequence);

    // stray flags never pass preflight
    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(1),
            5,
            0x0000_0001,
            TxKind::OfferCancel(OfferCancelTx { offer_sequence: 2 }),
        ),
    );
    assert_eq!(result.result, TransResult::TemInvalidFlag);

    // a sequence the account has not consumed yet is rejected in preclaim
    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(1),
            5,
            0,
            TxKind::OfferCancel(OfferCancelTx { offer_sequence: 9 }),
        ),
    );
    assert_eq!(result.result, TransResult::TemBadSequence);
    assert_eq!(balance_of(&ledger, &alice), FUNDED);
}

#[test]
fn test_tampered_signature_and_foreign_key_are_rejected() {
    let alice = account(1);
    let mut ledger = ledger_with_accounts(&[(alice, FUNDED)]);
    set_sequence(&mut ledger, &alice, 5);

    let mut tx = signed_tx(
        &keypair(1),
        5,
        0,
        TxKind::OfferCancel(OfferCancelTx { offer_sequence: 2 }),
    );
    tx.kind = TxKind::OfferCancel(OfferCancelTx { offer_sequence: 3 });
    let result = apply_to_ledger(&mut ledger, &tx);
    assert_eq!(result.result, TransResult::TemBadSignature);

    // a valid signature by a key that does not own the account
    let mut tx = signed_tx(
        &keypair(2),
        5,
        0,
        TxKind::OfferCancel(OfferCancelTx { offer_sequence: 2 }),
    );
    tx.common.account = alice;
    tx.common.signature = keypair(2).sign(&tx.signing_bytes()).unwrap();
    let result = apply_to_ledger(&mut ledger, &tx);
    assert_eq!(result.result, TransResult::TefBadAuth);
}

// --- offer stream -----------------------------------------------------------

fn stream_over(book: Book, when: u64, budget: u32) -> OfferStream<Amount, Amount> {
    OfferStream::new(
        book,
        Timestamp::from_secs(when),
        StepCounter::new(budget),
        RemovalPolicy::Immediate,
    )
}

#[test]
fn test_offer_stream_removes_zero_output_offer_as_malformed() {
    let alice = account(1);
    let mut ledger = ledger_with_accounts(&[(alice, FUNDED)]);
    let usd = usd_of(3);
    let offer_key = place_offer(
        &mut ledger,
        &alice,
        Amount::from_drops(100),
        Amount::Issued(IssuedAmount::zero(), usd),
        2,
        None,
    );

    let book = Book::new(Issue::native(), usd);
    let mut view = ApplyView::new(&ledger);
    let mut cancel_view = ApplyView::new(&ledger);
    let mut stream = stream_over(book, 1_000, 10);
    assert!(!stream.step(&mut view, &mut cancel_view));
    // permanently removed from both views on the first step
    assert!(!view.exists(&offer_key));
    assert!(!cancel_view.exists(&offer_key));
}

#[test]
fn test_offer_stream_removes_expired_offer() {
    let alice = account(1);
    let mut ledger = ledger_with_accounts(&[(alice, FUNDED)]);
    let usd = usd_of(3);
    set_line(&mut ledger, &alice, usd, IssuedAmount::new(100, 0).unwrap());
    let expired = place_offer(
        &mut ledger,
        &alice,
        Amount::from_drops(100),
        Amount::Issued(IssuedAmount::new(100, 0).unwrap(), usd),
        2,
        Some(Timestamp::from_secs(900)),
    );
    let live = place_offer(
        &mut ledger,
        &alice,
        Amount::from_drops(100),
        Amount::Issued(IssuedAmount::new(50, 0).unwrap(), usd),
        3,
        Some(Timestamp::from_secs(2_000)),
    );

    let book = Book::new(Issue::native(), usd);
    let mut view = ApplyView::new(&ledger);
    let mut cancel_view = ApplyView::new(&ledger);
    let mut stream = stream_over(book, 1_000, 10);
    assert!(stream.step(&mut view, &mut cancel_view));
    assert_eq!(stream.tip().unwrap().key(), live);
    assert!(!view.exists(&expired));
    assert!(!cancel_view.exists(&expired));
}

#[test]
fn test_offer_stream_never_funded_vs_became_unfunded() {
    let alice = account(1);
    let bob = account(2);
    let usd = usd_of(3);
    let mut ledger = ledger_with_accounts(&[(alice, FUNDED), (bob, FUNDED)]);
    // alice was never funded; bob holds 100 USD in the base ledger
    set_line(&mut ledger, &bob, usd, IssuedAmount::new(100, 0).unwrap());
    let never_funded = place_offer(
        &mut ledger,
        &alice,
        Amount::from_drops(100),
        Amount::Issued(IssuedAmount::new(100, 0).unwrap(), usd),
        2,
        None,
    );
    let became_unfunded = place_offer(
        &mut ledger,
        &bob,
        Amount::from_drops(100),
        Amount::Issued(IssuedAmount::new(100, 0).unwrap(), usd),
        2,
        None,
    );

    let mut view = ApplyView::new(&ledger);
    let mut cancel_view = ApplyView::new(&ledger);
    // drain bob's holding in the live view only, as an earlier step of the
    // same session would
    {
        let line_key = keylet::line(&bob, &usd);
        let mut line = view.peek(&line_key).unwrap().into_line().unwrap();
        line.balance = IssuedAmount::zero();
        view.update(line_key, LedgerObject::Line(line));
    }

    let book = Book::new(Issue::native(), usd);
    let mut stream = stream_over(book, 1_000, 10);
    assert!(!stream.step(&mut view, &mut cancel_view));

    // never funded: removed from the baseline too
    assert!(!cancel_view.exists(&never_funded));
    // became unfunded: only the live view loses it, the baseline keeps it
    // in case the surrounding computation is discarded
    assert!(!view.exists(&became_unfunded));
    assert!(cancel_view.exists(&became_unfunded));
}

#[test]
fn test_offer_stream_repairs_dangling_directory_entry() {
    let alice = account(1);
    let usd = usd_of(3);
    let mut ledger = ledger_with_accounts(&[(alice, FUNDED)]);
    let offer_key = place_offer(
        &mut ledger,
        &alice,
        Amount::from_drops(100),
        Amount::Issued(IssuedAmount::new(100, 0).unwrap(), usd),
        2,
        None,
    );
    let book_dir = ledger
        .read(&offer_key)
        .unwrap()
        .into_offer()
        .unwrap()
        .book_directory;
    // the object vanishes but its directory entry stays behind
    remove_object(&mut ledger, &offer_key);

    let book = Book::new(Issue::native(), usd);
    let mut view = ApplyView::new(&ledger);
    let mut cancel_view = ApplyView::new(&ledger);
    let mut stream = stream_over(book, 1_000, 10);
    // the scan self-heals and reports no match rather than failing
    assert!(!stream.step(&mut view, &mut cancel_view));

    // the dangling index is gone from both views when iterating from root
    assert_eq!(Dir::new(&view, book_dir).iter().count(), 0);
    assert_eq!(Dir::new(&cancel_view, book_dir).iter().count(), 0);
}

#[test]
fn test_offer_stream_respects_step_budget() {
    let alice = account(1);
    let usd = usd_of(3);
    let mut ledger = ledger_with_accounts(&[(alice, FUNDED)]);
    set_line(&mut ledger, &alice, usd, IssuedAmount::new(1_000, 0).unwrap());
    for sequence in 2..5 {
        place_offer(
            &mut ledger,
            &alice,
            Amount::from_drops(100),
            Amount::Issued(IssuedAmount::new(100, 0).unwrap(), usd),
            sequence,
            None,
        );
    }

    let book = Book::new(Issue::native(), usd);
    let mut view = ApplyView::new(&ledger);
    let mut cancel_view = ApplyView::new(&ledger);
    let counter = StepCounter::new(2);
    let mut stream: OfferStream<Amount, Amount> = OfferStream::new(
        book,
        Timestamp::from_secs(1_000),
        counter.clone(),
        RemovalPolicy::Immediate,
    );
    assert!(stream.step(&mut view, &mut cancel_view));
    assert!(stream.step(&mut view, &mut cancel_view));
    // the shared budget cuts the session off
    assert!(!stream.step(&mut view, &mut cancel_view));
    assert_eq!(counter.remaining(), 0);
    // the third offer was never examined and is still in the book
    assert!(view.exists(&keylet::offer(&alice, 4)));
}

#[test]
fn test_offer_stream_monomorphized_over_native_issued_pair() {
    let alice = account(1);
    let usd = usd_of(3);
    let mut ledger = ledger_with_accounts(&[(alice, FUNDED)]);
    set_line(&mut ledger, &alice, usd, IssuedAmount::new(100, 0).unwrap());
    place_offer(
        &mut ledger,
        &alice,
        Amount::from_drops(200),
        Amount::Issued(IssuedAmount::new(100, 0).unwrap(), usd),
        2,
        None,
    );

    let book = Book::new(Issue::native(), usd);
    let mut view = ApplyView::new(&ledger);
    let mut cancel_view = ApplyView::new(&ledger);
    let mut stream: OfferStream<NativeAmount, IssuedAmount> = OfferStream::new(
        book,
        Timestamp::from_secs(1_000),
        StepCounter::new(10),
        RemovalPolicy::Immediate,
    );
    assert!(stream.step(&mut view, &mut cancel_view));
    let offer = stream.tip().unwrap();
    assert_eq!(offer.amounts().input, NativeAmount::from_drops(200));
    assert_eq!(offer.amounts().output, IssuedAmount::new(100, 0).unwrap());
    assert_eq!(stream.owner_funds(), Some(&IssuedAmount::new(100, 0).unwrap()));
}

// --- crossing ---------------------------------------------------------------

#[test]
fn test_cross_partial_fill_reduces_offer_monotonically() {
    let alice = account(1);
    let bob = account(2);
    let usd = usd_of(3);
    let mut ledger = ledger_with_accounts(&[(alice, FUNDED), (bob, FUNDED)]);
    ledger.set_close_time(Timestamp::from_secs(1_000));
    set_line(&mut ledger, &alice, usd, IssuedAmount::new(100, 0).unwrap());
    let offer_key = place_offer(
        &mut ledger,
        &alice,
        Amount::from_drops(100),
        Amount::Issued(IssuedAmount::new(100, 0).unwrap(), usd),
        2,
        None,
    );

    let book = Book::new(Issue::native(), usd);
    let (result, changes) = {
        let mut view = ApplyView::new(&ledger);
        let mut cancel_view = ApplyView::new(&ledger);
        let result = cross(
            &mut view,
            &mut cancel_view,
            &bob,
            &book,
            Amounts::new(
                Amount::from_drops(50),
                Amount::Issued(IssuedAmount::new(50, 0).unwrap(), usd),
            ),
            None,
            StepCounter::new(100),
        )
        .unwrap();
        (result, view.into_changes())
    };
    ledger.apply_changes(changes);

    assert_eq!(result.taker_paid, Amount::from_drops(50));
    assert_eq!(
        result.taker_got,
        Amount::Issued(IssuedAmount::new(50, 0).unwrap(), usd)
    );
    // the offer shrank monotonically and stays in the book
    let offer = ledger.read(&offer_key).unwrap().into_offer().unwrap();
    assert_eq!(offer.taker_pays, Amount::from_drops(50));
    assert_eq!(
        offer.taker_gets,
        Amount::Issued(IssuedAmount::new(50, 0).unwrap(), usd)
    );
    assert_eq!(balance_of(&ledger, &alice), FUNDED + 50);
    assert_eq!(balance_of(&ledger, &bob), FUNDED - 50);
    assert_eq!(
        line_balance(&ledger, &bob, &usd),
        IssuedAmount::new(50, 0).unwrap()
    );
    assert_eq!(
        line_balance(&ledger, &alice, &usd),
        IssuedAmount::new(50, 0).unwrap()
    );
}

#[test]
fn test_cross_consumes_best_quality_first_and_deletes_filled_offers() {
    let alice = account(1);
    let bob = account(2);
    let carol = account(4);
    let usd = usd_of(3);
    let mut ledger =
        ledger_with_accounts(&[(alice, FUNDED), (bob, FUNDED), (carol, FUNDED)]);
    ledger.set_close_time(Timestamp::from_secs(1_000));
    set_line(&mut ledger, &alice, usd, IssuedAmount::new(500, 0).unwrap());
    set_line(&mut ledger, &carol, usd, IssuedAmount::new(500, 0).unwrap());
    // carol asks 1 drop per USD, alice asks 2 drops per USD
    let cheap = place_offer(
        &mut ledger,
        &carol,
        Amount::from_drops(100),
        Amount::Issued(IssuedAmount::new(100, 0).unwrap(), usd),
        2,
        None,
    );
    let dear = place_offer(
        &mut ledger,
        &alice,
        Amount::from_drops(200),
        Amount::Issued(IssuedAmount::new(100, 0).unwrap(), usd),
        2,
        None,
    );

    let book = Book::new(Issue::native(), usd);
    let (result, changes) = {
        let mut view = ApplyView::new(&ledger);
        let mut cancel_view = ApplyView::new(&ledger);
        let result = cross(
            &mut view,
            &mut cancel_view,
            &bob,
            &book,
            Amounts::new(
                Amount::from_drops(400),
                Amount::Issued(IssuedAmount::new(150, 0).unwrap(), usd),
            ),
            None,
            StepCounter::new(100),
        )
        .unwrap();
        (result, view.into_changes())
    };
    ledger.apply_changes(changes);

    // carol's whole offer went first at 1 drop per USD, then 50 USD of
    // alice's at 2 drops per USD
    assert_eq!(result.taker_paid, Amount::from_drops(200));
    assert_eq!(
        result.taker_got,
        Amount::Issued(IssuedAmount::new(150, 0).unwrap(), usd)
    );
    assert!(!ledger.exists(&cheap));
    let remaining = ledger.read(&dear).unwrap().into_offer().unwrap();
    assert_eq!(remaining.taker_pays, Amount::from_drops(100));
    assert_eq!(
        line_balance(&ledger, &bob, &usd),
        IssuedAmount::new(150, 0).unwrap()
    );
}

#[test]
fn test_cross_charges_issuer_transfer_fee() {
    let alice = account(1);
    let bob = account(2);
    let issuer = account(3);
    let usd = usd_of(3);
    let mut ledger =
        ledger_with_accounts(&[(alice, FUNDED), (bob, FUNDED), (issuer, FUNDED)]);
    ledger.set_close_time(Timestamp::from_secs(1_000));
    // the issuer charges 0.5% on third-party transfers
    {
        let key = keylet::account(&issuer);
        let mut root = ledger.read(&key).unwrap().into_account().unwrap();
        root.transfer_rate = Some(strand_models::Rate::new(1_005_000_000));
        ledger.put(key, LedgerObject::Account(root));
    }
    set_line(&mut ledger, &alice, usd, IssuedAmount::new(100, 0).unwrap());
    place_offer(
        &mut ledger,
        &alice,
        Amount::from_drops(100),
        Amount::Issued(IssuedAmount::new(100, 0).unwrap(), usd),
        2,
        None,
    );

    let book = Book::new(Issue::native(), usd);
    let (_, changes) = {
        let mut view = ApplyView::new(&ledger);
        let mut cancel_view = ApplyView::new(&ledger);
        let result = cross(
            &mut view,
            &mut cancel_view,
            &bob,
            &book,
            Amounts::new(
                Amount::from_drops(50),
                Amount::Issued(IssuedAmount::new(50, 0).unwrap(), usd),
            ),
            None,
            StepCounter::new(100),
        )
        .unwrap();
        (result, view.into_changes())
    };
    ledger.apply_changes(changes);

    // bob received 50; alice surrendered 50 * 1.005
    assert_eq!(
        line_balance(&ledger, &bob, &usd),
        IssuedAmount::new(50, 0).unwrap()
    );
    assert_eq!(
        line_balance(&ledger, &alice, &usd),
        IssuedAmount::new(4975, -2).unwrap()
    );
}

#[test]
fn test_cross_stops_at_quality_limit() {
    let alice = account(1);
    let bob = account(2);
    let usd = usd_of(3);
    let mut ledger = ledger_with_accounts(&[(alice, FUNDED), (bob, FUNDED)]);
    ledger.set_close_time(Timestamp::from_secs(1_000));
    set_line(&mut ledger, &alice, usd, IssuedAmount::new(500, 0).unwrap());
    // 2 drops per USD
    let offer_key = place_offer(
        &mut ledger,
        &alice,
        Amount::from_drops(200),
        Amount::Issued(IssuedAmount::new(100, 0).unwrap(), usd),
        2,
        None,
    );

    // the taker insists on 1 drop per USD or better
    let limit = strand_models::Quality::from_amounts(&Amounts::new(
        Amount::from_drops(100),
        Amount::Issued(IssuedAmount::new(100, 0).unwrap(), usd),
    ))
    .unwrap();

    let book = Book::new(Issue::native(), usd);
    let mut view = ApplyView::new(&ledger);
    let mut cancel_view = ApplyView::new(&ledger);
    let result = cross(
        &mut view,
        &mut cancel_view,
        &bob,
        &book,
        Amounts::new(
            Amount::from_drops(400),
            Amount::Issued(IssuedAmount::new(150, 0).unwrap(), usd),
        ),
        Some(limit),
        StepCounter::new(100),
    )
    .unwrap();

    assert!(result.taker_got.is_zero());
    assert!(result.removed.is_empty());
    // nothing was filled: the offer sits untouched in the live layer
    assert!(view.exists(&offer_key));
}

// --- pipeline outcomes ------------------------------------------------------

#[test]
fn test_tec_outcome_keeps_fee_and_sequence_only() {
    let alice = account(1);
    let mut ledger = ledger_with_accounts(&[(alice, FUNDED)]);
    ledger.set_close_time(Timestamp::from_secs(1_000));
    let objects_before = ledger.len();

    // funding a nonexistent channel claims the fee and does nothing else
    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(1),
            1,
            0,
            TxKind::ChannelFund(ChannelFundTx {
                channel: Key::compute_from(b"no such channel"),
                amount: NativeAmount::from_drops(50),
                expiration: None,
            }),
        ),
    );
    assert_eq!(result.result, TransResult::TecNoEntry);
    assert!(result.applied);
    assert_eq!(ledger.len(), objects_before);
    let root = ledger
        .read(&keylet::account(&alice))
        .unwrap()
        .into_account()
        .unwrap();
    assert_eq!(root.balance, NativeAmount::from_drops(FUNDED - FEE));
    assert_eq!(root.sequence, 2);
}

#[test]
fn test_retry_outcomes_leave_the_view_untouched() {
    let alice = account(1);
    let mut ledger = ledger_with_accounts(&[(alice, FUNDED)]);
    ledger.set_close_time(Timestamp::from_secs(1_000));

    // wrong sequence: retry, nothing consumed
    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(1),
            7,
            0,
            TxKind::ChannelFund(ChannelFundTx {
                channel: Key::compute_from(b"no such channel"),
                amount: NativeAmount::from_drops(50),
                expiration: None,
            }),
        ),
    );
    assert_eq!(result.result, TransResult::TerPreSeq);
    assert!(!result.applied);
    assert_eq!(balance_of(&ledger, &alice), FUNDED);

    // unknown source account
    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(6),
            1,
            0,
            TxKind::OfferCancel(OfferCancelTx { offer_sequence: 0 }),
        ),
    );
    // preflight rejects before the account is even looked up
    assert_eq!(result.result, TransResult::TemBadSequence);

    let result = apply_to_ledger(
        &mut ledger,
        &signed_tx(
            &keypair(6),
            1,
            0,
            TxKind::OfferCancel(OfferCancelTx { offer_sequence: 1 }),
        ),
    );
    assert_eq!(result.result, TransResult::TerNoAccount);
    assert!(!result.applied);
}

#[test]
fn test_disabled_feature_rejects_channel_transactions() {
    let alice = account(1);
    let bob = account(2);
    let ledger = ledger_with_accounts(&[(alice, FUNDED), (bob, FUNDED)]);
    let tx = signed_tx(
        &keypair(1),
        1,
        0,
        TxKind::ChannelCreate(ChannelCreateTx {
            destination: bob,
            amount: NativeAmount::from_drops(100),
            settle_delay: 60,
            public_key: keypair(9).public_key(),
            cancel_after: None,
            destination_tag: None,
        }),
    );
    let mut view = ApplyView::new(&ledger);
    let rules = Rules::none_enabled();
    let result = apply_transaction(&mut view, &tx, &rules);
    assert_eq!(result.result, TransResult::TemDisabled);
    assert!(!result.applied);
    assert!(view.changes().is_empty());
    assert_eq!(balance_of(&ledger, &alice), FUNDED);
}

#[test]
fn test_deferred_removal_set_round_trips() {
    let alice = account(1);
    let usd = usd_of(3);
    let mut ledger = ledger_with_accounts(&[(alice, FUNDED)]);
    // an offer whose owner never had funds
    let offer_key = place_offer(
        &mut ledger,
        &alice,
        Amount::from_drops(100),
        Amount::Issued(IssuedAmount::new(100, 0).unwrap(), usd),
        2,
        None,
    );

    let book = Book::new(Issue::native(), usd);
    let mut view = ApplyView::new(&ledger);
    let mut cancel_view = ApplyView::new(&ledger);
    let mut stream: OfferStream<Amount, Amount> = OfferStream::new(
        book,
        Timestamp::from_secs(1_000),
        StepCounter::new(10),
        RemovalPolicy::Deferred(BTreeSet::new()),
    );
    assert!(!stream.step(&mut view, &mut cancel_view));
    let removed = stream.into_permanently_removed();
    assert_matches!(removed.iter().next(), Some(key) if *key == offer_key);
    // deferred: the baseline still holds the offer until the enclosing
    // computation commits and applies the set
    assert!(cancel_view.exists(&offer_key));
    crate::flow::apply_deferred_removals(&mut cancel_view, &removed);
    assert!(!cancel_view.exists(&offer_key));
}
