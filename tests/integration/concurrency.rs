//! Many threads against one book: no overdraft, no lost updates.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use turf::types::WagerState;
use turf::wagering::wager::Selection;

use crate::fixtures::*;

#[test]
fn test_shared_account_never_overdraws() {
    let book = book();
    let race_id = race(&book, 4);
    book.open_betting(&race_id).unwrap();
    let ana = book.open_account("Ana", dec!(100));
    let pick = runner(&book, &race_id, 1);
    let accepted = AtomicUsize::new(0);

    thread::scope(|s| {
        for _ in 0..10 {
            s.spawn(|| {
                let bet = book.place_bet(&ana, &race_id, Selection::Win(pick.clone()), dec!(20));
                if bet.unwrap().is_some() {
                    accepted.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
    });

    assert_eq!(accepted.load(Ordering::SeqCst), 5);
    assert_eq!(balance(&book, &ana), Decimal::ZERO);
    assert_eq!(book.bettor(&ana).unwrap().wager_count, 5);
}

#[test]
fn test_independent_accounts_in_parallel() {
    let book = book();
    let race_id = race(&book, 4);
    book.open_betting(&race_id).unwrap();
    let bettors: Vec<String> = (0..8).map(|i| book.open_account(&format!("B{i}"), dec!(100))).collect();
    let pick = runner(&book, &race_id, 2);

    thread::scope(|s| {
        for bettor in &bettors {
            let (book, race_id, pick) = (&book, &race_id, &pick);
            s.spawn(move || {
                for _ in 0..4 {
                    let bet = book.place_bet(bettor, race_id, Selection::Win(pick.clone()), dec!(12.5));
                    assert!(bet.unwrap().is_some());
                }
            });
        }
    });

    for bettor in &bettors {
        assert_eq!(balance(&book, bettor), dec!(50));
    }

    off(&book, &race_id);
    let report = book.record_result(&race_id, result(&book, &race_id, &[2, 1, 3, 4])).unwrap();
    assert_eq!(report.bettors, 8);
    assert_eq!(report.totals.won, 32);
    for bettor in &bettors {
        assert_eq!(balance(&book, bettor), dec!(250));
    }
}

#[test]
fn test_bets_racing_the_close_are_all_or_nothing() {
    let book = book();
    let race_id = race(&book, 4);
    book.open_betting(&race_id).unwrap();
    let ana = book.open_account("Ana", dec!(1000));
    let pick = runner(&book, &race_id, 3);

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..10 {
                    let _ = book.place_bet(&ana, &race_id, Selection::Win(pick.clone()), dec!(10));
                }
            });
        }
        s.spawn(|| {
            book.close_betting(&race_id).unwrap();
        });
    });

    let bettor = book.bettor(&ana).unwrap();
    let confirmed = bettor
        .history()
        .iter()
        .filter(|w| w.state() == WagerState::Confirmed)
        .count();
    assert_eq!(confirmed as u64, bettor.wager_count);
    assert_eq!(bettor.balance + bettor.total_staked, dec!(1000));
    assert!(book.place_bet(&ana, &race_id, Selection::Win(pick.clone()), dec!(10)).unwrap().is_none());
}
