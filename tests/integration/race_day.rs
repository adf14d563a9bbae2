//! Full race-day flows: entries, betting, the off, settlement, refunds
//! and persistence.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use turf::config::AppConfig;
use turf::engine::{Book, SettlementKind};
use turf::storage;
use turf::types::{RaceState, WagerState};
use turf::wagering::wager::Selection;

use crate::fixtures::*;

#[test]
fn test_win_bet_end_to_end() {
    let book = book();
    let race_id = race(&book, 5);
    assert!(book.open_betting(&race_id).unwrap());

    let quotes = book.quote(&race_id).unwrap();
    let two = quotes.iter().find(|q| q.competitor_number == 2).unwrap();
    assert_eq!(two.odds, dec!(4.0));

    let ana = book.open_account("Ana", dec!(100));
    let wager_id = book
        .place_bet(&ana, &race_id, Selection::Win(runner(&book, &race_id, 2)), dec!(20))
        .unwrap()
        .unwrap();
    assert_eq!(balance(&book, &ana), dec!(80));

    off(&book, &race_id);
    let report = book.record_result(&race_id, result(&book, &race_id, &[2, 4, 1, 5, 3])).unwrap();

    assert_eq!(report.kind, SettlementKind::Result);
    assert_eq!(report.total_paid(), dec!(80));
    assert_eq!(balance(&book, &ana), dec!(160));

    let wager = book.wager(&ana, &wager_id).unwrap().unwrap();
    assert_eq!(wager.state(), WagerState::Paid);
    assert_eq!(wager.paid_amount(), dec!(80));

    let sheet = book.balance_sheet(&ana).unwrap();
    assert_eq!(sheet.total_staked, dec!(20));
    assert_eq!(sheet.total_won, dec!(80));
    assert_eq!(sheet.net, dec!(60));
    assert_eq!(sheet.win_rate, 100.0);
}

#[test]
fn test_losing_bet_keeps_stake_debited() {
    let book = book();
    let race_id = race(&book, 4);
    book.open_betting(&race_id).unwrap();
    let luis = book.open_account("Luis", dec!(100));
    book.place_bet(&luis, &race_id, Selection::Win(runner(&book, &race_id, 1)), dec!(20))
        .unwrap();

    off(&book, &race_id);
    let report = book.record_result(&race_id, result(&book, &race_id, &[2, 1, 3, 4])).unwrap();

    assert_eq!(report.totals.lost, 1);
    assert_eq!(report.total_paid(), Decimal::ZERO);
    assert_eq!(balance(&book, &luis), dec!(80));
    assert_eq!(book.balance_sheet(&luis).unwrap().net, dec!(-20));
}

#[test]
fn test_every_bet_type_settles() {
    let book = book();
    let race_id = race(&book, 5);
    book.open_betting(&race_id).unwrap();
    let r = |n| runner(&book, &race_id, n);
    let marta = book.open_account("Marta", dec!(500));

    let bets = [
        (Selection::Place(r(4)), true),
        (Selection::Place(r(1)), false),
        (Selection::Exacta { first: r(2), second: r(4) }, true),
        (Selection::Exacta { first: r(4), second: r(2) }, false),
        (Selection::Quinella(r(4), r(2)), true),
        (Selection::Trifecta { first: r(2), second: r(4), third: r(1) }, true),
        (Selection::Trifecta { first: r(2), second: r(1), third: r(4) }, false),
    ];
    let mut placed = Vec::new();
    for (selection, wins) in bets {
        let id = book.place_bet(&marta, &race_id, selection, dec!(10)).unwrap().unwrap();
        placed.push((id, wins));
    }
    assert_eq!(balance(&book, &marta), dec!(430));

    off(&book, &race_id);
    let report = book.record_result(&race_id, result(&book, &race_id, &[2, 4, 1, 5, 3])).unwrap();
    assert_eq!(report.totals.won, 4);
    assert_eq!(report.totals.lost, 3);

    for (id, wins) in &placed {
        let state = book.wager(&marta, id).unwrap().unwrap().state();
        let expected = if *wins { WagerState::Paid } else { WagerState::Lost };
        assert_eq!(state, expected);
    }

    // Place #4 at 4.0, exacta 40, quinella 20, trifecta 400.
    let credited = dec!(40) + dec!(400) + dec!(200) + dec!(4000);
    assert_eq!(report.total_paid(), credited);
    assert_eq!(balance(&book, &marta), dec!(430) + credited);
}

#[test]
fn test_finished_race_is_immutable() {
    let book = book();
    let race_id = race(&book, 4);
    book.open_betting(&race_id).unwrap();
    off(&book, &race_id);
    book.record_result(&race_id, result(&book, &race_id, &[1, 2, 3, 4])).unwrap();

    assert!(!enter(&book, &race_id, 9, &[]));
    assert!(!book.open_betting(&race_id).unwrap());
    assert!(!book.close_betting(&race_id).unwrap());
    assert!(!book.start_race(&race_id).unwrap());
    assert!(book.cancel_race(&race_id).unwrap().is_rejected());

    let again = book.record_result(&race_id, result(&book, &race_id, &[4, 3, 2, 1])).unwrap();
    assert!(again.is_rejected());

    let race = book.race(&race_id).unwrap();
    assert_eq!(race.state(), RaceState::Finished);
    let winner = race.result().unwrap().winner().unwrap();
    assert_eq!(race.participant(winner).unwrap().competitor_number, 1);
}

#[test]
fn test_result_naming_an_outsider_is_rejected() {
    let book = book();
    let race_id = race(&book, 4);
    book.open_betting(&race_id).unwrap();
    let ana = book.open_account("Ana", dec!(100));
    let wager_id = book
        .place_bet(&ana, &race_id, Selection::Win(runner(&book, &race_id, 2)), dec!(20))
        .unwrap()
        .unwrap();
    off(&book, &race_id);

    let mut forged = result(&book, &race_id, &[1, 3, 4]);
    forged.register_position(4, "ringer", std::time::Duration::from_secs(75));
    let report = book.record_result(&race_id, forged).unwrap();

    assert!(report.is_rejected());
    assert_eq!(book.race(&race_id).unwrap().state(), RaceState::Running);
    assert_eq!(book.wager(&ana, &wager_id).unwrap().unwrap().state(), WagerState::Confirmed);
    assert_eq!(balance(&book, &ana), dec!(80));

    let report = book.record_result(&race_id, result(&book, &race_id, &[2, 1, 3, 4])).unwrap();
    assert_eq!(report.kind, SettlementKind::Result);
    assert_eq!(balance(&book, &ana), dec!(160));
}

#[test]
fn test_scratched_runner_bets_are_refunded() {
    let book = book();
    let race_id = race(&book, 5);
    book.open_betting(&race_id).unwrap();
    let ana = book.open_account("Ana", dec!(100));
    let five = runner(&book, &race_id, 5);
    let wager_id = book
        .place_bet(&ana, &race_id, Selection::Win(five.clone()), dec!(20))
        .unwrap()
        .unwrap();
    assert_eq!(balance(&book, &ana), dec!(80));

    assert!(book.withdraw(&race_id, &five).unwrap());
    assert_eq!(balance(&book, &ana), dec!(100));
    assert_eq!(book.wager(&ana, &wager_id).unwrap().unwrap().state(), WagerState::Refunded);

    off(&book, &race_id);
    let report = book.record_result(&race_id, result(&book, &race_id, &[1, 2, 3, 4])).unwrap();
    assert_eq!(report.totals.settled, 0);
    assert_eq!(balance(&book, &ana), dec!(100));
    assert_eq!(book.balance_sheet(&ana).unwrap().net, Decimal::ZERO);
}

#[test]
fn test_cancelled_race_refunds_every_bettor() {
    let book = book();
    let race_id = race(&book, 4);
    book.open_betting(&race_id).unwrap();
    let ana = book.open_account("Ana", dec!(100));
    let luis = book.open_account("Luis", dec!(100));
    book.place_bet(&ana, &race_id, Selection::Win(runner(&book, &race_id, 1)), dec!(35))
        .unwrap();
    book.place_bet(&luis, &race_id, Selection::Quinella(runner(&book, &race_id, 1), runner(&book, &race_id, 3)), dec!(12.5))
        .unwrap();
    book.close_betting(&race_id).unwrap();

    let report = book.cancel_race(&race_id).unwrap();
    assert_eq!(report.kind, SettlementKind::Refund);
    assert_eq!(report.bettors, 2);
    assert_eq!(report.totals.refunded, 2);
    assert_eq!(report.total_paid(), dec!(47.5));
    assert_eq!(balance(&book, &ana), dec!(100));
    assert_eq!(balance(&book, &luis), dec!(100));
    assert_eq!(book.race(&race_id).unwrap().state(), RaceState::Cancelled);
}

#[test]
fn test_winner_history_reaches_the_stable() {
    let book = book();
    let race_id = race(&book, 4);
    book.open_betting(&race_id).unwrap();
    off(&book, &race_id);
    book.record_result(&race_id, result(&book, &race_id, &[3, 1, 2, 4])).unwrap();

    let race = book.race(&race_id).unwrap();
    let three = race.participant_by_number(3).unwrap();
    let horse = book.horse(&three.horse.id).unwrap();
    assert_eq!(horse.stats().wins, 1);
    assert_eq!(horse.last_race, Some(race_day()));

    let two = race.participant_by_number(2).unwrap();
    let jockey = book.jockey(&two.jockey.id).unwrap();
    assert_eq!(jockey.history().len(), FOUR_TO_ONE_FORM.len() + 1);
    assert_eq!(jockey.history().last().unwrap().position, 3);
}

#[test]
fn test_snapshot_survives_a_restart() {
    let book = book();
    let race_id = race(&book, 4);
    book.open_betting(&race_id).unwrap();
    let ana = book.open_account("Ana", dec!(100));
    let wager_id = book
        .place_bet(&ana, &race_id, Selection::Win(runner(&book, &race_id, 2)), dec!(20))
        .unwrap()
        .unwrap();

    let mut path = std::env::temp_dir();
    path.push(format!("turf_it_{}.json", uuid::Uuid::new_v4()));
    let path = path.to_string_lossy().to_string();
    storage::save_snapshot(&book.snapshot(), Some(&path)).unwrap();

    let snapshot = storage::load_snapshot(Some(&path)).unwrap().unwrap();
    let restored = Book::from_snapshot(snapshot, &AppConfig::default(), book_clock());
    storage::delete_snapshot(Some(&path)).unwrap();

    assert_eq!(balance(&restored, &ana), dec!(80));
    assert_eq!(restored.race(&race_id).unwrap().state(), RaceState::BettingOpen);

    off(&restored, &race_id);
    restored
        .record_result(&race_id, result(&restored, &race_id, &[2, 1, 3, 4]))
        .unwrap();
    assert_eq!(balance(&restored, &ana), dec!(160));
    assert_eq!(restored.wager(&ana, &wager_id).unwrap().unwrap().state(), WagerState::Paid);
}

fn book_clock() -> std::sync::Arc<dyn turf::clock::Clock> {
    std::sync::Arc::new(turf::clock::FixedClock::on(race_day()))
}
