//! Rule boundaries: stakes, roster size, competitor numbers, eligibility.

use rust_decimal_macros::dec;

use turf::config::AppConfig;
use turf::types::{Horse, Jockey, RaceState, Sex};
use turf::wagering::wager::Selection;

use crate::fixtures::*;

fn open_race(runners: u32) -> (turf::engine::Book, String) {
    let book = book();
    let race_id = race(&book, runners);
    assert!(book.open_betting(&race_id).unwrap());
    (book, race_id)
}

#[test]
fn test_minimum_stake_boundary() {
    let (book, race_id) = open_race(4);
    let ana = book.open_account("Ana", dec!(100));
    let pick = || Selection::Win(runner(&book, &race_id, 1));

    assert!(book.place_bet(&ana, &race_id, pick(), dec!(10.00)).unwrap().is_some());
    assert!(book.place_bet(&ana, &race_id, pick(), dec!(9.99)).unwrap().is_none());
    assert_eq!(balance(&book, &ana), dec!(90));
}

#[test]
fn test_stake_limit_boundary() {
    let (book, race_id) = open_race(4);
    let ana = book.open_account("Ana", dec!(500));
    assert!(book.set_stake_limit(&ana, dec!(100)).unwrap());
    let pick = || Selection::Win(runner(&book, &race_id, 1));

    assert!(book.place_bet(&ana, &race_id, pick(), dec!(100)).unwrap().is_some());
    assert!(book.place_bet(&ana, &race_id, pick(), dec!(100.01)).unwrap().is_none());
    assert_eq!(balance(&book, &ana), dec!(400));
}

#[test]
fn test_balance_cannot_go_negative() {
    let (book, race_id) = open_race(4);
    let ana = book.open_account("Ana", dec!(30));
    let pick = || Selection::Win(runner(&book, &race_id, 3));

    assert!(book.place_bet(&ana, &race_id, pick(), dec!(20)).unwrap().is_some());
    assert!(book.place_bet(&ana, &race_id, pick(), dec!(20)).unwrap().is_none());
    assert!(book.place_bet(&ana, &race_id, pick(), dec!(10)).unwrap().is_some());
    assert_eq!(balance(&book, &ana), dec!(0));
}

#[test]
fn test_configured_minimum_stake() {
    let config = AppConfig::from_toml("[wagering]\nmin_stake = 5\n").unwrap();
    let book = book_with(config);
    let race_id = race(&book, 4);
    book.open_betting(&race_id).unwrap();
    let ana = book.open_account("Ana", dec!(20));

    let bet = book.place_bet(&ana, &race_id, Selection::Win(runner(&book, &race_id, 1)), dec!(5));
    assert!(bet.unwrap().is_some());
}

#[test]
fn test_competitor_numbers_are_unique() {
    let book = book();
    let race_id = race(&book, 3);
    assert!(!enter(&book, &race_id, 2, &[]));
    assert!(enter(&book, &race_id, 4, &[]));

    let race = book.race(&race_id).unwrap();
    let mut numbers: Vec<u32> = race.participants().iter().map(|p| p.competitor_number).collect();
    numbers.dedup();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
}

#[test]
fn test_roster_minimum_gates_betting() {
    let book = book();
    let race_id = race(&book, 3);
    assert_eq!(book.race(&race_id).unwrap().state(), RaceState::Scheduled);
    assert!(!book.open_betting(&race_id).unwrap());

    assert!(enter(&book, &race_id, 4, &[]));
    assert_eq!(book.race(&race_id).unwrap().state(), RaceState::EntriesOpen);
    assert!(book.open_betting(&race_id).unwrap());
}

#[test]
fn test_roster_maximum() {
    let config = AppConfig::from_toml("[racing]\nmin_participants = 2\nmax_participants = 4\n").unwrap();
    let book = book_with(config);
    let race_id = race(&book, 4);
    assert!(!enter(&book, &race_id, 5, &[]));
    assert_eq!(book.race(&race_id).unwrap().participants().len(), 4);
}

#[test]
fn test_close_betting_is_idempotent() {
    let (book, race_id) = open_race(4);
    assert!(book.close_betting(&race_id).unwrap());
    assert!(!book.close_betting(&race_id).unwrap());
    assert_eq!(book.race(&race_id).unwrap().state(), RaceState::BettingClosed);
}

#[test]
fn test_ineligible_pairings_refused() {
    let book = book();
    let race_id = book.schedule_race("Clásico", post_time(), 1600);
    let good_jockey = book.register_jockey(jockey("Ok"));
    let good_horse = book.register_horse(horse("Ok"));

    let yearling = book.register_horse(Horse::new("Potrillo", d(2025, 9, 1), Sex::Colt, dec!(350)));
    assert!(!book.enter(&race_id, &yearling, &good_jockey, 1, dec!(55)).unwrap());

    let expired = book.register_jockey(Jockey::new("Vencido", d(1990, 1, 1), dec!(54), "OLD", d(2026, 5, 31)));
    assert!(!book.enter(&race_id, &good_horse, &expired, 2, dec!(55)).unwrap());

    // Assigned weight more than 2kg from the jockey's own.
    assert!(!book.enter(&race_id, &good_horse, &good_jockey, 3, dec!(56.5)).unwrap());
    assert!(book.enter(&race_id, &good_horse, &good_jockey, 3, dec!(56)).unwrap());
}

#[test]
fn test_horse_must_rest_between_races() {
    let book = book();
    let race_id = book.schedule_race("Clásico", post_time(), 1600);
    let mut tired = horse("Cansado");
    let mut j = jockey("J");
    with_form(&mut tired, &mut j, &[1]);
    tired.last_race = Some(race_day() - chrono::TimeDelta::days(6));

    let horse_id = book.register_horse(tired);
    let jockey_id = book.register_jockey(j);
    assert!(!book.enter(&race_id, &horse_id, &jockey_id, 1, dec!(55)).unwrap());
}
