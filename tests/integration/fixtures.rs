//! Deterministic race-day fixtures.
//!
//! A book pinned to a fixed date, a stable of eligible pairings and
//! helpers to run a race to its result. Everything is in memory.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

use turf::clock::FixedClock;
use turf::config::AppConfig;
use turf::engine::Book;
use turf::racing::result::RaceResult;
use turf::types::{Horse, Jockey, RaceRecord, Sex};

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn race_day() -> NaiveDate {
    d(2026, 6, 1)
}

pub fn post_time() -> NaiveDateTime {
    race_day().and_hms_opt(17, 30, 0).unwrap()
}

pub fn book() -> Book {
    book_with(AppConfig::default())
}

pub fn book_with(config: AppConfig) -> Book {
    Book::new(&config, Arc::new(FixedClock::on(race_day())))
}

pub fn horse(name: &str) -> Horse {
    Horse::new(name, d(2021, 8, 15), Sex::Gelding, dec!(475))
}

pub fn jockey(name: &str) -> Jockey {
    Jockey::new(name, d(1994, 3, 3), dec!(54), "LIC", d(2030, 12, 31))
}

/// Give a horse and jockey the same past finishes, two weeks apart.
pub fn with_form(horse: &mut Horse, jockey: &mut Jockey, positions: &[u32]) {
    let runs = positions.len() as i64;
    for (i, &position) in positions.iter().enumerate() {
        let record = RaceRecord {
            race_id: format!("past-{i}"),
            race_name: "Handicap".into(),
            date: race_day() - TimeDelta::days(14 * (runs - i as i64)),
            position,
            time: Duration::from_secs(122),
            field_size: 9,
        };
        horse.record_race(record.clone());
        jockey.record_race(record);
    }
}

/// Form that prices a pairing at 4.0 (one win, two top-three in four).
pub const FOUR_TO_ONE_FORM: [u32; 4] = [1, 3, 5, 6];

/// Register and enter one pairing under the given number.
pub fn enter(book: &Book, race_id: &str, number: u32, form: &[u32]) -> bool {
    let mut h = horse(&format!("Horse {number}"));
    let mut j = jockey(&format!("Jockey {number}"));
    with_form(&mut h, &mut j, form);
    let horse_id = book.register_horse(h);
    let jockey_id = book.register_jockey(j);
    book.enter(race_id, &horse_id, &jockey_id, number, dec!(55)).unwrap()
}

/// A race with `runners` entries; #2 carries four-to-one form, the rest
/// are debutants at 10.0.
pub fn race(book: &Book, runners: u32) -> String {
    let race_id = book.schedule_race("Gran Premio Nacional", post_time(), 2500);
    for number in 1..=runners {
        let form: &[u32] = if number == 2 { &FOUR_TO_ONE_FORM } else { &[] };
        assert!(enter(book, &race_id, number, form));
    }
    race_id
}

pub fn runner(book: &Book, race_id: &str, number: u32) -> String {
    book.race(race_id)
        .unwrap()
        .participant_by_number(number)
        .unwrap()
        .id
        .clone()
}

/// Official result placing the given competitor numbers in order.
pub fn result(book: &Book, race_id: &str, order: &[u32]) -> RaceResult {
    let mut result = RaceResult::new(race_id, post_time());
    for (i, &number) in order.iter().enumerate() {
        let time = Duration::from_millis(150_200 + i as u64 * 310);
        assert!(result.register_position(i as u32 + 1, &runner(book, race_id, number), time));
    }
    result
}

/// Close betting and send the field off.
pub fn off(book: &Book, race_id: &str) {
    assert!(book.close_betting(race_id).unwrap());
    assert!(book.start_race(race_id).unwrap());
}

pub fn balance(book: &Book, bettor_id: &str) -> Decimal {
    book.bettor(bettor_id).unwrap().balance
}
