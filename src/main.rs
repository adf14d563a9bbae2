//! TURF race-day driver.
//!
//! Loads configuration, initialises structured logging, runs one race
//! of the meeting end to end (entries, betting, the off, settlement)
//! and persists the book to disk.

use anyhow::{Context, Result};
use chrono::{Months, NaiveDate, TimeDelta, Timelike};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use turf::clock::{today, Clock, SystemClock};
use turf::config::AppConfig;
use turf::engine::Book;
use turf::racing::result::RaceResult;
use turf::storage;
use turf::types::{Horse, Jockey, RaceRecord, Sex};
use turf::wagering::wager::Selection;

const BANNER: &str = r#"
 _____ _   _ ____  _____
|_   _| | | |  _ \|  ___|
  | | | | | | |_) | |_
  | | | |_| |  _ <|  _|
  |_|  \___/|_| \_\_|

  Race lifecycle and wager settlement
"#;

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// One horse/jockey pairing on the card, with recent form.
struct Entrant {
    horse: &'static str,
    sex: Sex,
    horse_weight: Decimal,
    jockey: &'static str,
    jockey_weight: Decimal,
    /// Finishing positions in the pairing's last races, oldest first.
    form: &'static [u32],
}

const CARD: [Entrant; 5] = [
    Entrant { horse: "Relámpago", sex: Sex::Colt, horse_weight: dec!(482), jockey: "P. Falero", jockey_weight: dec!(54), form: &[1, 2, 1, 4] },
    Entrant { horse: "Tormenta", sex: Sex::Filly, horse_weight: dec!(455), jockey: "J. Leyes", jockey_weight: dec!(53), form: &[3, 1, 5, 2] },
    Entrant { horse: "Bandolero", sex: Sex::Gelding, horse_weight: dec!(501), jockey: "A. Fresu", jockey_weight: dec!(55), form: &[6, 4, 2, 7] },
    Entrant { horse: "Centella", sex: Sex::Mare, horse_weight: dec!(468), jockey: "W. Pereyra", jockey_weight: dec!(52), form: &[8, 9, 5, 6] },
    Entrant { horse: "Gaucho Viejo", sex: Sex::Stallion, horse_weight: dec!(520), jockey: "G. Calvente", jockey_weight: dec!(56), form: &[] },
];

fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::var("TURF_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
    let cfg = if Path::new(&config_path).exists() {
        AppConfig::load(&config_path)?
    } else {
        AppConfig::default()
    };

    init_logging();

    println!("{BANNER}");
    info!(
        meeting = %cfg.meeting.name,
        venue = %cfg.meeting.venue,
        config = %config_path,
        "TURF starting up"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let book = Book::new(&cfg, clock);

    run_meeting(&book, &cfg)?;

    let path = cfg.storage.snapshot_path.as_str();
    storage::save_snapshot(&book.snapshot(), Some(path))?;
    let saved = storage::load_snapshot(Some(path))?.context("Snapshot missing right after save")?;
    info!(
        path,
        horses = saved.horses.len(),
        races = saved.races.len(),
        bettors = saved.bettors.len(),
        "TURF shut down cleanly."
    );

    Ok(())
}

/// Run the feature race of the meeting from entries to settlement.
fn run_meeting(book: &Book, cfg: &AppConfig) -> Result<()> {
    let race_day = today(book.clock());
    let post_time = book.now().with_second(0).unwrap_or_else(|| book.now());
    let race_id = book.schedule_race(&format!("{} Stakes", cfg.meeting.name), post_time, 2000);

    // -- Entries ----------------------------------------------------------

    for (number, entrant) in (1u32..).zip(CARD.iter()) {
        let (horse, jockey) = stable_entry(entrant, race_day);
        let assigned = entrant.jockey_weight + dec!(1);
        let horse_id = book.register_horse(horse);
        let jockey_id = book.register_jockey(jockey);
        if !book.enter(&race_id, &horse_id, &jockey_id, number, assigned)? {
            warn!(horse = entrant.horse, number, "Entry refused");
        }
    }

    if !book.open_betting(&race_id)? {
        warn!(race = %book.race(&race_id)?, "Race does not meet minimum conditions, cancelling");
        let report = book.cancel_race(&race_id)?;
        info!(report = %report, "Meeting abandoned");
        return Ok(());
    }

    let quotes = book.quote(&race_id)?;
    for q in &quotes {
        info!(quote = %q, "Odds");
    }

    // -- Betting ----------------------------------------------------------

    let runner = |number: u32| -> Result<String> {
        let race = book.race(&race_id)?;
        let p = race
            .participant_by_number(number)
            .with_context(|| format!("No runner #{number}"))?;
        Ok(p.id.clone())
    };

    let ana = book.open_account("Ana", dec!(100));
    let luis = book.open_account("Luis", dec!(250));
    let marta = book.open_account("Marta", dec!(60));

    let bets = [
        (&ana, Selection::Win(runner(2)?), dec!(20)),
        (&luis, Selection::Exacta { first: runner(1)?, second: runner(2)? }, dec!(25)),
        (&luis, Selection::Quinella(runner(1)?, runner(3)?), dec!(15)),
        (&marta, Selection::Place(runner(4)?), dec!(30)),
        (&marta, Selection::Win(runner(5)?), dec!(40)),
    ];
    for (bettor, selection, stake) in bets {
        if book.place_bet(bettor, &race_id, selection, stake)?.is_none() {
            warn!(bettor = %book.bettor(bettor)?.name, %stake, "Bet not placed");
        }
    }

    // -- The off ----------------------------------------------------------

    book.close_betting(&race_id)?;
    if !book.start_race(&race_id)? {
        let report = book.suspend_race(&race_id)?;
        warn!(report = %report, "Race could not start");
        return Ok(());
    }

    let result = run_race(&race_id, book)?;
    let report = book.record_result(&race_id, result)?;
    info!(report = %report, "Settlement");

    for bettor_id in [&ana, &luis, &marta] {
        let bettor = book.bettor(bettor_id)?;
        let sheet = book.balance_sheet(bettor_id)?;
        info!(bettor = %bettor, sheet = %sheet, "Balance sheet");
    }
    Ok(())
}

/// Build a horse and jockey with their shared recent form.
fn stable_entry(entrant: &Entrant, race_day: NaiveDate) -> (Horse, Jockey) {
    let years_ago = |n: u32| race_day.checked_sub_months(Months::new(n * 12)).unwrap_or(race_day);

    let mut horse = Horse::new(entrant.horse, years_ago(5), entrant.sex, entrant.horse_weight);
    let mut jockey = Jockey::new(
        entrant.jockey,
        years_ago(28),
        entrant.jockey_weight,
        &format!("LIC-{}", entrant.jockey_weight),
        race_day + TimeDelta::days(365),
    );

    let runs = entrant.form.len() as i64;
    for (i, &position) in entrant.form.iter().enumerate() {
        let record = RaceRecord {
            race_id: format!("form-{i}"),
            race_name: "Handicap".to_string(),
            date: race_day - TimeDelta::days(14 * (runs - i as i64)),
            position,
            time: Duration::from_millis(121_000 + u64::from(position) * 300),
            field_size: 10,
        };
        horse.record_race(record.clone());
        jockey.record_race(record);
    }
    (horse, jockey)
}

/// Finish the field in order of rating; ties go to the lower number.
fn run_race(race_id: &str, book: &Book) -> Result<RaceResult> {
    let mut quotes = book.quote(race_id)?;
    quotes.sort_by(|a, b| {
        b.rating
            .total_cmp(&a.rating)
            .then(a.competitor_number.cmp(&b.competitor_number))
    });

    let mut result = RaceResult::new(race_id, book.now());
    for (position, q) in (1u32..).zip(quotes.iter()) {
        let time = Duration::from_millis(119_800 + u64::from(position - 1) * 420);
        result.register_position(position, &q.participant_id, time);
    }
    Ok(result)
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("turf=info"));

    if std::env::var("TURF_LOG_JSON").is_ok() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
