//! Shared types for the TURF core.
//!
//! Horses, jockeys, their race history and the lifecycle enums used
//! across the racing and wagering modules. They carry no behaviour
//! beyond small derived queries so that every module can depend on
//! them without circular references.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Fresh random identifier for any aggregate.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// Race history
// ---------------------------------------------------------------------------

/// One finished race in a horse's or jockey's career.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceRecord {
    pub race_id: String,
    pub race_name: String,
    pub date: NaiveDate,
    pub position: u32,
    pub time: Duration,
    pub field_size: usize,
}

/// Win/place counts derived from a race history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CareerStats {
    pub races: u32,
    pub wins: u32,
    /// Top-three finishes, wins included.
    pub places: u32,
}

impl CareerStats {
    pub fn from_history(history: &[RaceRecord]) -> Self {
        history.iter().fold(Self::default(), |mut acc, r| {
            acc.races += 1;
            if r.position == 1 {
                acc.wins += 1;
            }
            if (1..=3).contains(&r.position) {
                acc.places += 1;
            }
            acc
        })
    }

    /// Wins as a percentage of races (0 when no races).
    pub fn win_pct(&self) -> f64 {
        if self.races == 0 {
            0.0
        } else {
            self.wins as f64 / self.races as f64 * 100.0
        }
    }

    /// Top-three finishes as a percentage of races (0 when no races).
    pub fn place_pct(&self) -> f64 {
        if self.races == 0 {
            0.0
        } else {
            self.places as f64 / self.races as f64 * 100.0
        }
    }
}

impl fmt::Display for CareerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} races, {} wins ({:.1}%), {} places ({:.1}%)",
            self.races,
            self.wins,
            self.win_pct(),
            self.places,
            self.place_pct(),
        )
    }
}

// ---------------------------------------------------------------------------
// Horse & Jockey
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Colt,
    Filly,
    Stallion,
    Mare,
    Gelding,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Colt => write!(f, "Colt"),
            Sex::Filly => write!(f, "Filly"),
            Sex::Stallion => write!(f, "Stallion"),
            Sex::Mare => write!(f, "Mare"),
            Sex::Gelding => write!(f, "Gelding"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Horse {
    pub id: String,
    pub name: String,
    pub birth_date: NaiveDate,
    pub sex: Sex,
    /// Body weight in kg.
    pub weight: Decimal,
    pub last_race: Option<NaiveDate>,
    history: Vec<RaceRecord>,
}

impl Horse {
    pub fn new(name: &str, birth_date: NaiveDate, sex: Sex, weight: Decimal) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            birth_date,
            sex,
            weight,
            last_race: None,
            history: Vec::new(),
        }
    }

    /// Race history ordered by date.
    pub fn history(&self) -> &[RaceRecord] {
        &self.history
    }

    pub fn stats(&self) -> CareerStats {
        CareerStats::from_history(&self.history)
    }

    /// Append a finished race, keeping history ordered and `last_race` current.
    pub fn record_race(&mut self, record: RaceRecord) {
        let date = record.date;
        let at = self.history.partition_point(|r| r.date <= date);
        self.history.insert(at, record);
        if self.last_race.map_or(true, |last| date > last) {
            self.last_race = Some(date);
        }
    }
}

impl fmt::Display for Horse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, born {}, {}kg)",
            self.name, self.sex, self.birth_date, self.weight
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jockey {
    pub id: String,
    pub name: String,
    pub birth_date: NaiveDate,
    /// Riding weight in kg.
    pub weight: Decimal,
    pub license: String,
    pub license_expiry: NaiveDate,
    history: Vec<RaceRecord>,
}

impl Jockey {
    pub fn new(
        name: &str,
        birth_date: NaiveDate,
        weight: Decimal,
        license: &str,
        license_expiry: NaiveDate,
    ) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            birth_date,
            weight,
            license: license.to_string(),
            license_expiry,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[RaceRecord] {
        &self.history
    }

    pub fn stats(&self) -> CareerStats {
        CareerStats::from_history(&self.history)
    }

    pub fn record_race(&mut self, record: RaceRecord) {
        let at = self.history.partition_point(|r| r.date <= record.date);
        self.history.insert(at, record);
    }
}

impl fmt::Display for Jockey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (lic. {}, {}kg)", self.name, self.license, self.weight)
    }
}

// ---------------------------------------------------------------------------
// Lifecycle enums
// ---------------------------------------------------------------------------

/// Race lifecycle. Cancelled and Suspended are abort overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RaceState {
    Scheduled,
    EntriesOpen,
    BettingOpen,
    BettingClosed,
    Running,
    Finished,
    Cancelled,
    Suspended,
}

impl RaceState {
    /// Not aborted.
    pub fn is_active(&self) -> bool {
        !matches!(self, RaceState::Cancelled | RaceState::Suspended)
    }

    /// Whether participants may still be entered.
    pub fn accepts_entries(&self) -> bool {
        matches!(self, RaceState::Scheduled | RaceState::EntriesOpen)
    }
}

impl fmt::Display for RaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RaceState::Scheduled => "SCHEDULED",
            RaceState::EntriesOpen => "ENTRIES OPEN",
            RaceState::BettingOpen => "BETTING OPEN",
            RaceState::BettingClosed => "BETTING CLOSED",
            RaceState::Running => "RUNNING",
            RaceState::Finished => "FINISHED",
            RaceState::Cancelled => "CANCELLED",
            RaceState::Suspended => "SUSPENDED",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticipantState {
    Registered,
    Confirmed,
    Weighed,
    OnTrack,
    Finished,
    Disqualified,
    Withdrawn,
}

impl ParticipantState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ParticipantState::Finished | ParticipantState::Disqualified | ParticipantState::Withdrawn
        )
    }

    /// States in which the pairing may take part in a race.
    pub fn allows_participation(&self) -> bool {
        matches!(
            self,
            ParticipantState::Confirmed | ParticipantState::Weighed | ParticipantState::OnTrack
        )
    }
}

impl fmt::Display for ParticipantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WagerState {
    Pending,
    Confirmed,
    Won,
    Lost,
    Paid,
    Cancelled,
    Refunded,
}

impl WagerState {
    /// Still awaiting a result.
    pub fn is_active(&self) -> bool {
        matches!(self, WagerState::Pending | WagerState::Confirmed)
    }

    /// Settled against a result.
    pub fn is_processed(&self) -> bool {
        matches!(self, WagerState::Won | WagerState::Lost | WagerState::Paid)
    }

    pub fn is_cancelable(&self) -> bool {
        self.is_active()
    }
}

impl fmt::Display for WagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Programming errors surfaced by the book: references to aggregates
/// that were never registered. Business rejections are plain `false`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurfError {
    #[error("Race not found: {0}")]
    RaceNotFound(String),

    #[error("Bettor not found: {0}")]
    BettorNotFound(String),

    #[error("Horse not found: {0}")]
    HorseNotFound(String),

    #[error("Jockey not found: {0}")]
    JockeyNotFound(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
