//! Race aggregate and its lifecycle state machine.
//!
//! ```text
//! Scheduled → EntriesOpen → BettingOpen → BettingClosed → Running → Finished
//!      \__________\______________\_____________\____________\→ Cancelled | Suspended
//! ```
//!
//! Every transition returns `bool`: `false` means the call was rejected
//! and nothing changed. The roster and result are only exposed as
//! shared references so the aggregate keeps its invariants.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::clock::{today, Clock};
use crate::config::RacingConfig;
use crate::racing::eligibility::EligibilityChecker;
use crate::racing::odds::{pairing_odds, pairing_rating, QuotedOdds};
use crate::racing::participant::Participant;
use crate::racing::result::RaceResult;
use crate::types::{new_id, ParticipantState, RaceRecord, RaceState};

pub const DEFAULT_MIN_PARTICIPANTS: usize = 4;
pub const DEFAULT_MAX_PARTICIPANTS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    pub id: String,
    pub name: String,
    pub scheduled_at: NaiveDateTime,
    /// Distance in metres.
    pub distance: u32,
    pub min_participants: usize,
    pub max_participants: usize,
    /// Days a race date may lie in the past and still be run.
    pub stale_after_days: i64,
    state: RaceState,
    participants: Vec<Participant>,
    result: Option<RaceResult>,
}

impl Race {
    pub fn new(name: &str, scheduled_at: NaiveDateTime, distance: u32) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            scheduled_at,
            distance,
            min_participants: DEFAULT_MIN_PARTICIPANTS,
            max_participants: DEFAULT_MAX_PARTICIPANTS,
            stale_after_days: 1,
            state: RaceState::Scheduled,
            participants: Vec::new(),
            result: None,
        }
    }

    /// Race with roster bounds and staleness taken from the rules.
    pub fn with_rules(name: &str, scheduled_at: NaiveDateTime, distance: u32, rules: &RacingConfig) -> Self {
        Self {
            min_participants: rules.min_participants,
            max_participants: rules.max_participants,
            stale_after_days: rules.stale_race_days,
            ..Self::new(name, scheduled_at, distance)
        }
    }

    pub fn state(&self) -> RaceState {
        self.state
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, participant_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == participant_id)
    }

    pub fn participant_by_number(&self, number: u32) -> Option<&Participant> {
        self.participants.iter().find(|p| p.competitor_number == number)
    }

    pub fn result(&self) -> Option<&RaceResult> {
        self.result.as_ref()
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.max_participants
    }

    // -- Entries ----------------------------------------------------------

    /// Enter a pairing. The horse is judged as of the race date.
    pub fn add_participant(&mut self, participant: Participant, checker: &EligibilityChecker) -> bool {
        if !self.state.accepts_entries() {
            debug!(race = %self.name, state = %self.state, "Entries closed");
            return false;
        }
        if self.is_full() {
            debug!(race = %self.name, max = self.max_participants, "Roster full");
            return false;
        }
        if self.participant_by_number(participant.competitor_number).is_some() {
            debug!(
                race = %self.name,
                number = participant.competitor_number,
                "Competitor number already taken"
            );
            return false;
        }
        if !checker.participant_eligible_on(&participant, self.scheduled_at.date()) {
            debug!(race = %self.name, participant = %participant, "Participant not eligible");
            return false;
        }

        info!(race = %self.name, participant = %participant, "Participant entered");
        self.participants.push(participant);

        if self.state == RaceState::Scheduled && self.participants.len() >= self.min_participants {
            self.transition(RaceState::EntriesOpen);
        }
        true
    }

    /// Withdraw a pairing before the off. It stays on the roster for audit.
    pub fn withdraw_participant(&mut self, participant_id: &str) -> bool {
        if matches!(self.state, RaceState::Running | RaceState::Finished) {
            return false;
        }
        match self.participants.iter_mut().find(|p| p.id == participant_id) {
            Some(p) => p.withdraw(),
            None => false,
        }
    }

    /// Participants still able to take part.
    pub fn runners(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.state().allows_participation())
    }

    // -- Lifecycle --------------------------------------------------------

    /// Enough runners, not stale, not aborted.
    pub fn meets_minimum_conditions(&self, clock: &dyn Clock) -> bool {
        let days_past = (today(clock) - self.scheduled_at.date()).num_days();
        self.runners().count() >= self.min_participants
            && days_past <= self.stale_after_days
            && self.state.is_active()
    }

    pub fn open_betting(&mut self, clock: &dyn Clock) -> bool {
        if !self.state.accepts_entries() || !self.meets_minimum_conditions(clock) {
            debug!(race = %self.name, state = %self.state, "Cannot open betting");
            return false;
        }
        self.transition(RaceState::BettingOpen)
    }

    pub fn close_betting(&mut self) -> bool {
        if self.state != RaceState::BettingOpen {
            return false;
        }
        self.transition(RaceState::BettingClosed)
    }

    pub fn start(&mut self, clock: &dyn Clock) -> bool {
        if self.state != RaceState::BettingClosed || !self.meets_minimum_conditions(clock) {
            debug!(race = %self.name, state = %self.state, "Cannot start race");
            return false;
        }
        self.transition(RaceState::Running)
    }

    /// Attach the official result and write history for every finisher.
    ///
    /// Accepted only while Running or BettingClosed, and only for a
    /// result naming this race whose placings are all runners on the
    /// roster. The result is attached once.
    pub fn record_result(&mut self, result: RaceResult) -> bool {
        if !matches!(self.state, RaceState::Running | RaceState::BettingClosed) {
            warn!(race = %self.name, state = %self.state, "Result rejected: race not running");
            return false;
        }
        if result.race_id != self.id {
            warn!(race = %self.name, result_race = %result.race_id, "Result rejected: wrong race");
            return false;
        }
        let stranger = result.finishing_order().into_iter().find(|id| {
            self.participant(id)
                .map_or(true, |p| p.state() == ParticipantState::Withdrawn)
        });
        if let Some(stranger) = stranger {
            warn!(race = %self.name, participant = stranger, "Result rejected: not a runner");
            return false;
        }

        let date = self.scheduled_at.date();
        let field_size = result.len();
        let mut recorded = 0;
        for participant in &mut self.participants {
            let (Some(position), Some(time)) = (
                result.position_of(&participant.id),
                result.time_of(&participant.id),
            ) else {
                continue;
            };
            let record = RaceRecord {
                race_id: self.id.clone(),
                race_name: self.name.clone(),
                date,
                position,
                time,
                field_size,
            };
            participant.horse.record_race(record.clone());
            participant.jockey.record_race(record);
            participant.finish();
            recorded += 1;
        }

        if !result.is_complete(self.runners_at_off()) {
            warn!(race = %self.name, placed = field_size, "Result does not place every runner");
        }
        info!(race = %self.name, winner = ?result.winner(), recorded, "Result recorded");

        self.result = Some(result);
        self.transition(RaceState::Finished)
    }

    /// Abort override: any state but Finished (or an existing abort).
    pub fn cancel(&mut self) -> bool {
        self.abort(RaceState::Cancelled)
    }

    pub fn suspend(&mut self) -> bool {
        self.abort(RaceState::Suspended)
    }

    fn abort(&mut self, to: RaceState) -> bool {
        if self.state == RaceState::Finished || !self.state.is_active() {
            return false;
        }
        self.transition(to)
    }

    fn transition(&mut self, to: RaceState) -> bool {
        info!(race = %self.name, from = %self.state, to = %to, "Race state change");
        self.state = to;
        true
    }

    /// Non-withdrawn participants (finished ones included).
    fn runners_at_off(&self) -> usize {
        self.participants
            .iter()
            .filter(|p| p.state() != ParticipantState::Withdrawn)
            .count()
    }

    // -- Pricing ----------------------------------------------------------

    /// Advisory odds for every runner, in roster order.
    pub fn current_odds(&self) -> Vec<QuotedOdds> {
        self.runners()
            .map(|p| QuotedOdds {
                participant_id: p.id.clone(),
                competitor_number: p.competitor_number,
                rating: pairing_rating(&p.horse, &p.jockey),
                odds: pairing_odds(&p.horse, &p.jockey),
            })
            .collect()
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {:02}:{:02}, {}m, {} runners) [{}]",
            self.name,
            self.scheduled_at.date(),
            self.scheduled_at.hour(),
            self.scheduled_at.minute(),
            self.distance,
            self.participants.len(),
            self.state,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
