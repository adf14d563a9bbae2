//! Eligibility checks for horses, jockeys and their pairing.
//!
//! Every check answers with a plain `bool`; callers decide how to word
//! a rejection. Thresholds come from [`RacingConfig`] and "today" from
//! the injected [`Clock`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

use crate::clock::{age_in_years, today, Clock};
use crate::config::RacingConfig;
use crate::racing::participant::Participant;
use crate::types::{Horse, Jockey};

pub struct EligibilityChecker {
    rules: RacingConfig,
    clock: Arc<dyn Clock>,
}

impl EligibilityChecker {
    pub fn new(rules: RacingConfig, clock: Arc<dyn Clock>) -> Self {
        Self { rules, clock }
    }

    pub fn rules(&self) -> &RacingConfig {
        &self.rules
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Rested, old enough on `as_of`, and within the weight range.
    pub fn can_horse_compete(&self, horse: &Horse, as_of: NaiveDate) -> bool {
        let rested = horse
            .last_race
            .map_or(true, |last| (as_of - last).num_days() >= self.rules.horse_rest_days);
        let old_enough = age_in_years(horse.birth_date, as_of) >= self.rules.horse_min_age_years;
        let weight_ok = in_range(horse.weight, self.rules.horse_min_weight, self.rules.horse_max_weight);

        if !(rested && old_enough && weight_ok) {
            debug!(horse = %horse.name, rested, old_enough, weight_ok, "Horse not eligible");
        }
        rested && old_enough && weight_ok
    }

    /// Licensed today, adult, and within the riding weight range.
    pub fn can_jockey_compete(&self, jockey: &Jockey) -> bool {
        let today = today(self.clock());
        let licensed = jockey.license_expiry >= today;
        let old_enough = age_in_years(jockey.birth_date, today) >= self.rules.jockey_min_age_years;
        let weight_ok = in_range(jockey.weight, self.rules.jockey_min_weight, self.rules.jockey_max_weight);

        if !(licensed && old_enough && weight_ok) {
            debug!(jockey = %jockey.name, licensed, old_enough, weight_ok, "Jockey not eligible");
        }
        licensed && old_enough && weight_ok
    }

    pub fn weight_assignment_valid(&self, jockey: &Jockey, assigned: Decimal) -> bool {
        (jockey.weight - assigned).abs() <= self.rules.weight_tolerance
    }

    /// Full pairing check as of the clock's today.
    pub fn participant_eligible(&self, participant: &Participant) -> bool {
        self.participant_eligible_on(participant, today(self.clock()))
    }

    /// Full pairing check with the horse judged as of `race_date`.
    pub fn participant_eligible_on(&self, participant: &Participant, race_date: NaiveDate) -> bool {
        participant.state().allows_participation()
            && participant.competitor_number > 0
            && in_range(
                participant.assigned_weight,
                self.rules.assigned_min_weight,
                self.rules.assigned_max_weight,
            )
            && self.weight_assignment_valid(&participant.jockey, participant.assigned_weight)
            && self.can_horse_compete(&participant.horse, race_date)
            && self.can_jockey_compete(&participant.jockey)
    }
}

fn in_range(value: Decimal, min: Decimal, max: Decimal) -> bool {
    value >= min && value <= max
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
