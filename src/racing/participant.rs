//! Race participant: one horse + jockey pairing entered in one race.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::types::{new_id, Horse, Jockey, ParticipantState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub horse: Horse,
    pub jockey: Jockey,
    pub competitor_number: u32,
    /// Weight carried, in kg.
    pub assigned_weight: Decimal,
    state: ParticipantState,
}

impl Participant {
    /// New pairing in the `Registered` state.
    pub fn new(horse: Horse, jockey: Jockey, competitor_number: u32, assigned_weight: Decimal) -> Self {
        Self {
            id: new_id(),
            horse,
            jockey,
            competitor_number,
            assigned_weight,
            state: ParticipantState::Registered,
        }
    }

    pub fn state(&self) -> ParticipantState {
        self.state
    }

    /// Registered → Confirmed.
    pub fn confirm(&mut self) -> bool {
        self.advance(ParticipantState::Registered, ParticipantState::Confirmed)
    }

    /// Confirmed → Weighed.
    pub fn weigh_in(&mut self) -> bool {
        self.advance(ParticipantState::Confirmed, ParticipantState::Weighed)
    }

    /// Weighed → OnTrack.
    pub fn enter_track(&mut self) -> bool {
        self.advance(ParticipantState::Weighed, ParticipantState::OnTrack)
    }

    /// Any state that allows participation → Finished.
    pub fn finish(&mut self) -> bool {
        if !self.state.allows_participation() {
            return false;
        }
        self.set_state(ParticipantState::Finished);
        true
    }

    /// OnTrack or Finished → Disqualified (stewards' inquiry after the line).
    pub fn disqualify(&mut self) -> bool {
        if !matches!(self.state, ParticipantState::OnTrack | ParticipantState::Finished) {
            return false;
        }
        self.set_state(ParticipantState::Disqualified);
        true
    }

    /// Any non-terminal state → Withdrawn.
    pub fn withdraw(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.set_state(ParticipantState::Withdrawn);
        true
    }

    fn advance(&mut self, from: ParticipantState, to: ParticipantState) -> bool {
        if self.state != from {
            return false;
        }
        self.set_state(to);
        true
    }

    fn set_state(&mut self, to: ParticipantState) {
        debug!(
            participant = %self.id,
            number = self.competitor_number,
            from = %self.state,
            to = %to,
            "Participant state change"
        );
        self.state = to;
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} / {} ({}kg) [{}]",
            self.competitor_number, self.horse.name, self.jockey.name, self.assigned_weight, self.state
        )
    }
}
