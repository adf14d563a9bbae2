//! Official race result: finishing order and times.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub race_id: String,
    pub created_at: NaiveDateTime,
    positions: BTreeMap<u32, String>,
    times: HashMap<String, Duration>,
}

impl RaceResult {
    pub fn new(race_id: &str, created_at: NaiveDateTime) -> Self {
        Self {
            race_id: race_id.to_string(),
            created_at,
            positions: BTreeMap::new(),
            times: HashMap::new(),
        }
    }

    /// Record a finisher. Positions start at 1; a position or participant
    /// can only be written once.
    pub fn register_position(&mut self, position: u32, participant_id: &str, time: Duration) -> bool {
        if position == 0
            || self.positions.contains_key(&position)
            || self.times.contains_key(participant_id)
        {
            warn!(
                race_id = %self.race_id,
                position,
                participant_id,
                "Rejected duplicate or invalid result entry"
            );
            return false;
        }
        self.positions.insert(position, participant_id.to_string());
        self.times.insert(participant_id.to_string(), time);
        true
    }

    pub fn winner(&self) -> Option<&str> {
        self.participant_at(1)
    }

    pub fn participant_at(&self, position: u32) -> Option<&str> {
        self.positions.get(&position).map(String::as_str)
    }

    pub fn position_of(&self, participant_id: &str) -> Option<u32> {
        self.positions
            .iter()
            .find(|(_, id)| id.as_str() == participant_id)
            .map(|(pos, _)| *pos)
    }

    pub fn time_of(&self, participant_id: &str) -> Option<Duration> {
        self.times.get(participant_id).copied()
    }

    /// Participant ids by ascending position.
    pub fn finishing_order(&self) -> Vec<&str> {
        self.positions.values().map(String::as_str).collect()
    }

    pub fn is_complete(&self, total_participants: usize) -> bool {
        self.positions.len() == total_participants && self.times.len() == total_participants
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
