//! Wagers and per-bet-type settlement.
//!
//! The bet type lives in the [`Selection`] sum type; `is_winning` and
//! `payout` dispatch on it. A wager never touches money itself: the
//! ledger debits on placement and credits after settlement.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use crate::racing::result::RaceResult;
use crate::types::{new_id, WagerState};

/// Finishing positions that pay a PLACE bet.
pub const PLACE_POSITIONS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BetType {
    Win,
    Place,
    Exacta,
    Quinella,
    Trifecta,
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetType::Win => write!(f, "WIN"),
            BetType::Place => write!(f, "PLACE"),
            BetType::Exacta => write!(f, "EXACTA"),
            BetType::Quinella => write!(f, "QUINELLA"),
            BetType::Trifecta => write!(f, "TRIFECTA"),
        }
    }
}

/// What the bettor picked, by participant id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// Finishes first.
    Win(String),
    /// Finishes in the first [`PLACE_POSITIONS`].
    Place(String),
    /// First and second, in order.
    Exacta { first: String, second: String },
    /// First and second, either order.
    Quinella(String, String),
    /// First, second and third, in order.
    Trifecta { first: String, second: String, third: String },
}

impl Selection {
    pub fn bet_type(&self) -> BetType {
        match self {
            Selection::Win(_) => BetType::Win,
            Selection::Place(_) => BetType::Place,
            Selection::Exacta { .. } => BetType::Exacta,
            Selection::Quinella(..) => BetType::Quinella,
            Selection::Trifecta { .. } => BetType::Trifecta,
        }
    }

    /// Participant ids named by the selection, in selection order.
    pub fn legs(&self) -> Vec<&str> {
        match self {
            Selection::Win(p) | Selection::Place(p) => vec![p.as_str()],
            Selection::Exacta { first, second } => vec![first.as_str(), second.as_str()],
            Selection::Quinella(a, b) => vec![a.as_str(), b.as_str()],
            Selection::Trifecta { first, second, third } => {
                vec![first.as_str(), second.as_str(), third.as_str()]
            }
        }
    }

    /// Every leg named and no participant picked twice.
    pub fn is_well_formed(&self) -> bool {
        let legs = self.legs();
        let distinct: HashSet<&str> = legs.iter().copied().collect();
        legs.iter().all(|l| !l.is_empty()) && distinct.len() == legs.len()
    }

    pub fn is_winning(&self, result: &RaceResult) -> bool {
        let at = |pos: u32| result.participant_at(pos);
        match self {
            Selection::Win(p) => result.winner() == Some(p.as_str()),
            Selection::Place(p) => result
                .position_of(p)
                .is_some_and(|pos| pos <= PLACE_POSITIONS),
            Selection::Exacta { first, second } => {
                at(1) == Some(first.as_str()) && at(2) == Some(second.as_str())
            }
            Selection::Quinella(a, b) => match (at(1), at(2)) {
                (Some(x), Some(y)) => {
                    let (a, b) = (a.as_str(), b.as_str());
                    (x == a && y == b) || (x == b && y == a)
                }
                _ => false,
            },
            Selection::Trifecta { first, second, third } => {
                at(1) == Some(first.as_str())
                    && at(2) == Some(second.as_str())
                    && at(3) == Some(third.as_str())
            }
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = |id: &str| id.chars().take(8).collect::<String>();
        let legs: Vec<String> = self.legs().into_iter().map(short).collect();
        let sep = if self.bet_type() == BetType::Quinella { "/" } else { "-" };
        write!(f, "{} {}", self.bet_type(), legs.join(sep))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wager {
    pub id: String,
    pub bettor_id: String,
    pub race_id: String,
    pub selection: Selection,
    pub stake: Decimal,
    /// Odds locked in at placement.
    pub applied_odds: Decimal,
    pub placed_at: NaiveDateTime,
    state: WagerState,
    payout: Decimal,
}

impl Wager {
    pub fn new(
        bettor_id: &str,
        race_id: &str,
        selection: Selection,
        stake: Decimal,
        applied_odds: Decimal,
        placed_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: new_id(),
            bettor_id: bettor_id.to_string(),
            race_id: race_id.to_string(),
            selection,
            stake,
            applied_odds,
            placed_at,
            state: WagerState::Pending,
            payout: Decimal::ZERO,
        }
    }

    pub fn bet_type(&self) -> BetType {
        self.selection.bet_type()
    }

    pub fn state(&self) -> WagerState {
        self.state
    }

    /// Amount due to the bettor once settled (0 until then).
    pub fn paid_amount(&self) -> Decimal {
        self.payout
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Positive stake and a well-formed selection. Race state and funds
    /// are checked by the caller and the ledger.
    pub fn validate(&self) -> bool {
        self.stake > Decimal::ZERO && self.selection.is_well_formed()
    }

    pub fn is_winning(&self, result: &RaceResult) -> bool {
        self.selection.is_winning(result)
    }

    /// Stake × applied odds when winning, else zero.
    pub fn payout(&self, result: &RaceResult) -> Decimal {
        if self.is_winning(result) {
            (self.stake * self.applied_odds).max(Decimal::ZERO)
        } else {
            Decimal::ZERO
        }
    }

    /// Pending → Confirmed, once the ledger has taken the stake.
    pub(crate) fn confirm(&mut self) -> bool {
        self.advance(self.state == WagerState::Pending, WagerState::Confirmed)
    }

    /// Resolve against a result. Does nothing unless active or when the
    /// result belongs to another race.
    pub fn settle(&mut self, result: &RaceResult) -> bool {
        if !self.is_active() || result.race_id != self.race_id {
            return false;
        }
        if self.is_winning(result) {
            self.payout = self.payout(result);
            self.advance(true, WagerState::Won)
        } else {
            self.payout = Decimal::ZERO;
            self.advance(true, WagerState::Lost)
        }
    }

    pub fn cancel(&mut self) -> bool {
        self.advance(self.state.is_cancelable(), WagerState::Cancelled)
    }

    /// Administrative refund (aborted race).
    pub fn refund(&mut self) -> bool {
        self.advance(self.is_active(), WagerState::Refunded)
    }

    /// Won → Paid.
    pub fn mark_paid(&mut self) -> bool {
        self.advance(self.state == WagerState::Won, WagerState::Paid)
    }

    fn advance(&mut self, allowed: bool, to: WagerState) -> bool {
        if !allowed {
            return false;
        }
        debug!(wager = %self.id, from = %self.state, to = %to, "Wager state change");
        self.state = to;
        true
    }
}

impl fmt::Display for Wager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ${:.2} @ {} [{}]",
            self.selection, self.stake, self.applied_odds, self.state
        )?;
        if self.state.is_processed() {
            write!(f, " payout ${:.2}", self.payout)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
