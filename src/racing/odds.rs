//! Advisory odds from pairing history.
//!
//! A pairing's rating blends the jockey's and the horse's records
//! (60/40). Each side's percentage weighs wins three times as heavily
//! as top-three finishes. The rating maps onto a fixed tier table;
//! pairings with no races on either side get the debutant price.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{CareerStats, Horse, Jockey};

const JOCKEY_WEIGHT: f64 = 0.6;
const HORSE_WEIGHT: f64 = 0.4;
const WIN_SHARE: f64 = 0.75;
const PLACE_SHARE: f64 = 0.25;

/// Price for a pairing with no history at all.
pub const DEBUTANT_ODDS: Decimal = dec!(10.0);

/// (minimum rating %, odds), best tier first.
const TIERS: [(f64, Decimal); 4] = [
    (40.0, dec!(2.5)),
    (25.0, dec!(4.0)),
    (15.0, dec!(6.0)),
    (10.0, dec!(8.0)),
];
const OUTSIDER_ODDS: Decimal = dec!(12.0);

/// Quoted price for one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotedOdds {
    pub participant_id: String,
    pub competitor_number: u32,
    pub rating: f64,
    pub odds: Decimal,
}

impl fmt::Display for QuotedOdds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} @ {} (rating {:.1}%)", self.competitor_number, self.odds, self.rating)
    }
}

/// Blended percentage for one side of the pairing.
fn blended_pct(stats: &CareerStats) -> f64 {
    WIN_SHARE * stats.win_pct() + PLACE_SHARE * stats.place_pct()
}

/// Pairing rating in percent (0 to 100).
pub fn pairing_rating(horse: &Horse, jockey: &Jockey) -> f64 {
    JOCKEY_WEIGHT * blended_pct(&jockey.stats()) + HORSE_WEIGHT * blended_pct(&horse.stats())
}

/// Tiered odds for a rating.
pub fn odds_for_rating(rating: f64) -> Decimal {
    TIERS
        .iter()
        .find(|(min, _)| rating >= *min)
        .map(|(_, odds)| *odds)
        .unwrap_or(OUTSIDER_ODDS)
}

/// Quoted odds for a horse/jockey pairing.
pub fn pairing_odds(horse: &Horse, jockey: &Jockey) -> Decimal {
    if horse.stats().races + jockey.stats().races == 0 {
        return DEBUTANT_ODDS;
    }
    odds_for_rating(pairing_rating(horse, jockey))
}
