//! Applied odds for each bet type, derived from the race's WIN quotes.
//!
//! PLACE pays a third of the WIN profit. Multi-leg bets multiply their
//! legs' WIN odds; QUINELLA halves that since either order pays.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::racing::odds::QuotedOdds;
use crate::wagering::wager::Selection;

const PLACE_PROFIT_SHARE: Decimal = dec!(3);
const MIN_PLACE_ODDS: Decimal = dec!(1.1);

/// Odds to lock into a wager, or `None` if a leg is not a quoted runner.
pub fn applied_odds(quotes: &[QuotedOdds], selection: &Selection) -> Option<Decimal> {
    let win = |id: &str| quotes.iter().find(|q| q.participant_id == id).map(|q| q.odds);

    let legs = selection
        .legs()
        .into_iter()
        .map(win)
        .collect::<Option<Vec<Decimal>>>()?;

    let odds = match selection {
        Selection::Win(_) => legs[0],
        Selection::Place(_) => {
            let place = Decimal::ONE + (legs[0] - Decimal::ONE) / PLACE_PROFIT_SHARE;
            place.round_dp(2).max(MIN_PLACE_ODDS)
        }
        Selection::Exacta { .. } | Selection::Trifecta { .. } => legs.iter().product(),
        Selection::Quinella(..) => legs.iter().product::<Decimal>() / dec!(2),
    };
    Some(odds)
}
