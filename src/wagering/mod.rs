//! Wagering: bets, their pricing, and the bettor ledger.

pub mod ledger;
pub mod pricing;
pub mod wager;

pub use ledger::{BalanceSheet, Bettor, Ledger, LedgerSettlement};
pub use wager::{BetType, Selection, Wager};
