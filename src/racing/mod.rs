//! Racing: entries, eligibility, the race state machine, results and odds.

pub mod eligibility;
pub mod odds;
pub mod participant;
pub mod race;
pub mod result;

pub use eligibility::EligibilityChecker;
pub use odds::{pairing_odds, QuotedOdds};
pub use participant::Participant;
pub use race::Race;
pub use result::RaceResult;
