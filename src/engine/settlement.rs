//! Settlement: fans a race outcome out over every bettor ledger.
//!
//! Each ledger is locked on its own while it settles, so no lock is
//! ever held across unrelated bettors.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::engine::lock;
use crate::racing::result::RaceResult;
use crate::wagering::ledger::{Ledger, LedgerSettlement};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementKind {
    /// Wagers resolved against an official result.
    Result,
    /// Stakes returned because the race was aborted.
    Refund,
    /// The outcome was rejected by the race; nothing was settled.
    Rejected,
}

/// Summary of one race's settlement across all bettors.
#[derive(Debug, Clone)]
pub struct SettlementReport {
    pub race_id: String,
    pub kind: SettlementKind,
    /// Bettors with at least one wager touched.
    pub bettors: usize,
    pub totals: LedgerSettlement,
    pub timestamp: NaiveDateTime,
}

impl SettlementReport {
    pub fn rejected(race_id: &str, timestamp: NaiveDateTime) -> Self {
        Self {
            race_id: race_id.to_string(),
            kind: SettlementKind::Rejected,
            bettors: 0,
            totals: LedgerSettlement::default(),
            timestamp,
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.kind == SettlementKind::Rejected
    }

    pub fn total_paid(&self) -> Decimal {
        self.totals.credited
    }
}

impl fmt::Display for SettlementReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SettlementKind::Rejected => write!(f, "Race {}: outcome rejected", self.race_id),
            SettlementKind::Refund => write!(
                f,
                "Race {}: refunded {} wagers to {} bettors (${:.2})",
                self.race_id, self.totals.refunded, self.bettors, self.totals.credited,
            ),
            SettlementKind::Result => write!(
                f,
                "Race {}: settled {} wagers for {} bettors, {} won / {} lost, paid ${:.2}",
                self.race_id,
                self.totals.settled,
                self.bettors,
                self.totals.won,
                self.totals.lost,
                self.totals.credited,
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Settler
// ---------------------------------------------------------------------------

pub struct Settler;

impl Settler {
    /// Settle every ledger's wagers on the result's race and pay winners.
    pub fn settle(
        result: &RaceResult,
        ledgers: &[Arc<Mutex<Ledger>>],
        timestamp: NaiveDateTime,
    ) -> SettlementReport {
        let report = Self::fan_out(&result.race_id, SettlementKind::Result, ledgers, timestamp, |l| {
            l.settle_race(result)
        });
        info!(
            race_id = %report.race_id,
            winner = ?result.winner(),
            settled = report.totals.settled,
            won = report.totals.won,
            paid = format!("${:.2}", report.totals.credited),
            "Race settled"
        );
        report
    }

    /// Refund every active wager on an aborted race.
    pub fn refund(race_id: &str, ledgers: &[Arc<Mutex<Ledger>>], timestamp: NaiveDateTime) -> SettlementReport {
        let report = Self::fan_out(race_id, SettlementKind::Refund, ledgers, timestamp, |l| {
            l.refund_race(race_id)
        });
        info!(
            race_id,
            refunded = report.totals.refunded,
            credited = format!("${:.2}", report.totals.credited),
            "Race refunded"
        );
        report
    }

    /// Refund every active wager with a scratched runner among its legs.
    pub fn scratch(
        race_id: &str,
        participant_id: &str,
        ledgers: &[Arc<Mutex<Ledger>>],
        timestamp: NaiveDateTime,
    ) -> SettlementReport {
        let report = Self::fan_out(race_id, SettlementKind::Refund, ledgers, timestamp, |l| {
            l.refund_runner(race_id, participant_id)
        });
        if report.totals.refunded > 0 {
            info!(
                race_id,
                participant_id,
                refunded = report.totals.refunded,
                credited = format!("${:.2}", report.totals.credited),
                "Scratched runner refunded"
            );
        }
        report
    }

    fn fan_out(
        race_id: &str,
        kind: SettlementKind,
        ledgers: &[Arc<Mutex<Ledger>>],
        timestamp: NaiveDateTime,
        mut apply: impl FnMut(&mut Ledger) -> LedgerSettlement,
    ) -> SettlementReport {
        let mut report = SettlementReport {
            race_id: race_id.to_string(),
            kind,
            bettors: 0,
            totals: LedgerSettlement::default(),
            timestamp,
        };
        for ledger in ledgers {
            let mut guard = lock(ledger);
            let outcome = apply(&mut *guard);
            if outcome.settled + outcome.refunded > 0 {
                report.bettors += 1;
                report.totals.absorb(&outcome);
            }
        }
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
