//! Bettor ledger: balance, stake limits, placement and settlement credit.
//!
//! The ledger is the only place a bettor's balance changes. Placement
//! checks funds and debits in the same call, so sequential placements
//! can never overdraw the account.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::config::WageringConfig;
use crate::racing::result::RaceResult;
use crate::types::{new_id, WagerState};
use crate::wagering::wager::Wager;

// ---------------------------------------------------------------------------
// Bettor
// ---------------------------------------------------------------------------

/// Account-side state of one bettor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bettor {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub balance: Decimal,
    /// Largest stake accepted on a single wager.
    pub stake_limit: Decimal,
    pub total_staked: Decimal,
    pub total_won: Decimal,
    pub wager_count: u64,
    history: Vec<Wager>,
}

impl Bettor {
    pub fn new(name: &str, stake_limit: Decimal) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            active: true,
            balance: Decimal::ZERO,
            stake_limit,
            total_staked: Decimal::ZERO,
            total_won: Decimal::ZERO,
            wager_count: 0,
            history: Vec::new(),
        }
    }

    /// Every wager ever accepted, in placement order.
    pub fn history(&self) -> &[Wager] {
        &self.history
    }
}

impl fmt::Display for Bettor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} balance=${:.2} limit=${:.2} wagers={}{}",
            self.name,
            self.balance,
            self.stake_limit,
            self.wager_count,
            if self.active { "" } else { " (inactive)" },
        )
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Lifetime betting figures for one bettor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub total_staked: Decimal,
    pub total_won: Decimal,
    /// won − staked
    pub net: Decimal,
    pub wager_count: u64,
    /// Winning wagers as a percentage of settled ones.
    pub win_rate: f64,
}

impl fmt::Display for BalanceSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.net >= Decimal::ZERO { "+" } else { "" };
        write!(
            f,
            "staked=${:.2} won=${:.2} net={sign}{:.2} wagers={} win_rate={:.1}%",
            self.total_staked, self.total_won, self.net, self.wager_count, self.win_rate,
        )
    }
}

/// What one ledger did with a race outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerSettlement {
    pub settled: usize,
    pub won: usize,
    pub lost: usize,
    pub refunded: usize,
    pub credited: Decimal,
}

impl LedgerSettlement {
    pub fn absorb(&mut self, other: &LedgerSettlement) {
        self.settled += other.settled;
        self.won += other.won;
        self.lost += other.lost;
        self.refunded += other.refunded;
        self.credited += other.credited;
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Ledger {
    bettor: Bettor,
    min_stake: Decimal,
}

impl Ledger {
    pub fn new(bettor: Bettor, rules: &WageringConfig) -> Self {
        Self {
            bettor,
            min_stake: rules.min_stake,
        }
    }

    /// Read-only view of the account.
    pub fn bettor(&self) -> &Bettor {
        &self.bettor
    }

    pub fn id(&self) -> &str {
        &self.bettor.id
    }

    pub fn balance(&self) -> Decimal {
        self.bettor.balance
    }

    pub fn min_stake(&self) -> Decimal {
        self.min_stake
    }

    pub fn set_active(&mut self, active: bool) {
        info!(bettor = %self.bettor.name, active, "Account status change");
        self.bettor.active = active;
    }

    pub fn set_stake_limit(&mut self, limit: Decimal) -> bool {
        if limit < self.min_stake {
            return false;
        }
        self.bettor.stake_limit = limit;
        true
    }

    // -- Funds ------------------------------------------------------------

    pub fn deposit(&mut self, amount: Decimal) -> bool {
        if amount <= Decimal::ZERO || !self.bettor.active {
            return false;
        }
        let Some(balance) = self.bettor.balance.checked_add(amount) else {
            warn!(bettor = %self.bettor.name, %amount, "Deposit rejected: balance overflow");
            return false;
        };
        self.bettor.balance = balance;
        debug!(bettor = %self.bettor.name, %amount, balance = %self.bettor.balance, "Deposit");
        true
    }

    pub fn withdraw(&mut self, amount: Decimal) -> bool {
        if amount <= Decimal::ZERO || amount > self.bettor.balance || !self.bettor.active {
            return false;
        }
        self.bettor.balance -= amount;
        debug!(bettor = %self.bettor.name, %amount, balance = %self.bettor.balance, "Withdrawal");
        true
    }

    /// Credit a payout or refund.
    pub fn credit_winnings(&mut self, amount: Decimal) -> bool {
        if amount <= Decimal::ZERO {
            return false;
        }
        let (Some(balance), Some(total_won)) = (
            self.bettor.balance.checked_add(amount),
            self.bettor.total_won.checked_add(amount),
        ) else {
            warn!(bettor = %self.bettor.name, %amount, "Credit rejected: balance overflow");
            return false;
        };
        self.bettor.balance = balance;
        self.bettor.total_won = total_won;
        debug!(bettor = %self.bettor.name, %amount, balance = %self.bettor.balance, "Credited");
        true
    }

    // -- Wagers -----------------------------------------------------------

    /// Accept a pending wager: check account, stake bounds and funds,
    /// then debit the stake and confirm the wager.
    pub fn place_wager(&mut self, mut wager: Wager) -> bool {
        let reason = if !self.bettor.active {
            Some("account inactive")
        } else if wager.bettor_id != self.bettor.id {
            Some("wager belongs to another bettor")
        } else if wager.state() != WagerState::Pending {
            Some("wager not pending")
        } else if !wager.validate() {
            Some("invalid wager")
        } else if wager.stake < self.min_stake {
            Some("stake below minimum")
        } else if wager.stake > self.bettor.stake_limit {
            Some("stake above limit")
        } else if wager.stake > self.bettor.balance {
            Some("insufficient balance")
        } else {
            None
        };

        if let Some(reason) = reason {
            warn!(
                bettor = %self.bettor.name,
                stake = %wager.stake,
                balance = %self.bettor.balance,
                reason,
                "Wager rejected"
            );
            return false;
        }

        wager.confirm();
        self.bettor.balance -= wager.stake;
        self.bettor.total_staked += wager.stake;
        self.bettor.wager_count += 1;
        info!(
            bettor = %self.bettor.name,
            wager = %wager,
            balance = %self.bettor.balance,
            "Wager placed"
        );
        self.bettor.history.push(wager);
        true
    }

    /// Cancel an active wager and refund its stake.
    pub fn cancel_wager(&mut self, wager_id: &str) -> bool {
        let Some(wager) = self.bettor.history.iter_mut().find(|w| w.id == wager_id) else {
            return false;
        };
        if !wager.cancel() {
            return false;
        }
        let stake = wager.stake;
        self.credit_winnings(stake)
    }

    /// Settle every active wager on the result's race and pay the winners.
    pub fn settle_race(&mut self, result: &RaceResult) -> LedgerSettlement {
        let mut outcome = LedgerSettlement::default();
        let mut payouts = Vec::new();

        for wager in self.bettor.history.iter_mut().filter(|w| w.race_id == result.race_id) {
            if !wager.settle(result) {
                continue;
            }
            outcome.settled += 1;
            if wager.state() == WagerState::Won {
                outcome.won += 1;
                let amount = wager.paid_amount();
                if amount > Decimal::ZERO {
                    payouts.push(amount);
                }
                wager.mark_paid();
            } else {
                outcome.lost += 1;
            }
        }

        for amount in payouts {
            if self.credit_winnings(amount) {
                outcome.credited += amount;
            }
        }

        if outcome.settled > 0 {
            info!(
                bettor = %self.bettor.name,
                race_id = %result.race_id,
                won = outcome.won,
                lost = outcome.lost,
                credited = %outcome.credited,
                balance = %self.bettor.balance,
                "Race settled for bettor"
            );
        }
        outcome
    }

    /// Refund every active wager on an aborted race.
    pub fn refund_race(&mut self, race_id: &str) -> LedgerSettlement {
        self.refund_where(race_id, |_| true)
    }

    /// Refund every active wager on the race that has the runner as a leg.
    pub fn refund_runner(&mut self, race_id: &str, participant_id: &str) -> LedgerSettlement {
        self.refund_where(race_id, |w| w.selection.legs().contains(&participant_id))
    }

    fn refund_where(&mut self, race_id: &str, pick: impl Fn(&Wager) -> bool) -> LedgerSettlement {
        let mut outcome = LedgerSettlement::default();
        let mut refunds = Vec::new();

        for wager in self.bettor.history.iter_mut().filter(|w| w.race_id == race_id) {
            if pick(wager) && wager.refund() {
                outcome.refunded += 1;
                refunds.push(wager.stake);
            }
        }
        for amount in refunds {
            if self.credit_winnings(amount) {
                outcome.credited += amount;
            }
        }
        outcome
    }

    // -- Queries ----------------------------------------------------------

    pub fn balance_sheet(&self) -> BalanceSheet {
        let processed = self.bettor.history.iter().filter(|w| w.state().is_processed()).count();
        let won = self
            .bettor
            .history
            .iter()
            .filter(|w| matches!(w.state(), WagerState::Won | WagerState::Paid))
            .count();
        let win_rate = if processed == 0 {
            0.0
        } else {
            won as f64 / processed as f64 * 100.0
        };

        BalanceSheet {
            total_staked: self.bettor.total_staked,
            total_won: self.bettor.total_won,
            net: self.bettor.total_won - self.bettor.total_staked,
            wager_count: self.bettor.wager_count,
            win_rate,
        }
    }

    pub fn active_wagers(&self) -> Vec<&Wager> {
        self.bettor.history.iter().filter(|w| w.is_active()).collect()
    }

    pub fn wagers_by_state(&self, state: WagerState) -> Vec<&Wager> {
        self.bettor.history.iter().filter(|w| w.state() == state).collect()
    }

    pub fn wager(&self, wager_id: &str) -> Option<&Wager> {
        self.bettor.history.iter().find(|w| w.id == wager_id)
    }

    pub fn history(&self) -> &[Wager] {
        self.bettor.history()
    }

    /// Hand the account back, e.g. for persistence.
    pub fn into_bettor(self) -> Bettor {
        self.bettor
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
