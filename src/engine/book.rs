//! The book: registry of the stable, the race card and bettor accounts.
//!
//! Every race and every ledger lives behind its own `Arc<Mutex<_>>`.
//! Placement locks the race, then the ledger; nothing else nests. The
//! registries themselves are only held long enough to clone a handle.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::{AppConfig, RacingConfig, WageringConfig};
use crate::engine::settlement::{SettlementReport, Settler};
use crate::engine::{lock, read, write};
use crate::racing::eligibility::EligibilityChecker;
use crate::racing::odds::QuotedOdds;
use crate::racing::participant::Participant;
use crate::racing::race::Race;
use crate::racing::result::RaceResult;
use crate::storage::Snapshot;
use crate::types::{Horse, Jockey, RaceState, TurfError};
use crate::wagering::ledger::{BalanceSheet, Bettor, Ledger};
use crate::wagering::pricing::applied_odds;
use crate::wagering::wager::{Selection, Wager};

type Shared<T> = Arc<Mutex<T>>;

pub struct Book {
    horses: Mutex<HashMap<String, Horse>>,
    jockeys: Mutex<HashMap<String, Jockey>>,
    races: RwLock<HashMap<String, Shared<Race>>>,
    ledgers: RwLock<HashMap<String, Shared<Ledger>>>,
    checker: EligibilityChecker,
    clock: Arc<dyn Clock>,
    racing: RacingConfig,
    wagering: WageringConfig,
}

impl Book {
    pub fn new(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            horses: Mutex::new(HashMap::new()),
            jockeys: Mutex::new(HashMap::new()),
            races: RwLock::new(HashMap::new()),
            ledgers: RwLock::new(HashMap::new()),
            checker: EligibilityChecker::new(config.racing.clone(), clock.clone()),
            clock,
            racing: config.racing.clone(),
            wagering: config.wagering.clone(),
        }
    }

    /// Rebuild a book from a saved snapshot.
    pub fn from_snapshot(snapshot: Snapshot, config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let book = Self::new(config, clock);
        {
            let mut horses = lock(&book.horses);
            for horse in snapshot.horses {
                horses.insert(horse.id.clone(), horse);
            }
            let mut jockeys = lock(&book.jockeys);
            for jockey in snapshot.jockeys {
                jockeys.insert(jockey.id.clone(), jockey);
            }
            let mut races = write(&book.races);
            for race in snapshot.races {
                races.insert(race.id.clone(), Arc::new(Mutex::new(race)));
            }
            let mut ledgers = write(&book.ledgers);
            for bettor in snapshot.bettors {
                ledgers.insert(bettor.id.clone(), Arc::new(Mutex::new(Ledger::new(bettor, &book.wagering))));
            }
        }
        book
    }

    /// Copy of everything the book holds, for persistence.
    pub fn snapshot(&self) -> Snapshot {
        let mut horses: Vec<Horse> = lock(&self.horses).values().cloned().collect();
        horses.sort_by(|a, b| a.name.cmp(&b.name));
        let mut jockeys: Vec<Jockey> = lock(&self.jockeys).values().cloned().collect();
        jockeys.sort_by(|a, b| a.name.cmp(&b.name));

        let mut races: Vec<Race> = self.race_handles().iter().map(|r| lock(r).clone()).collect();
        races.sort_by_key(|r| r.scheduled_at);
        let mut bettors: Vec<Bettor> = self
            .ledger_handles()
            .iter()
            .map(|l| lock(l).bettor().clone())
            .collect();
        bettors.sort_by(|a, b| a.name.cmp(&b.name));

        Snapshot {
            horses,
            jockeys,
            races,
            bettors,
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    // -- Stable -----------------------------------------------------------

    pub fn register_horse(&self, horse: Horse) -> String {
        let id = horse.id.clone();
        info!(horse = %horse, "Horse registered");
        lock(&self.horses).insert(id.clone(), horse);
        id
    }

    pub fn register_jockey(&self, jockey: Jockey) -> String {
        let id = jockey.id.clone();
        info!(jockey = %jockey, "Jockey registered");
        lock(&self.jockeys).insert(id.clone(), jockey);
        id
    }

    pub fn horse(&self, horse_id: &str) -> Result<Horse, TurfError> {
        lock(&self.horses)
            .get(horse_id)
            .cloned()
            .ok_or_else(|| TurfError::HorseNotFound(horse_id.to_string()))
    }

    pub fn jockey(&self, jockey_id: &str) -> Result<Jockey, TurfError> {
        lock(&self.jockeys)
            .get(jockey_id)
            .cloned()
            .ok_or_else(|| TurfError::JockeyNotFound(jockey_id.to_string()))
    }

    // -- Race card --------------------------------------------------------

    /// Put a race on the card with the configured roster rules.
    pub fn schedule_race(&self, name: &str, scheduled_at: NaiveDateTime, distance: u32) -> String {
        let race = Race::with_rules(name, scheduled_at, distance, &self.racing);
        let id = race.id.clone();
        info!(race = %race, "Race scheduled");
        write(&self.races).insert(id.clone(), Arc::new(Mutex::new(race)));
        id
    }

    /// Copy of a race as it stands now.
    pub fn race(&self, race_id: &str) -> Result<Race, TurfError> {
        Ok(lock(&*self.race_handle(race_id)?).clone())
    }

    /// Enter a registered horse with a registered jockey. The pairing is
    /// confirmed on entry; `Ok(false)` means the race refused it.
    pub fn enter(
        &self,
        race_id: &str,
        horse_id: &str,
        jockey_id: &str,
        competitor_number: u32,
        assigned_weight: Decimal,
    ) -> Result<bool, TurfError> {
        let race = self.race_handle(race_id)?;
        let horse = self.horse(horse_id)?;
        let jockey = self.jockey(jockey_id)?;

        let mut participant = Participant::new(horse, jockey, competitor_number, assigned_weight);
        participant.confirm();
        let accepted = lock(&race).add_participant(participant, &self.checker);
        Ok(accepted)
    }

    /// Scratch a runner. Active wagers with the runner as a leg are
    /// refunded, since the runner can no longer finish.
    pub fn withdraw(&self, race_id: &str, participant_id: &str) -> Result<bool, TurfError> {
        let race = self.race_handle(race_id)?;
        if !lock(&race).withdraw_participant(participant_id) {
            return Ok(false);
        }
        Settler::scratch(race_id, participant_id, &self.ledger_handles(), self.now());
        Ok(true)
    }

    pub fn open_betting(&self, race_id: &str) -> Result<bool, TurfError> {
        Ok(lock(&*self.race_handle(race_id)?).open_betting(self.clock()))
    }

    pub fn close_betting(&self, race_id: &str) -> Result<bool, TurfError> {
        Ok(lock(&*self.race_handle(race_id)?).close_betting())
    }

    pub fn start_race(&self, race_id: &str) -> Result<bool, TurfError> {
        Ok(lock(&*self.race_handle(race_id)?).start(self.clock()))
    }

    /// Current WIN prices for every runner.
    pub fn quote(&self, race_id: &str) -> Result<Vec<QuotedOdds>, TurfError> {
        Ok(lock(&*self.race_handle(race_id)?).current_odds())
    }

    /// Attach the official result, copy the new history into the stable
    /// and settle every ledger against it.
    pub fn record_result(&self, race_id: &str, result: RaceResult) -> Result<SettlementReport, TurfError> {
        let race = self.race_handle(race_id)?;
        let (official, finishers) = {
            let mut race = lock(&race);
            if !race.record_result(result) {
                return Ok(SettlementReport::rejected(race_id, self.now()));
            }
            let Some(official) = race.result().cloned() else {
                return Ok(SettlementReport::rejected(race_id, self.now()));
            };
            let finishers: Vec<Participant> = race
                .participants()
                .iter()
                .filter(|p| official.position_of(&p.id).is_some())
                .cloned()
                .collect();
            (official, finishers)
        };

        self.sync_history(race_id, &finishers);
        Ok(Settler::settle(&official, &self.ledger_handles(), self.now()))
    }

    /// Cancel a race and refund every stake on it.
    pub fn cancel_race(&self, race_id: &str) -> Result<SettlementReport, TurfError> {
        self.abort(race_id, Race::cancel)
    }

    /// Suspend a race and refund every stake on it.
    pub fn suspend_race(&self, race_id: &str) -> Result<SettlementReport, TurfError> {
        self.abort(race_id, Race::suspend)
    }

    fn abort(&self, race_id: &str, apply: fn(&mut Race) -> bool) -> Result<SettlementReport, TurfError> {
        let race = self.race_handle(race_id)?;
        if !apply(&mut *lock(&race)) {
            return Ok(SettlementReport::rejected(race_id, self.now()));
        }
        Ok(Settler::refund(race_id, &self.ledger_handles(), self.now()))
    }

    /// Registry copies of horses and jockeys pick up the record the race
    /// wrote on its own copies.
    fn sync_history(&self, race_id: &str, finishers: &[Participant]) {
        let mut horses = lock(&self.horses);
        for p in finishers {
            let Some(record) = p.horse.history().iter().find(|r| r.race_id == race_id) else {
                continue;
            };
            if let Some(horse) = horses.get_mut(&p.horse.id) {
                if !horse.history().iter().any(|r| r.race_id == race_id) {
                    horse.record_race(record.clone());
                }
            }
        }
        drop(horses);

        let mut jockeys = lock(&self.jockeys);
        for p in finishers {
            let Some(record) = p.jockey.history().iter().find(|r| r.race_id == race_id) else {
                continue;
            };
            if let Some(jockey) = jockeys.get_mut(&p.jockey.id) {
                if !jockey.history().iter().any(|r| r.race_id == race_id) {
                    jockey.record_race(record.clone());
                }
            }
        }
    }

    // -- Accounts ---------------------------------------------------------

    /// Open an account with the default stake limit and an initial deposit.
    pub fn open_account(&self, name: &str, initial_deposit: Decimal) -> String {
        let mut ledger = Ledger::new(Bettor::new(name, self.wagering.default_stake_limit), &self.wagering);
        if initial_deposit > Decimal::ZERO {
            ledger.deposit(initial_deposit);
        }
        let id = ledger.id().to_string();
        info!(bettor = name, balance = %ledger.balance(), "Account opened");
        write(&self.ledgers).insert(id.clone(), Arc::new(Mutex::new(ledger)));
        id
    }

    pub fn deposit(&self, bettor_id: &str, amount: Decimal) -> Result<bool, TurfError> {
        Ok(lock(&*self.ledger_handle(bettor_id)?).deposit(amount))
    }

    pub fn withdraw_funds(&self, bettor_id: &str, amount: Decimal) -> Result<bool, TurfError> {
        Ok(lock(&*self.ledger_handle(bettor_id)?).withdraw(amount))
    }

    pub fn set_stake_limit(&self, bettor_id: &str, limit: Decimal) -> Result<bool, TurfError> {
        Ok(lock(&*self.ledger_handle(bettor_id)?).set_stake_limit(limit))
    }

    pub fn set_active(&self, bettor_id: &str, active: bool) -> Result<(), TurfError> {
        lock(&*self.ledger_handle(bettor_id)?).set_active(active);
        Ok(())
    }

    pub fn bettor(&self, bettor_id: &str) -> Result<Bettor, TurfError> {
        Ok(lock(&*self.ledger_handle(bettor_id)?).bettor().clone())
    }

    pub fn balance_sheet(&self, bettor_id: &str) -> Result<BalanceSheet, TurfError> {
        Ok(lock(&*self.ledger_handle(bettor_id)?).balance_sheet())
    }

    pub fn wager(&self, bettor_id: &str, wager_id: &str) -> Result<Option<Wager>, TurfError> {
        Ok(lock(&*self.ledger_handle(bettor_id)?).wager(wager_id).cloned())
    }

    // -- Betting ----------------------------------------------------------

    /// Price and place a bet. Returns the wager id, or `None` when the
    /// race is not taking bets, a leg is not a runner, or the ledger
    /// refuses the stake.
    pub fn place_bet(
        &self,
        bettor_id: &str,
        race_id: &str,
        selection: Selection,
        stake: Decimal,
    ) -> Result<Option<String>, TurfError> {
        let race = self.race_handle(race_id)?;
        let ledger = self.ledger_handle(bettor_id)?;

        let race = lock(&race);
        if race.state() != RaceState::BettingOpen {
            warn!(race = %race.name, state = %race.state(), "Bet rejected: betting not open");
            return Ok(None);
        }
        let Some(odds) = applied_odds(&race.current_odds(), &selection) else {
            warn!(race = %race.name, selection = %selection, "Bet rejected: selection not a runner");
            return Ok(None);
        };

        let wager = Wager::new(bettor_id, race_id, selection, stake, odds, self.now());
        let wager_id = wager.id.clone();
        let placed = lock(&ledger).place_wager(wager);
        Ok(placed.then_some(wager_id))
    }

    /// Cancel a bet while its race is still taking bets.
    pub fn cancel_bet(&self, bettor_id: &str, wager_id: &str) -> Result<bool, TurfError> {
        let ledger = self.ledger_handle(bettor_id)?;
        let Some(race_id) = lock(&ledger).wager(wager_id).map(|w| w.race_id.clone()) else {
            return Ok(false);
        };

        let race = self.race_handle(&race_id)?;
        let race = lock(&race);
        if race.state() != RaceState::BettingOpen {
            return Ok(false);
        }
        let cancelled = lock(&ledger).cancel_wager(wager_id);
        Ok(cancelled)
    }

    // -- Handles ----------------------------------------------------------

    fn race_handle(&self, race_id: &str) -> Result<Shared<Race>, TurfError> {
        read(&self.races)
            .get(race_id)
            .cloned()
            .ok_or_else(|| TurfError::RaceNotFound(race_id.to_string()))
    }

    fn ledger_handle(&self, bettor_id: &str) -> Result<Shared<Ledger>, TurfError> {
        read(&self.ledgers)
            .get(bettor_id)
            .cloned()
            .ok_or_else(|| TurfError::BettorNotFound(bettor_id.to_string()))
    }

    fn race_handles(&self) -> Vec<Shared<Race>> {
        read(&self.races).values().cloned().collect()
    }

    fn ledger_handles(&self) -> Vec<Shared<Ledger>> {
        read(&self.ledgers).values().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
