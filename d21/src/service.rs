//! Off-chain registry service.
//!
//! [SharedRegistry] is a cloneable handle to a single [Registry] guarded by a read-write
//! lock. Mutations are serialized through the write lock, queries share the read lock, so
//! a query never observes a partially applied call. `now` is read from the [Clock] once
//! per call, while the lock is held: calls are applied in the order of their timestamps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use near_sdk::AccountId;
use tracing::{debug, warn};

use crate::{Config, D21Error, Event, MemoryStore, Registry, Subject};

/// Registry kept in process memory.
pub type MemoryRegistry = Registry<MemoryStore>;

/// Source of the current time in Unix milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Wall clock.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Clock which only moves when told to. Clones share the same time.
#[derive(Clone, Default)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub fn new(now_ms: u64) -> Self {
        Self(Arc::new(AtomicU64::new(now_ms)))
    }

    pub fn set(&self, now_ms: u64) {
        self.0.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct SharedRegistry<C: Clock = SystemClock> {
    inner: Arc<RwLock<MemoryRegistry>>,
    clock: C,
}

impl<C: Clock> SharedRegistry<C> {
    pub fn new(owner: AccountId, config: Config, clock: C) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Registry::new(
                owner,
                config,
                MemoryStore::default(),
            ))),
            clock,
        }
    }

    /// Wraps an existing registry, eg. one restored from a borsh snapshot.
    pub fn from_registry(registry: MemoryRegistry, clock: C) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
            clock,
        }
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> MemoryRegistry {
        self.read().clone()
    }

    /**********
     * TRANSACTIONS
     **********/

    pub fn add_subject(&self, caller: &AccountId, name: String) -> Result<Event, D21Error> {
        let res = {
            let mut r = self.write();
            r.add_subject(caller, name, self.clock.now_ms())
        };
        log_result("add_subject", caller, &res);
        res
    }

    pub fn add_voter(&self, caller: &AccountId, voter: AccountId) -> Result<Event, D21Error> {
        let res = self.write().add_voter(caller, voter);
        log_result("add_voter", caller, &res);
        res
    }

    pub fn start_voting(&self, caller: &AccountId) -> Result<Event, D21Error> {
        let res = {
            let mut r = self.write();
            r.start_voting(caller, self.clock.now_ms())
        };
        log_result("start_voting", caller, &res);
        res
    }

    pub fn vote_positive(&self, caller: &AccountId, subject: AccountId) -> Result<Event, D21Error> {
        let res = {
            let mut r = self.write();
            r.vote_positive(caller, subject, self.clock.now_ms())
        };
        log_result("vote_positive", caller, &res);
        res
    }

    pub fn vote_negative(&self, caller: &AccountId, subject: AccountId) -> Result<Event, D21Error> {
        let res = {
            let mut r = self.write();
            r.vote_negative(caller, subject, self.clock.now_ms())
        };
        log_result("vote_negative", caller, &res);
        res
    }

    pub fn vote_batch(
        &self,
        caller: &AccountId,
        subjects: Vec<AccountId>,
        positive: Vec<bool>,
    ) -> Result<Vec<Event>, D21Error> {
        let res = {
            let mut r = self.write();
            r.vote_batch(caller, subjects, positive, self.clock.now_ms())
        };
        match &res {
            Ok(events) => debug!(%caller, votes = events.len(), "vote_batch"),
            Err(err) => warn!(%caller, %err, "vote_batch rejected"),
        }
        res
    }

    /**********
     * QUERIES
     **********/

    pub fn subjects(&self) -> Vec<Subject> {
        self.read().subjects().to_vec()
    }

    pub fn subject(&self, address: &AccountId) -> Subject {
        self.read().subject(address)
    }

    pub fn results(&self) -> Result<Vec<Subject>, D21Error> {
        let r = self.read();
        r.results(self.clock.now_ms())
    }

    pub fn remaining_time(&self) -> Result<u64, D21Error> {
        let r = self.read();
        r.remaining_time(self.clock.now_ms())
    }

    pub fn owner(&self) -> AccountId {
        self.read().owner().clone()
    }

    pub fn config(&self) -> Config {
        self.read().config()
    }

    /// Number of positive votes cast by `voter`.
    pub fn positive_votes(&self, voter: &AccountId) -> u8 {
        self.read().positive_votes(voter)
    }

    pub fn is_voter(&self, account: &AccountId) -> bool {
        self.read().is_voter(account)
    }

    pub fn has_voted(&self, voter: &AccountId, subject: &AccountId) -> bool {
        self.read().has_voted(voter, subject)
    }

    pub fn voting_started(&self) -> bool {
        self.read().voting_started()
    }

    pub fn voting_end_time(&self) -> u64 {
        self.read().voting_end_time()
    }

    /*****************
     * INTERNAL
     ****************/

    // Registry calls validate before mutating, so a poisoned lock still guards a consistent
    // state.
    fn read(&self) -> RwLockReadGuard<'_, MemoryRegistry> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryRegistry> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn log_result(op: &'static str, caller: &AccountId, res: &Result<Event, D21Error>) {
    match res {
        Ok(event) => debug!(%caller, event = event.name(), "{}", op),
        Err(err) => warn!(%caller, %err, "{} rejected", op),
    }
}
