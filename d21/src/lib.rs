use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::{env, log, near_bindgen, AccountId, PanicOnDefault};

mod constants;
mod errors;
mod events;
mod registry;
mod storage;
mod subject;
mod view;

#[cfg(not(target_arch = "wasm32"))]
pub mod service;

pub use crate::constants::*;
pub use crate::errors::*;
pub use crate::events::*;
pub use crate::registry::*;
pub use crate::storage::{MemoryStore, PersistentStore, Store};
pub use crate::subject::*;

#[near_bindgen]
#[derive(BorshDeserialize, BorshSerialize, PanicOnDefault)]
pub struct Contract {
    pub registry: Registry<PersistentStore>,
}

#[near_bindgen]
impl Contract {
    /// The deployer becomes the owner: the only account which can add voters and start
    /// voting.
    /// * `positive_cap`: max amount of positive votes per voter, default `POSITIVE_VOTES_CAP`.
    /// * `voting_duration`: voting window length in milliseconds, default `VOTING_DURATION`.
    #[init]
    #[handle_result]
    pub fn new(positive_cap: Option<u8>, voting_duration: Option<u64>) -> Result<Self, D21Error> {
        let config = Config::new(positive_cap, voting_duration)?;
        Ok(Self {
            registry: Registry::new(
                env::predecessor_account_id(),
                config,
                PersistentStore::new(),
            ),
        })
    }

    /*
     * Queries are in view.rs
     */

    /**********
     * TRANSACTIONS
     **********/

    /// Registers the caller as a subject.
    #[handle_result]
    pub fn add_subject(&mut self, name: String) -> Result<(), D21Error> {
        let caller = env::predecessor_account_id();
        self.registry
            .add_subject(&caller, name, env::block_timestamp_ms())?
            .emit();
        Ok(())
    }

    #[handle_result]
    pub fn add_voter(&mut self, voter: AccountId) -> Result<(), D21Error> {
        let caller = env::predecessor_account_id();
        self.registry.add_voter(&caller, voter)?.emit();
        Ok(())
    }

    #[handle_result]
    pub fn start_voting(&mut self) -> Result<(), D21Error> {
        let caller = env::predecessor_account_id();
        self.registry
            .start_voting(&caller, env::block_timestamp_ms())?
            .emit();
        log!("voting ends at {}", self.registry.voting_end_time());
        Ok(())
    }

    #[handle_result]
    pub fn vote_positive(&mut self, subject: AccountId) -> Result<(), D21Error> {
        let caller = env::predecessor_account_id();
        self.registry
            .vote_positive(&caller, subject, env::block_timestamp_ms())?
            .emit();
        Ok(())
    }

    #[handle_result]
    pub fn vote_negative(&mut self, subject: AccountId) -> Result<(), D21Error> {
        let caller = env::predecessor_account_id();
        self.registry
            .vote_negative(&caller, subject, env::block_timestamp_ms())?
            .emit();
        Ok(())
    }

    /// Casts `positive[i]` vote for `subjects[i]`. Fails without recording anything if any
    /// of the votes is invalid.
    #[handle_result]
    pub fn vote_batch(
        &mut self,
        subjects: Vec<AccountId>,
        positive: Vec<bool>,
    ) -> Result<(), D21Error> {
        let caller = env::predecessor_account_id();
        let events =
            self.registry
                .vote_batch(&caller, subjects, positive, env::block_timestamp_ms())?;
        for e in events {
            e.emit();
        }
        Ok(())
    }
}
