use std::collections::{HashMap, HashSet};

use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::collections::{LookupMap, LookupSet};
use near_sdk::{AccountId, BorshStorageKey};

/// Helper structure for keys of the persistent collections.
#[derive(BorshSerialize, BorshStorageKey)]
pub enum StorageKey {
    SubjectIdx,
    SubjectNames,
    Voters,
    Ballots,
    PositiveVotes,
}

/// Per-account registry records. These grow with the number of voters and ballots, so the
/// contract keeps them in persistent collections instead of the main state object.
pub trait Store {
    /// index of the subject registered by `address` in the subject list
    fn subject_idx(&self, address: &AccountId) -> Option<u64>;
    fn insert_subject(&mut self, address: &AccountId, idx: u64, name: &String);
    fn has_name(&self, name: &String) -> bool;

    fn is_voter(&self, account: &AccountId) -> bool;
    fn insert_voter(&mut self, account: &AccountId);

    fn has_ballot(&self, voter: &AccountId, subject: &AccountId) -> bool;
    fn insert_ballot(&mut self, voter: &AccountId, subject: &AccountId);

    fn positive_votes(&self, voter: &AccountId) -> u8;
    fn set_positive_votes(&mut self, voter: &AccountId, count: u8);
}

/// Contract storage backed by the NEAR trie.
#[derive(BorshDeserialize, BorshSerialize)]
pub struct PersistentStore {
    subject_idx: LookupMap<AccountId, u64>,
    names: LookupSet<String>,
    voters: LookupSet<AccountId>,
    /// (voter, subject) pairs which already received a ballot
    ballots: LookupSet<(AccountId, AccountId)>,
    positive: LookupMap<AccountId, u8>,
}

impl PersistentStore {
    pub fn new() -> Self {
        Self {
            subject_idx: LookupMap::new(StorageKey::SubjectIdx),
            names: LookupSet::new(StorageKey::SubjectNames),
            voters: LookupSet::new(StorageKey::Voters),
            ballots: LookupSet::new(StorageKey::Ballots),
            positive: LookupMap::new(StorageKey::PositiveVotes),
        }
    }
}

impl Default for PersistentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for PersistentStore {
    fn subject_idx(&self, address: &AccountId) -> Option<u64> {
        self.subject_idx.get(address)
    }

    fn insert_subject(&mut self, address: &AccountId, idx: u64, name: &String) {
        self.subject_idx.insert(address, &idx);
        self.names.insert(name);
    }

    fn has_name(&self, name: &String) -> bool {
        self.names.contains(name)
    }

    fn is_voter(&self, account: &AccountId) -> bool {
        self.voters.contains(account)
    }

    fn insert_voter(&mut self, account: &AccountId) {
        self.voters.insert(account);
    }

    fn has_ballot(&self, voter: &AccountId, subject: &AccountId) -> bool {
        self.ballots.contains(&(voter.clone(), subject.clone()))
    }

    fn insert_ballot(&mut self, voter: &AccountId, subject: &AccountId) {
        self.ballots.insert(&(voter.clone(), subject.clone()));
    }

    fn positive_votes(&self, voter: &AccountId) -> u8 {
        self.positive.get(voter).unwrap_or(0)
    }

    fn set_positive_votes(&mut self, voter: &AccountId, count: u8) {
        self.positive.insert(voter, &count);
    }
}

/// In-memory storage used by the off-chain service.
#[derive(BorshDeserialize, BorshSerialize, Clone, Default)]
#[cfg_attr(not(target_arch = "wasm32"), derive(Debug))]
pub struct MemoryStore {
    subject_idx: HashMap<AccountId, u64>,
    names: HashSet<String>,
    voters: HashSet<AccountId>,
    ballots: HashSet<(AccountId, AccountId)>,
    positive: HashMap<AccountId, u8>,
}

impl Store for MemoryStore {
    fn subject_idx(&self, address: &AccountId) -> Option<u64> {
        self.subject_idx.get(address).copied()
    }

    fn insert_subject(&mut self, address: &AccountId, idx: u64, name: &String) {
        self.subject_idx.insert(address.clone(), idx);
        self.names.insert(name.clone());
    }

    fn has_name(&self, name: &String) -> bool {
        self.names.contains(name)
    }

    fn is_voter(&self, account: &AccountId) -> bool {
        self.voters.contains(account)
    }

    fn insert_voter(&mut self, account: &AccountId) {
        self.voters.insert(account.clone());
    }

    fn has_ballot(&self, voter: &AccountId, subject: &AccountId) -> bool {
        self.ballots.contains(&(voter.clone(), subject.clone()))
    }

    fn insert_ballot(&mut self, voter: &AccountId, subject: &AccountId) {
        self.ballots.insert((voter.clone(), subject.clone()));
    }

    fn positive_votes(&self, voter: &AccountId) -> u8 {
        self.positive.get(voter).copied().unwrap_or(0)
    }

    fn set_positive_votes(&mut self, voter: &AccountId, count: u8) {
        self.positive.insert(voter.clone(), count);
    }
}
