use std::collections::HashSet;

use itertools::Itertools;
use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::AccountId;

use crate::storage::Store;
use crate::{Config, D21Error, Event, Subject, NEGATIVE_VOTE_THRESHOLD};

/// D21 ballot registry. Callers and the current time (Unix milliseconds) are passed
/// explicitly to every call, so the same state machine runs inside the contract and in the
/// off-chain service.
///
/// The subject list is kept in the struct because `results` needs all of it. Per-account
/// records (voters, ballots, positive vote counters and the subject index) live in `S`.
///
/// Every mutating call checks all of its preconditions before touching the state: a call
/// which returns an error leaves the registry unchanged.
#[derive(BorshDeserialize, BorshSerialize, Clone)]
#[cfg_attr(not(target_arch = "wasm32"), derive(Debug))]
pub struct Registry<S> {
    owner: AccountId,
    config: Config,
    /// subjects in registration order
    subjects: Vec<Subject>,
    store: S,
    /// end of the voting window. `None` until voting starts.
    voting_end: Option<u64>,
}

impl<S: Store> Registry<S> {
    pub fn new(owner: AccountId, config: Config, store: S) -> Self {
        Self {
            owner,
            config,
            subjects: Vec::new(),
            store,
            voting_end: None,
        }
    }

    /**********
     * TRANSACTIONS
     **********/

    /// Registers `caller` as a subject with the given name.
    pub fn add_subject(
        &mut self,
        caller: &AccountId,
        name: String,
        now: u64,
    ) -> Result<Event, D21Error> {
        if self.is_closed(now) {
            return Err(D21Error::VotingEnded);
        }
        if self.store.subject_idx(caller).is_some() {
            return Err(D21Error::DuplicateSubjectAddress);
        }
        if self.store.has_name(&name) {
            return Err(D21Error::DuplicateSubjectName);
        }

        self.store
            .insert_subject(caller, self.subjects.len() as u64, &name);
        self.subjects.push(Subject::new(caller.clone(), name.clone()));
        Ok(Event::SubjectAdded {
            name,
            addr: caller.clone(),
        })
    }

    /// Registers a voter. Only the owner can add voters. Adding an existing voter is a no-op
    /// which still returns the event.
    pub fn add_voter(&mut self, caller: &AccountId, voter: AccountId) -> Result<Event, D21Error> {
        self.assert_owner(caller)?;
        self.store.insert_voter(&voter);
        Ok(Event::VoterAdded { voter })
    }

    /// Opens the voting window: `[now, now + voting_duration)`.
    pub fn start_voting(&mut self, caller: &AccountId, now: u64) -> Result<Event, D21Error> {
        self.assert_owner(caller)?;
        if self.voting_end.is_some() {
            return Err(D21Error::VotingAlreadyStarted);
        }
        if self.subjects.is_empty() {
            return Err(D21Error::NoSubjectsRegistered);
        }
        self.voting_end = Some(now.saturating_add(self.config.voting_duration));
        Ok(Event::VotingStarted)
    }

    pub fn vote_positive(
        &mut self,
        caller: &AccountId,
        subject: AccountId,
        now: u64,
    ) -> Result<Event, D21Error> {
        self.vote_batch(caller, vec![subject], vec![true], now)
            .map(|mut events| events.remove(0))
    }

    /// Casts a negative vote. Requires the voter to have already cast
    /// `NEGATIVE_VOTE_THRESHOLD` positive votes.
    pub fn vote_negative(
        &mut self,
        caller: &AccountId,
        subject: AccountId,
        now: u64,
    ) -> Result<Event, D21Error> {
        self.vote_batch(caller, vec![subject], vec![false], now)
            .map(|mut events| events.remove(0))
    }

    /// Casts multiple votes in one call. `positive[i]` tells if the vote for `subjects[i]` is
    /// positive. Votes are validated in order, counting the earlier votes of the same batch.
    /// Either all votes are recorded or none.
    pub fn vote_batch(
        &mut self,
        caller: &AccountId,
        subjects: Vec<AccountId>,
        positive: Vec<bool>,
        now: u64,
    ) -> Result<Vec<Event>, D21Error> {
        if subjects.len() != positive.len() {
            return Err(D21Error::BatchLengthMismatch);
        }
        self.assert_active(now)?;
        if !self.store.is_voter(caller) {
            return Err(D21Error::NotVoter);
        }

        let prev_count = self.store.positive_votes(caller);
        let mut pos_count = prev_count;
        let mut batch_voted: HashSet<&AccountId> = HashSet::new();
        let mut deltas = Vec::with_capacity(subjects.len());
        for (subject, is_positive) in subjects.iter().zip(positive.iter()) {
            let idx = self
                .store
                .subject_idx(subject)
                .ok_or(D21Error::SubjectNotFound)?;
            if self.store.has_ballot(caller, subject) || !batch_voted.insert(subject) {
                return Err(D21Error::AlreadyVoted);
            }
            if *is_positive {
                if pos_count >= self.config.positive_cap {
                    return Err(D21Error::PositiveCapReached(self.config.positive_cap));
                }
                pos_count += 1;
            } else if pos_count < NEGATIVE_VOTE_THRESHOLD {
                return Err(D21Error::InsufficientPositiveVotes(NEGATIVE_VOTE_THRESHOLD));
            }
            deltas.push((idx as usize, *is_positive));
        }

        // all votes are valid, record them
        let mut events = Vec::with_capacity(deltas.len());
        for (subject, (idx, is_positive)) in subjects.into_iter().zip(deltas) {
            self.store.insert_ballot(caller, &subject);
            let event = if is_positive {
                self.subjects[idx].votes += 1;
                Event::VotePositive {
                    voter: caller.clone(),
                    subject,
                }
            } else {
                self.subjects[idx].votes -= 1;
                Event::VoteNegative {
                    voter: caller.clone(),
                    subject,
                }
            };
            events.push(event);
        }
        if pos_count != prev_count {
            self.store.set_positive_votes(caller, pos_count);
        }
        Ok(events)
    }

    /**********
     * QUERIES
     **********/

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    pub fn config(&self) -> Config {
        self.config
    }

    /// Returns all subjects in the registration order.
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Returns the subject registered by `address` or an empty subject (no name, 0 votes)
    /// if there is no such subject.
    pub fn subject(&self, address: &AccountId) -> Subject {
        match self.store.subject_idx(address) {
            Some(idx) => self.subjects[idx as usize].clone(),
            None => Subject::empty(address.clone()),
        }
    }

    pub fn is_voter(&self, account: &AccountId) -> bool {
        self.store.is_voter(account)
    }

    pub fn has_voted(&self, voter: &AccountId, subject: &AccountId) -> bool {
        self.store.has_ballot(voter, subject)
    }

    pub fn positive_votes(&self, voter: &AccountId) -> u8 {
        self.store.positive_votes(voter)
    }

    pub fn voting_started(&self) -> bool {
        self.voting_end.is_some()
    }

    /// Returns the end of the voting window, or 0 if voting has not started.
    pub fn voting_end_time(&self) -> u64 {
        self.voting_end.unwrap_or(0)
    }

    /// Returns milliseconds left until the voting ends; 0 once it has ended.
    pub fn remaining_time(&self, now: u64) -> Result<u64, D21Error> {
        let end = self.voting_end.ok_or(D21Error::VotingNotStarted)?;
        Ok(end.saturating_sub(now))
    }

    /// Returns subjects ordered by votes, descending. Subjects with the same amount of votes
    /// keep the registration order.
    pub fn results(&self, now: u64) -> Result<Vec<Subject>, D21Error> {
        if !self.is_closed(now) {
            return Err(D21Error::VotingNotEnded);
        }
        Ok(self
            .subjects
            .iter()
            .cloned()
            .sorted_by(|a, b| b.votes.cmp(&a.votes))
            .collect())
    }

    /*****************
     * INTERNAL
     ****************/

    fn assert_owner(&self, caller: &AccountId) -> Result<(), D21Error> {
        if *caller != self.owner {
            return Err(D21Error::NotOwner);
        }
        Ok(())
    }

    fn assert_active(&self, now: u64) -> Result<(), D21Error> {
        match self.voting_end {
            None => Err(D21Error::VotingNotStarted),
            Some(end) if now >= end => Err(D21Error::VotingEnded),
            _ => Ok(()),
        }
    }

    fn is_closed(&self, now: u64) -> bool {
        matches!(self.voting_end, Some(end) if now >= end)
    }
}
