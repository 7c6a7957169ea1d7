use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::serde::{Deserialize, Serialize};
use near_sdk::AccountId;

use crate::{D21Error, NEGATIVE_VOTE_THRESHOLD, POSITIVE_VOTES_CAP, VOTING_DURATION};

/// A candidate which can receive votes. Subjects are keyed by the account which registered
/// them.
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone)]
#[cfg_attr(not(target_arch = "wasm32"), derive(Debug, PartialEq, Eq))]
#[serde(crate = "near_sdk::serde")]
pub struct Subject {
    pub address: AccountId,
    pub name: String,
    /// running sum of positive (+1) and negative (-1) votes
    pub votes: i64,
}

impl Subject {
    pub fn new(address: AccountId, name: String) -> Self {
        Self {
            address,
            name,
            votes: 0,
        }
    }

    /// Placeholder returned for an address which is not a registered subject.
    pub fn empty(address: AccountId) -> Self {
        Self::new(address, String::new())
    }
}

/// Registry parameters fixed at creation.
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, Copy)]
#[cfg_attr(not(target_arch = "wasm32"), derive(Debug, PartialEq, Eq))]
#[serde(crate = "near_sdk::serde")]
pub struct Config {
    /// max amount of positive votes per voter
    pub positive_cap: u8,
    /// length of the voting window in milliseconds
    pub voting_duration: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            positive_cap: POSITIVE_VOTES_CAP,
            voting_duration: VOTING_DURATION,
        }
    }
}

impl Config {
    /// Builds a config, falling back to defaults for unset values.
    pub fn new(positive_cap: Option<u8>, voting_duration: Option<u64>) -> Result<Self, D21Error> {
        let d = Self::default();
        let c = Self {
            positive_cap: positive_cap.unwrap_or(d.positive_cap),
            voting_duration: voting_duration.unwrap_or(d.voting_duration),
        };
        c.validate()?;
        Ok(c)
    }

    pub fn validate(&self) -> Result<(), D21Error> {
        // a lower cap would make negative votes unreachable
        if self.positive_cap < NEGATIVE_VOTE_THRESHOLD {
            return Err(D21Error::InvalidConfig(format!(
                "positive_cap must be at least {}",
                NEGATIVE_VOTE_THRESHOLD
            )));
        }
        if self.voting_duration == 0 {
            return Err(D21Error::InvalidConfig(
                "voting_duration must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}
