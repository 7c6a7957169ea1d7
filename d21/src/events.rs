use near_sdk::serde::Serialize;
use near_sdk::{env, AccountId};
use serde_json::{json, Value};

use crate::{EVENT_STANDARD, EVENT_VERSION};

/// Events produced by successful registry calls. The registry returns them to the caller,
/// the contract additionally logs them as NEP-297 events.
#[derive(Clone)]
#[cfg_attr(not(target_arch = "wasm32"), derive(Debug, PartialEq, Eq))]
pub enum Event {
    SubjectAdded { name: String, addr: AccountId },
    VoterAdded { voter: AccountId },
    VotingStarted,
    VotePositive { voter: AccountId, subject: AccountId },
    VoteNegative { voter: AccountId, subject: AccountId },
}

/// Standard NEAR Event envelope.
#[derive(Serialize)]
#[serde(crate = "near_sdk::serde")]
struct NearEvent {
    standard: &'static str,
    version: &'static str,
    event: &'static str,
    data: Value,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::SubjectAdded { .. } => "subject_added",
            Event::VoterAdded { .. } => "voter_added",
            Event::VotingStarted => "voting_started",
            Event::VotePositive { .. } => "vote_positive",
            Event::VoteNegative { .. } => "vote_negative",
        }
    }

    pub fn data(&self) -> Value {
        match self {
            Event::SubjectAdded { name, addr } => json!({ "addr": addr, "name": name }),
            Event::VoterAdded { voter } => json!({ "voter": voter }),
            Event::VotingStarted => json!({}),
            Event::VotePositive { voter, subject } | Event::VoteNegative { voter, subject } => {
                json!({ "subject": subject, "voter": voter })
            }
        }
    }

    pub fn to_json_event_string(&self) -> String {
        let e = NearEvent {
            standard: EVENT_STANDARD,
            version: EVENT_VERSION,
            event: self.name(),
            data: self.data(),
        };
        let s = serde_json::to_string(&e)
            .ok()
            .unwrap_or_else(|| env::abort());
        format!("EVENT_JSON:{}", s)
    }

    pub fn emit(&self) {
        env::log_str(&self.to_json_event_string());
    }
}
