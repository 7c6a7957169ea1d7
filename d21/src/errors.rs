use near_sdk::env::panic_str;
use near_sdk::FunctionError;
use thiserror::Error;

/// Registry errors. Every variant aborts the call without changing the state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum D21Error {
    #[error("Not the owner")]
    NotOwner,
    #[error("Address already registered as a subject")]
    DuplicateSubjectAddress,
    #[error("Subject name already exists")]
    DuplicateSubjectName,
    #[error("No subjects registered")]
    NoSubjectsRegistered,
    #[error("Voting has already started")]
    VotingAlreadyStarted,
    #[error("Voting has not started")]
    VotingNotStarted,
    #[error("Voting has ended")]
    VotingEnded,
    #[error("Voting hasn't ended yet")]
    VotingNotEnded,
    #[error("Not a registered voter")]
    NotVoter,
    #[error("Subject does not exist")]
    SubjectNotFound,
    #[error("Already voted for this subject")]
    AlreadyVoted,
    #[error("Already cast {} positive votes", spelled(.0))]
    PositiveCapReached(u8),
    #[error("Need {0} positive votes first")]
    InsufficientPositiveVotes(u8),
    #[error("subjects and vote kinds must have the same length")]
    BatchLengthMismatch,
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

fn spelled(n: &u8) -> String {
    match *n {
        1 => "one".to_owned(),
        2 => "two".to_owned(),
        3 => "three".to_owned(),
        4 => "four".to_owned(),
        5 => "five".to_owned(),
        _ => n.to_string(),
    }
}

impl FunctionError for D21Error {
    fn panic(&self) -> ! {
        panic_str(&self.to_string())
    }
}
