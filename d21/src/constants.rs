/// 1s in milliseconds. All registry timestamps are Unix time in milliseconds.
pub const SECOND: u64 = 1_000;
pub const DAY: u64 = 24 * 3600 * SECOND;

/// Default length of the voting window.
pub const VOTING_DURATION: u64 = 4 * DAY;

/// Default max amount of positive votes a voter can cast.
pub const POSITIVE_VOTES_CAP: u8 = 3;

/// Amount of positive votes a voter must cast before casting a negative one.
pub const NEGATIVE_VOTE_THRESHOLD: u8 = 2;

/// NEP-297 standard name used for emitted events.
pub const EVENT_STANDARD: &str = "d21";
pub const EVENT_VERSION: &str = "1.0.0";
