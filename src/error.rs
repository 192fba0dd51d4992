//! Error types for settlement and poll lifecycle

use thiserror::Error;

use crate::types::PollId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Poll is in the wrong state for the requested computation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A stake in the input set is malformed. The whole computation is rejected.
    #[error("invalid stake from voter '{voter}': {reason}")]
    InvalidStake { voter: String, reason: String },

    /// Pool totals do not fit in a u64.
    #[error("arithmetic overflow while summing the pool")]
    Overflow,

    #[error("invalid poll: {0}")]
    InvalidPoll(String),

    #[error("poll {0} has expired; no new stakes accepted")]
    PollExpired(PollId),

    #[error("poll {0} is finalized")]
    PollFinalized(PollId),

    #[error("poll {0} has not reached its expiry time")]
    PollNotExpired(PollId),

    #[error("poll {0} was already finalized")]
    AlreadyFinalized(PollId),

    #[error("'{caller}' is not the creator of poll {poll}")]
    Unauthorized { poll: PollId, caller: String },

    #[error("voter '{voter}' already staked on poll {poll}")]
    DuplicateStake { poll: PollId, voter: String },

    #[error("stake amount must be > 0")]
    ZeroStake,

    #[error("poll {0} not found")]
    PollNotFound(PollId),

    /// The poll book lock was poisoned by a panicking writer.
    #[error("poll store unavailable")]
    StoreUnavailable,
}

impl Error {
    pub(crate) fn invalid_stake(voter: &str, reason: impl Into<String>) -> Self {
        Error::InvalidStake {
            voter: voter.to_string(),
            reason: reason.into(),
        }
    }
}
