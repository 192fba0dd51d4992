//! Scout settlement library
//!
//! Reward settlement for location-gated binary prediction polls

pub mod config;
pub mod error;
pub mod persistence;
pub mod poll;
pub mod portfolio;
pub mod settlement;
pub mod snapshot;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use poll::{Poll, PollDraft, PollState};
pub use settlement::{
    compute_preview_statistics, compute_settlement, preview_all_outcomes, SettlementResult,
    WinnerPayout,
};
pub use store::PollBook;
pub use types::{PollId, PollOption, Stake, StakeRecord};
