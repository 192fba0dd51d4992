//! Settlement engine
//!
//! Pure reward distribution over a poll's stake set. Winners split the
//! entire pool (both sides) pro rata to their stake on the winning option,
//! using floor integer division. Nothing here does I/O or touches shared
//! state.

pub mod engine;
pub mod result;

pub use engine::{
    compute_preview_statistics, compute_settlement, preview_all_outcomes, reward_for,
    winning_option_from_wire,
};
pub use result::{SettlementResult, WinnerPayout};
