use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::PollOption;

/// One winning stake and what it is paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerPayout {
    pub voter: String,
    pub stake: u64,
    pub reward: u64,
}

/// Output of a settlement or a settlement preview.
///
/// Carries everything a caller needs to render the preview or execute one
/// transfer per winner without recomputing anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResult {
    pub winning_option: PollOption,
    pub total_pool: u64,
    pub total_option1_stake: u64,
    pub total_option2_stake: u64,
    pub option1_votes_count: usize,
    pub option2_votes_count: usize,
    /// Number of stakes on the winning option
    pub winners_count: usize,
    pub total_winning_stake: u64,
    /// Reward per winning voter. Empty when nobody backed the winner.
    pub rewards: BTreeMap<String, u64>,
    /// Per-stake breakdown, in stake order
    pub rewards_per_winner: Vec<WinnerPayout>,
}

impl SettlementResult {
    pub fn total_distributed(&self) -> u64 {
        self.rewards.values().sum()
    }

    /// Units left undistributed: floor truncation, or the whole pool when
    /// the winning side is empty. Retained by the poll creator.
    pub fn residual(&self) -> u64 {
        self.total_pool - self.total_distributed()
    }

    pub fn reward_of(&self, voter: &str) -> Option<u64> {
        self.rewards.get(voter).copied()
    }

    pub fn has_winners(&self) -> bool {
        self.total_winning_stake > 0
    }
}
