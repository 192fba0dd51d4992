//! Per-user portfolio: polls a user hosts and polls they staked on.
//!
//! Every pool statistic and reward here comes from the settlement engine.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::poll::Poll;
use crate::settlement::{compute_preview_statistics, compute_settlement, WinnerPayout};
use crate::types::{PollId, PollOption};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostedPollSummary {
    pub id: PollId,
    pub title: String,
    pub is_finalized: bool,
    pub winning_option: Option<PollOption>,
    pub total_votes: usize,
    pub total_pool: u64,
    pub total_option1_stake: u64,
    pub total_option2_stake: u64,
    pub option1_votes: usize,
    pub option2_votes: usize,
    /// Empty until the poll is finalized
    pub winners: Vec<WinnerPayout>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipatedPoll {
    pub id: PollId,
    pub title: String,
    pub option: PollOption,
    pub stake: u64,
    pub is_finalized: bool,
    pub won: bool,
    pub reward: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub user: String,
    /// Newest first
    pub hosted: Vec<HostedPollSummary>,
    pub participated: Vec<ParticipatedPoll>,
    pub total_staked: u64,
    pub total_rewards: u64,
}

pub fn summarize_hosted(poll: &Poll) -> Result<HostedPollSummary> {
    let (stats, winners) = match poll.winning_option() {
        Some(_) => {
            let settled = compute_settlement(poll)?;
            let winners = settled.rewards_per_winner.clone();
            (settled, winners)
        }
        // Winning side is irrelevant for the totals of an unfinalized poll.
        None => (
            compute_preview_statistics(poll.stakes(), PollOption::Option1)?,
            Vec::new(),
        ),
    };

    Ok(HostedPollSummary {
        id: poll.id().clone(),
        title: poll.title().to_string(),
        is_finalized: poll.is_finalized(),
        winning_option: poll.winning_option(),
        total_votes: poll.stakes().len(),
        total_pool: stats.total_pool,
        total_option1_stake: stats.total_option1_stake,
        total_option2_stake: stats.total_option2_stake,
        option1_votes: stats.option1_votes_count,
        option2_votes: stats.option2_votes_count,
        winners,
    })
}

/// The user's position in `poll`, or `None` if they never staked on it.
pub fn participation(poll: &Poll, user: &str) -> Result<Option<ParticipatedPoll>> {
    let Some(first) = poll.stake_of(user) else {
        return Ok(None);
    };
    let option = first.option;
    let stake = checked_total(
        poll.stakes()
            .iter()
            .filter(|s| s.voter == user)
            .map(|s| s.amount),
    )?;

    let (won, reward) = match poll.winning_option() {
        Some(winning) => {
            let settled = compute_settlement(poll)?;
            let reward = settled.reward_of(user).unwrap_or(0);
            (option == winning, reward)
        }
        None => (false, 0),
    };

    Ok(Some(ParticipatedPoll {
        id: poll.id().clone(),
        title: poll.title().to_string(),
        option,
        stake,
        is_finalized: poll.is_finalized(),
        won,
        reward,
    }))
}

fn checked_total(amounts: impl IntoIterator<Item = u64>) -> Result<u64> {
    amounts
        .into_iter()
        .try_fold(0u64, |acc, amount| acc.checked_add(amount))
        .ok_or(Error::Overflow)
}

pub fn build_portfolio<'a>(
    user: &str,
    polls: impl IntoIterator<Item = &'a Poll>,
) -> Result<Portfolio> {
    let mut hosted = Vec::new();
    let mut participated = Vec::new();

    for poll in polls {
        if poll.creator() == user {
            hosted.push(summarize_hosted(poll)?);
        }
        if let Some(entry) = participation(poll, user)? {
            participated.push(entry);
        }
    }

    hosted.sort_by(|a, b| b.id.index.cmp(&a.id.index));
    participated.sort_by(|a, b| a.id.cmp(&b.id));

    let total_staked = checked_total(participated.iter().map(|p| p.stake))?;
    let total_rewards = checked_total(participated.iter().map(|p| p.reward))?;

    Ok(Portfolio {
        user: user.to_string(),
        hosted,
        participated,
        total_staked,
        total_rewards,
    })
}
