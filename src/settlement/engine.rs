use tracing::debug;

use super::result::{SettlementResult, WinnerPayout};
use crate::error::{Error, Result};
use crate::poll::Poll;
use crate::types::{PollOption, Stake};

/// Reward for one winning stake.
///
/// reward = floor(amount × total_pool / total_winning_stake)
///
/// The product is taken in u128 so it cannot overflow. `amount` must be part
/// of `total_winning_stake`, which keeps the result within `total_pool`.
/// Returns 0 when nobody backed the winning side or when `amount` exceeds
/// `total_winning_stake`.
pub fn reward_for(amount: u64, total_pool: u64, total_winning_stake: u64) -> u64 {
    if total_winning_stake == 0 || amount > total_winning_stake {
        return 0;
    }
    let reward = (amount as u128 * total_pool as u128) / total_winning_stake as u128;
    u64::try_from(reward).unwrap_or(0)
}

/// Settle a finalized poll.
///
/// Fails with `InvalidState` if the poll has no winning option yet.
pub fn compute_settlement(poll: &Poll) -> Result<SettlementResult> {
    let winning_option = poll
        .winning_option()
        .ok_or_else(|| Error::InvalidState("poll not finalized".to_string()))?;

    let result = distribute(poll.stakes(), winning_option)?;
    debug!(
        poll = %poll.id(),
        winning_option = %winning_option,
        total_pool = result.total_pool,
        winners = result.winners_count,
        residual = result.residual(),
        "settlement computed"
    );
    Ok(result)
}

/// Projected settlement for `winning_option`, in any poll state.
///
/// Runs the same distribution as [`compute_settlement`], so the preview is
/// exactly what finalizing with that option would pay.
pub fn compute_preview_statistics(
    stakes: &[Stake],
    winning_option: PollOption,
) -> Result<SettlementResult> {
    distribute(stakes, winning_option)
}

/// Preview for each candidate outcome, option 1 first.
pub fn preview_all_outcomes(stakes: &[Stake]) -> Result<[SettlementResult; 2]> {
    Ok([
        distribute(stakes, PollOption::Option1)?,
        distribute(stakes, PollOption::Option2)?,
    ])
}

/// Parse a wire winning-option selector.
pub fn winning_option_from_wire(value: i64) -> Result<PollOption> {
    PollOption::from_wire(value).ok_or_else(|| {
        Error::InvalidState(format!("winning option must be 1 or 2, got {value}"))
    })
}

fn distribute(stakes: &[Stake], winning_option: PollOption) -> Result<SettlementResult> {
    let mut total_option1_stake: u64 = 0;
    let mut total_option2_stake: u64 = 0;
    let mut option1_votes_count = 0usize;
    let mut option2_votes_count = 0usize;

    for stake in stakes {
        let (total, count) = match stake.option {
            PollOption::Option1 => (&mut total_option1_stake, &mut option1_votes_count),
            PollOption::Option2 => (&mut total_option2_stake, &mut option2_votes_count),
        };
        *total = total.checked_add(stake.amount).ok_or(Error::Overflow)?;
        *count += 1;
    }

    let total_pool = total_option1_stake
        .checked_add(total_option2_stake)
        .ok_or(Error::Overflow)?;
    let (total_winning_stake, winners_count) = match winning_option {
        PollOption::Option1 => (total_option1_stake, option1_votes_count),
        PollOption::Option2 => (total_option2_stake, option2_votes_count),
    };

    let mut result = SettlementResult {
        winning_option,
        total_pool,
        total_option1_stake,
        total_option2_stake,
        option1_votes_count,
        option2_votes_count,
        winners_count,
        total_winning_stake,
        rewards: Default::default(),
        rewards_per_winner: Vec::with_capacity(winners_count),
    };

    // Nobody backed the winner: the whole pool stays with the creator.
    if total_winning_stake == 0 {
        return Ok(result);
    }

    for stake in stakes.iter().filter(|s| s.option == winning_option) {
        let reward = reward_for(stake.amount, total_pool, total_winning_stake);
        // Sum of floors never exceeds total_pool, so this cannot overflow.
        *result.rewards.entry(stake.voter.clone()).or_insert(0) += reward;
        result.rewards_per_winner.push(WinnerPayout {
            voter: stake.voter.clone(),
            stake: stake.amount,
            reward,
        });
    }

    Ok(result)
}
