//! In-memory poll book
//!
//! Holds polls and their stake ledgers behind a single lock. Stake
//! insertion and finalization both take the write lock, and finalization
//! settles the frozen stake set before releasing it, so a settlement never
//! races a late stake.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

use crate::error::{Error, Result};
use crate::poll::{Poll, PollDraft, PollState};
use crate::portfolio::{build_portfolio, Portfolio};
use crate::settlement::{compute_preview_statistics, compute_settlement, SettlementResult};
use crate::types::{PollId, PollOption, Stake};

#[derive(Default)]
struct BookState {
    polls: HashMap<PollId, Poll>,
    /// Next index to hand out, per creator
    next_index: HashMap<String, u64>,
}

#[derive(Default)]
pub struct PollBook {
    state: RwLock<BookState>,
}

impl PollBook {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BookState>> {
        self.state.read().map_err(|_| Error::StoreUnavailable)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BookState>> {
        self.state.write().map_err(|_| Error::StoreUnavailable)
    }

    /// Store a new poll under the creator's next sequential index.
    pub fn create_poll(&self, creator: &str, draft: PollDraft) -> Result<PollId> {
        let mut state = self.write()?;
        let index = state.next_index.get(creator).copied().unwrap_or(0);
        let next = index.checked_add(1).ok_or(Error::Overflow)?;
        let id = PollId::new(creator, index);
        let poll = Poll::new(id.clone(), draft)?;

        state.next_index.insert(creator.to_string(), next);
        state.polls.insert(id.clone(), poll);
        info!(poll = %id, "poll created");
        Ok(id)
    }

    /// Insert a previously persisted poll as-is.
    ///
    /// `u64::MAX` is not a valid index: no later poll could follow it.
    pub fn import(&self, poll: Poll) -> Result<()> {
        let id = poll.id().clone();
        let following = id.index.checked_add(1).ok_or(Error::Overflow)?;
        let mut state = self.write()?;
        let next = state.next_index.entry(id.creator.clone()).or_insert(0);
        *next = (*next).max(following);
        state.polls.insert(id, poll);
        Ok(())
    }

    pub fn get(&self, id: &PollId) -> Result<Poll> {
        self.read()?
            .polls
            .get(id)
            .cloned()
            .ok_or_else(|| Error::PollNotFound(id.clone()))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.polls.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn place_stake(&self, id: &PollId, stake: Stake, now: i64) -> Result<()> {
        let mut state = self.write()?;
        let poll = state
            .polls
            .get_mut(id)
            .ok_or_else(|| Error::PollNotFound(id.clone()))?;
        poll.place_stake(stake, now)
    }

    /// The voter's recorded stake on this poll, if any.
    pub fn stake_of(&self, id: &PollId, voter: &str) -> Result<Option<Stake>> {
        let state = self.read()?;
        let poll = state
            .polls
            .get(id)
            .ok_or_else(|| Error::PollNotFound(id.clone()))?;
        Ok(poll.stake_of(voter).cloned())
    }

    pub fn preview(&self, id: &PollId, winning_option: PollOption) -> Result<SettlementResult> {
        let state = self.read()?;
        let poll = state
            .polls
            .get(id)
            .ok_or_else(|| Error::PollNotFound(id.clone()))?;
        compute_preview_statistics(poll.stakes(), winning_option)
    }

    /// Finalize and settle in one critical section.
    ///
    /// If settling fails (e.g. pool overflow) the poll is left unfinalized.
    pub fn finalize(
        &self,
        id: &PollId,
        caller: &str,
        winning_option: PollOption,
        now: i64,
    ) -> Result<SettlementResult> {
        let mut state = self.write()?;
        let poll = state
            .polls
            .get_mut(id)
            .ok_or_else(|| Error::PollNotFound(id.clone()))?;

        let mut finalized = poll.clone();
        finalized.finalize(caller, winning_option, now)?;
        let result = compute_settlement(&finalized)?;
        *poll = finalized;

        info!(
            poll = %id,
            total_pool = result.total_pool,
            distributed = result.total_distributed(),
            retained = result.residual(),
            "settlement ready"
        );
        Ok(result)
    }

    pub fn settlement(&self, id: &PollId) -> Result<SettlementResult> {
        let state = self.read()?;
        let poll = state
            .polls
            .get(id)
            .ok_or_else(|| Error::PollNotFound(id.clone()))?;
        compute_settlement(poll)
    }

    pub fn polls_by_creator(&self, creator: &str) -> Result<Vec<Poll>> {
        let state = self.read()?;
        let mut polls: Vec<Poll> = state
            .polls
            .values()
            .filter(|p| p.creator() == creator)
            .cloned()
            .collect();
        polls.sort_by_key(|p| p.id().index);
        Ok(polls)
    }

    /// Polls still accepting stakes at `now`, newest first.
    pub fn active_polls(&self, now: i64) -> Result<Vec<Poll>> {
        let state = self.read()?;
        let mut polls: Vec<Poll> = state
            .polls
            .values()
            .filter(|p| p.state(now) == PollState::Open)
            .cloned()
            .collect();
        polls.sort_by(|a, b| {
            b.poll_time()
                .cmp(&a.poll_time())
                .then_with(|| b.id().cmp(a.id()))
        });
        Ok(polls)
    }

    pub fn active_count(&self, now: i64) -> Result<usize> {
        let state = self.read()?;
        Ok(state
            .polls
            .values()
            .filter(|p| p.state(now) == PollState::Open)
            .count())
    }

    pub fn portfolio(&self, user: &str) -> Result<Portfolio> {
        let state = self.read()?;
        build_portfolio(user, state.polls.values())
    }
}
