//! Poll aggregate and lifecycle
//!
//! Open -> Expired -> Finalized. Expiry is driven by the caller's clock
//! (unix seconds); finalization happens once, by the creator, and is
//! terminal.

use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::{GeoPoint, OptionLabels, PollId, PollOption, Stake};

/// Lifecycle state of a poll as seen at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PollState {
    /// Accepting stakes
    Open,
    /// Past expiry, awaiting the creator's verdict
    Expired,
    Finalized,
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollState::Open => write!(f, "OPEN"),
            PollState::Expired => write!(f, "EXPIRED"),
            PollState::Finalized => write!(f, "FINALIZED"),
        }
    }
}

/// Creator-supplied fields of a new poll.
#[derive(Debug, Clone, PartialEq)]
pub struct PollDraft {
    pub title: String,
    pub labels: OptionLabels,
    pub location: GeoPoint,
    /// Creation time (unix seconds)
    pub poll_time: i64,
    /// Stakes are accepted strictly before this instant (unix seconds)
    pub expiry_time: i64,
}

impl PollDraft {
    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidPoll("title is empty".to_string()));
        }
        if self.labels.option1.trim().is_empty() || self.labels.option2.trim().is_empty() {
            return Err(Error::InvalidPoll("option labels must not be empty".to_string()));
        }
        if self.expiry_time <= self.poll_time {
            return Err(Error::InvalidPoll(format!(
                "expiry {} must be after poll time {}",
                self.expiry_time, self.poll_time
            )));
        }
        Ok(())
    }
}

/// A binary poll and its stake ledger.
///
/// `winning_option` is the only finalization flag, so "finalized iff a
/// winner is set" holds by construction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    id: PollId,
    title: String,
    labels: OptionLabels,
    location: GeoPoint,
    poll_time: i64,
    expiry_time: i64,
    stakes: Vec<Stake>,
    winning_option: Option<PollOption>,
    finalized_at: Option<i64>,
}

impl Poll {
    pub fn new(id: PollId, draft: PollDraft) -> Result<Self> {
        draft.validate()?;
        Ok(Self {
            id,
            title: draft.title,
            labels: draft.labels,
            location: draft.location,
            poll_time: draft.poll_time,
            expiry_time: draft.expiry_time,
            stakes: Vec::new(),
            winning_option: None,
            finalized_at: None,
        })
    }

    /// Rebuild a poll from a stored snapshot.
    ///
    /// Stakes are taken as recorded; acceptance rules (expiry, duplicates)
    /// are not re-applied.
    pub fn restore(
        id: PollId,
        draft: PollDraft,
        stakes: Vec<Stake>,
        winning_option: Option<PollOption>,
    ) -> Result<Self> {
        let mut poll = Self::new(id, draft)?;
        poll.stakes = stakes;
        poll.winning_option = winning_option;
        Ok(poll)
    }

    pub fn id(&self) -> &PollId {
        &self.id
    }

    pub fn creator(&self) -> &str {
        &self.id.creator
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn labels(&self) -> &OptionLabels {
        &self.labels
    }

    pub fn location(&self) -> GeoPoint {
        self.location
    }

    pub fn poll_time(&self) -> i64 {
        self.poll_time
    }

    pub fn expiry_time(&self) -> i64 {
        self.expiry_time
    }

    pub fn stakes(&self) -> &[Stake] {
        &self.stakes
    }

    pub fn winning_option(&self) -> Option<PollOption> {
        self.winning_option
    }

    pub fn finalized_at(&self) -> Option<i64> {
        self.finalized_at
    }

    pub fn is_finalized(&self) -> bool {
        self.winning_option.is_some()
    }

    pub fn state(&self, now: i64) -> PollState {
        if self.is_finalized() {
            PollState::Finalized
        } else if now >= self.expiry_time {
            PollState::Expired
        } else {
            PollState::Open
        }
    }

    /// First stake recorded for `voter`, if any.
    pub fn stake_of(&self, voter: &str) -> Option<&Stake> {
        self.stakes.iter().find(|s| s.voter == voter)
    }

    pub fn has_staked(&self, voter: &str) -> bool {
        self.stake_of(voter).is_some()
    }

    /// Accept a stake while the poll is open.
    pub fn place_stake(&mut self, stake: Stake, now: i64) -> Result<()> {
        let rejection = match self.state(now) {
            PollState::Finalized => Some(Error::PollFinalized(self.id.clone())),
            PollState::Expired => Some(Error::PollExpired(self.id.clone())),
            PollState::Open if stake.amount == 0 => Some(Error::ZeroStake),
            PollState::Open if self.has_staked(&stake.voter) => Some(Error::DuplicateStake {
                poll: self.id.clone(),
                voter: stake.voter.clone(),
            }),
            PollState::Open => None,
        };
        if let Some(err) = rejection {
            warn!(poll = %self.id, voter = %stake.voter, error = %err, "stake rejected");
            return Err(err);
        }

        self.stakes.push(stake);
        Ok(())
    }

    /// Declare the winning option. Creator only, after expiry, once.
    pub fn finalize(&mut self, caller: &str, winning_option: PollOption, now: i64) -> Result<()> {
        if caller != self.id.creator {
            return Err(Error::Unauthorized {
                poll: self.id.clone(),
                caller: caller.to_string(),
            });
        }
        match self.state(now) {
            PollState::Finalized => return Err(Error::AlreadyFinalized(self.id.clone())),
            PollState::Open => return Err(Error::PollNotExpired(self.id.clone())),
            PollState::Expired => {}
        }

        self.winning_option = Some(winning_option);
        self.finalized_at = Some(now);
        info!(
            poll = %self.id,
            winning_option = %winning_option,
            label = %self.labels.label(winning_option),
            stakes = self.stakes.len(),
            "poll finalized"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATOR: &str = "0xcreator";

    fn open_poll() -> Poll {
        Poll::new(
            PollId::new(CREATOR, 0),
            PollDraft {
                title: "Will the ferry run on Sunday?".to_string(),
                labels: OptionLabels::new("Runs", "Cancelled"),
                location: GeoPoint::from_degrees(59.91, 10.75).unwrap(),
                poll_time: 100,
                expiry_time: 200,
            },
        )
        .unwrap()
    }

    #[test]
    fn state_follows_clock_and_finalization() {
        let mut poll = open_poll();
        assert_eq!(poll.state(150), PollState::Open);
        assert_eq!(poll.state(200), PollState::Expired);
        poll.finalize(CREATOR, PollOption::Option1, 250).unwrap();
        assert_eq!(poll.state(250), PollState::Finalized);
        assert_eq!(poll.finalized_at(), Some(250));
    }

    #[test]
    fn draft_validation() {
        let mut draft = PollDraft {
            title: "x".to_string(),
            labels: OptionLabels::new("a", "b"),
            location: GeoPoint::default(),
            poll_time: 10,
            expiry_time: 10,
        };
        assert!(matches!(
            Poll::new(PollId::new(CREATOR, 0), draft.clone()),
            Err(Error::InvalidPoll(_))
        ));
        draft.expiry_time = 11;
        draft.labels.option2 = " ".to_string();
        assert!(Poll::new(PollId::new(CREATOR, 0), draft).is_err());
    }

    #[test]
    fn stakes_only_while_open() {
        let mut poll = open_poll();
        poll.place_stake(Stake::new("a", PollOption::Option1, 10), 150)
            .unwrap();
        let err = poll
            .place_stake(Stake::new("b", PollOption::Option2, 10), 200)
            .unwrap_err();
        assert!(matches!(err, Error::PollExpired(_)));
        assert_eq!(poll.stakes().len(), 1);
    }

    #[test]
    fn one_stake_per_voter() {
        let mut poll = open_poll();
        poll.place_stake(Stake::new("a", PollOption::Option1, 10), 150)
            .unwrap();
        let err = poll
            .place_stake(Stake::new("a", PollOption::Option2, 5), 151)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateStake { .. }));
        assert_eq!(poll.stake_of("a").map(|s| s.amount), Some(10));
    }

    #[test]
    fn zero_stake_rejected() {
        let mut poll = open_poll();
        assert_eq!(
            poll.place_stake(Stake::new("a", PollOption::Option1, 0), 150),
            Err(Error::ZeroStake)
        );
    }

    #[test]
    fn finalize_rules() {
        let mut poll = open_poll();
        assert!(matches!(
            poll.finalize(CREATOR, PollOption::Option1, 150),
            Err(Error::PollNotExpired(_))
        ));
        assert!(matches!(
            poll.finalize("0xintruder", PollOption::Option1, 250),
            Err(Error::Unauthorized { .. })
        ));
        poll.finalize(CREATOR, PollOption::Option2, 250).unwrap();
        assert!(matches!(
            poll.finalize(CREATOR, PollOption::Option1, 260),
            Err(Error::AlreadyFinalized(_))
        ));
        assert_eq!(poll.winning_option(), Some(PollOption::Option2));
    }

    #[test]
    fn finalized_poll_rejects_stakes() {
        let mut poll = open_poll();
        poll.finalize(CREATOR, PollOption::Option1, 300).unwrap();
        assert!(matches!(
            poll.place_stake(Stake::new("late", PollOption::Option1, 1), 100),
            Err(Error::PollFinalized(_))
        ));
    }
}
