//! Poll snapshots as exported from the document store.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::poll::{Poll, PollDraft};
use crate::settlement::winning_option_from_wire;
use crate::types::{stakes_from_records, GeoPoint, OptionLabels, PollId, StakeRecord};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSnapshot {
    pub creator: String,
    pub index: u64,
    pub title: String,
    pub option1: String,
    pub option2: String,
    pub latitude: f64,
    pub longitude: f64,
    pub poll_time: i64,
    pub expiry_time: i64,
    #[serde(default)]
    pub winning_option: Option<i64>,
    #[serde(default)]
    pub votes: Vec<StakeRecord>,
}

impl PollSnapshot {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn read(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        Self::from_json(&json)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))
    }

    /// Validate every record and rebuild the poll.
    pub fn into_poll(self) -> Result<Poll> {
        let winning_option = self
            .winning_option
            .map(winning_option_from_wire)
            .transpose()?;
        let stakes = stakes_from_records(self.votes)?;
        let location = GeoPoint::from_degrees(self.latitude, self.longitude)?;
        if self.creator.trim().is_empty() {
            return Err(Error::InvalidPoll("creator is empty".to_string()));
        }

        Poll::restore(
            PollId::new(self.creator, self.index),
            PollDraft {
                title: self.title,
                labels: OptionLabels::new(self.option1, self.option2),
                location,
                poll_time: self.poll_time,
                expiry_time: self.expiry_time,
            },
            stakes,
            winning_option,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PollOption;

    const SNAPSHOT: &str = r#"{
        "creator": "0xhost", "index": 2, "title": "Street market open?",
        "option1": "Open", "option2": "Closed",
        "latitude": 12.97, "longitude": 77.59,
        "pollTime": 1700000000, "expiryTime": 1700086400,
        "winningOption": 2,
        "votes": [
            { "voter": "0xa", "option": 1, "stakeAmount": 100 },
            { "voter": "0xb", "option": 2, "stakeAmount": 50 }
        ]
    }"#;

    #[test]
    fn snapshot_rebuilds_finalized_poll() {
        let poll = PollSnapshot::from_json(SNAPSHOT).unwrap().into_poll().unwrap();
        assert_eq!(poll.id(), &PollId::new("0xhost", 2));
        assert_eq!(poll.winning_option(), Some(PollOption::Option2));
        assert_eq!(poll.stakes().len(), 2);
        assert_eq!(poll.labels().label(PollOption::Option1), "Open");
    }

    #[test]
    fn winning_option_is_optional() {
        let json = SNAPSHOT.replace("\"winningOption\": 2,", "");
        let poll = PollSnapshot::from_json(&json).unwrap().into_poll().unwrap();
        assert!(!poll.is_finalized());
    }

    #[test]
    fn bad_winning_option_is_invalid_state() {
        let json = SNAPSHOT.replace("\"winningOption\": 2", "\"winningOption\": 3");
        let err = PollSnapshot::from_json(&json).unwrap().into_poll().unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn negative_vote_rejects_snapshot() {
        let json = SNAPSHOT.replace("\"stakeAmount\": 50", "\"stakeAmount\": -50");
        let err = PollSnapshot::from_json(&json).unwrap().into_poll().unwrap_err();
        assert!(matches!(err, Error::InvalidStake { ref voter, .. } if voter == "0xb"));
    }
}
