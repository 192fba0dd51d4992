//! CSV payout sheets
//!
//! One row per winning stake, ready for the payout executor to turn into
//! transfers.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::settlement::SettlementResult;
use crate::types::{to_display_units, PollId};

/// Payout row for CSV storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutRecord {
    pub poll_creator: String,
    pub poll_index: u64,
    pub voter: String,
    pub stake: u64,
    pub reward: u64,
    /// Reward in whole units of the asset
    pub reward_display: String,
}

pub struct PayoutSheet {
    path: PathBuf,
    unit_decimals: u32,
}

impl PayoutSheet {
    pub fn new(path: impl Into<PathBuf>, unit_decimals: u32) -> Self {
        Self {
            path: path.into(),
            unit_decimals,
        }
    }

    /// Default location: `<data_dir>/payouts/<creator>_<index>.csv`
    pub fn in_data_dir(data_dir: &str, poll: &PollId, unit_decimals: u32) -> Self {
        let path = Path::new(data_dir)
            .join("payouts")
            .join(format!("{}_{}.csv", poll.creator, poll.index));
        Self::new(path, unit_decimals)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self, poll: &PollId, result: &SettlementResult) -> Vec<PayoutRecord> {
        result
            .rewards_per_winner
            .iter()
            .map(|w| PayoutRecord {
                poll_creator: poll.creator.clone(),
                poll_index: poll.index,
                voter: w.voter.clone(),
                stake: w.stake,
                reward: w.reward,
                reward_display: to_display_units(w.reward, self.unit_decimals).to_string(),
            })
            .collect()
    }

    /// Write (overwrite) the sheet. Returns the number of rows written.
    pub fn write(&self, poll: &PollId, result: &SettlementResult) -> Result<usize> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut writer = WriterBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        let records = self.records(poll, result);
        for record in &records {
            writer.serialize(record).context("Failed to write payout row")?;
        }
        writer.flush().context("Failed to flush payout sheet")?;

        info!(
            poll = %poll,
            rows = records.len(),
            path = %self.path.display(),
            "payout sheet written"
        );
        Ok(records.len())
    }

    pub fn read(&self) -> Result<Vec<PayoutRecord>> {
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        let mut records = Vec::new();
        for row in reader.deserialize::<PayoutRecord>() {
            records.push(row.context("Malformed payout row")?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::compute_preview_statistics;
    use crate::types::{PollOption, Stake, OCTAS_DECIMALS};

    fn temp_data_dir(test_name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "scout_persistence_{}_{}",
            test_name,
            std::process::id()
        ))
    }

    #[test]
    fn writes_one_row_per_winning_stake() {
        let data_dir = temp_data_dir("payouts");
        let poll = PollId::new("0xhost", 4);
        let stakes = vec![
            Stake::new("0xa", PollOption::Option1, 100_000_000),
            Stake::new("0xb", PollOption::Option1, 300_000_000),
            Stake::new("0xc", PollOption::Option2, 200_000_000),
        ];
        let result = compute_preview_statistics(&stakes, PollOption::Option1).unwrap();

        let sheet = PayoutSheet::in_data_dir(data_dir.to_str().unwrap(), &poll, OCTAS_DECIMALS);
        assert!(sheet.path().ends_with("payouts/0xhost_4.csv"));
        assert_eq!(sheet.write(&poll, &result).unwrap(), 2);

        let rows = sheet.read().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].voter, "0xa");
        assert_eq!(rows[0].reward, 150_000_000);
        assert_eq!(rows[0].reward_display, "1.5");
        assert_eq!(rows[1].reward_display, "4.5");

        let _ = fs::remove_dir_all(&data_dir);
    }

    #[test]
    fn no_winners_writes_empty_sheet() {
        let data_dir = temp_data_dir("empty");
        let poll = PollId::new("0xhost", 0);
        let stakes = vec![Stake::new("0xa", PollOption::Option2, 500)];
        let result = compute_preview_statistics(&stakes, PollOption::Option1).unwrap();

        let sheet = PayoutSheet::in_data_dir(data_dir.to_str().unwrap(), &poll, 8);
        assert_eq!(sheet.write(&poll, &result).unwrap(), 0);
        assert!(sheet.read().unwrap().is_empty());

        let _ = fs::remove_dir_all(&data_dir);
    }
}
