//! Core types used throughout the settlement crate
//!
//! Defines the fixed-shape records for options, stakes, poll identity and
//! location. Loosely-typed wire records are converted here, so everything
//! past this module works with validated values.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Smallest-unit decimals of the reference chain asset (1 APT = 1e8 Octas).
pub const OCTAS_DECIMALS: u32 = 8;

/// One of the two outcomes of a binary poll.
///
/// Serialized as the integer `1` or `2`, matching the stored vote records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum PollOption {
    Option1,
    Option2,
}

impl PollOption {
    pub const ALL: [PollOption; 2] = [PollOption::Option1, PollOption::Option2];

    /// Wire value (`1` or `2`)
    pub fn as_u8(&self) -> u8 {
        match self {
            PollOption::Option1 => 1,
            PollOption::Option2 => 2,
        }
    }

    pub fn from_wire(value: i64) -> Option<Self> {
        match value {
            1 => Some(PollOption::Option1),
            2 => Some(PollOption::Option2),
            _ => None,
        }
    }
}

impl TryFrom<i64> for PollOption {
    type Error = String;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        PollOption::from_wire(value).ok_or_else(|| format!("option must be 1 or 2, got {value}"))
    }
}

impl From<PollOption> for u8 {
    fn from(option: PollOption) -> Self {
        option.as_u8()
    }
}

impl fmt::Display for PollOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// An immutable wager: one voter, one option, an integer amount in the
/// asset's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    pub voter: String,
    pub option: PollOption,
    pub amount: u64,
}

impl Stake {
    pub fn new(voter: impl Into<String>, option: PollOption, amount: u64) -> Self {
        Self {
            voter: voter.into(),
            option,
            amount,
        }
    }
}

/// Vote record as it arrives from the database / HTTP layer.
///
/// Fields are signed and unchecked; `Stake::try_from` does the validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeRecord {
    pub voter: String,
    pub option: i64,
    pub stake_amount: i64,
}

impl TryFrom<StakeRecord> for Stake {
    type Error = Error;

    fn try_from(record: StakeRecord) -> Result<Self> {
        if record.voter.trim().is_empty() {
            return Err(Error::invalid_stake(&record.voter, "empty voter id"));
        }
        let option = PollOption::from_wire(record.option).ok_or_else(|| {
            Error::invalid_stake(
                &record.voter,
                format!("option must be 1 or 2, got {}", record.option),
            )
        })?;
        let amount = u64::try_from(record.stake_amount).map_err(|_| {
            Error::invalid_stake(
                &record.voter,
                format!("negative amount {}", record.stake_amount),
            )
        })?;
        Ok(Stake {
            voter: record.voter,
            option,
            amount,
        })
    }
}

/// Validate a batch of wire records. Fails on the first malformed record.
pub fn stakes_from_records(records: Vec<StakeRecord>) -> Result<Vec<Stake>> {
    records.into_iter().map(Stake::try_from).collect()
}

/// Polls are keyed by creator address plus a per-creator sequential index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PollId {
    pub creator: String,
    pub index: u64,
}

impl PollId {
    pub fn new(creator: impl Into<String>, index: u64) -> Self {
        Self {
            creator: creator.into(),
            index,
        }
    }
}

impl fmt::Display for PollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.creator, self.index)
    }
}

/// Poll location in micro-degrees (degrees × 1e6, floored), the way the
/// chain stores coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude_micro: i64,
    pub longitude_micro: i64,
}

impl GeoPoint {
    pub fn from_degrees(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidPoll(format!("latitude {latitude} out of range")));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidPoll(format!(
                "longitude {longitude} out of range"
            )));
        }
        Ok(Self {
            latitude_micro: (latitude * 1_000_000.0).floor() as i64,
            longitude_micro: (longitude * 1_000_000.0).floor() as i64,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude_micro as f64 / 1_000_000.0
    }

    pub fn longitude(&self) -> f64 {
        self.longitude_micro as f64 / 1_000_000.0
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude(), self.longitude())
    }
}

/// The two human-readable option labels, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionLabels {
    pub option1: String,
    pub option2: String,
}

impl OptionLabels {
    pub fn new(option1: impl Into<String>, option2: impl Into<String>) -> Self {
        Self {
            option1: option1.into(),
            option2: option2.into(),
        }
    }

    pub fn label(&self, option: PollOption) -> &str {
        match option {
            PollOption::Option1 => &self.option1,
            PollOption::Option2 => &self.option2,
        }
    }
}

/// Convert a smallest-unit amount into whole units for display
/// (e.g. 150_000_000 Octas -> 1.5).
pub fn to_display_units(amount: u64, decimals: u32) -> Decimal {
    Decimal::from_i128_with_scale(amount as i128, decimals.min(28)).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(voter: &str, option: i64, amount: i64) -> StakeRecord {
        StakeRecord {
            voter: voter.to_string(),
            option,
            stake_amount: amount,
        }
    }

    #[test]
    fn stake_record_converts_when_well_formed() {
        let stake = Stake::try_from(record("0xa", 2, 500)).unwrap();
        assert_eq!(stake, Stake::new("0xa", PollOption::Option2, 500));
    }

    #[test]
    fn negative_amount_is_invalid_stake() {
        let err = Stake::try_from(record("0xa", 1, -5)).unwrap_err();
        assert!(matches!(err, Error::InvalidStake { ref voter, .. } if voter == "0xa"));
    }

    #[test]
    fn option_outside_range_is_invalid_stake() {
        for bad in [0, 3, -1] {
            let err = Stake::try_from(record("0xa", bad, 10)).unwrap_err();
            assert!(matches!(err, Error::InvalidStake { .. }), "option {bad}");
        }
    }

    #[test]
    fn batch_conversion_rejects_whole_set() {
        let records = vec![record("a", 1, 10), record("b", 7, 10), record("c", 2, 10)];
        assert!(stakes_from_records(records).is_err());
    }

    #[test]
    fn poll_option_serializes_as_integer() {
        let json = serde_json::to_string(&PollOption::Option2).unwrap();
        assert_eq!(json, "2");
        let parsed: PollOption = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, PollOption::Option1);
        assert!(serde_json::from_str::<PollOption>("3").is_err());
    }

    #[test]
    fn geo_point_floors_to_micro_degrees() {
        let p = GeoPoint::from_degrees(12.9715987, -77.5945627).unwrap();
        assert_eq!(p.latitude_micro, 12_971_598);
        assert_eq!(p.longitude_micro, -77_594_563);
        assert!(GeoPoint::from_degrees(91.0, 0.0).is_err());
    }

    #[test]
    fn display_units_uses_decimals() {
        assert_eq!(to_display_units(150_000_000, OCTAS_DECIMALS).to_string(), "1.5");
        assert_eq!(to_display_units(1, OCTAS_DECIMALS).to_string(), "0.00000001");
    }
}
