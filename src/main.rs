//! scout-settle
//!
//! Usage: scout-settle <snapshot.json> [--payouts <out.csv> | --write-payouts]
//!
//! Reads a poll snapshot, prints the settlement (finalized poll) or the
//! preview for both outcomes (open poll) as JSON, and optionally writes the
//! payout sheet. `--write-payouts` puts it under `persistence.data_dir`.

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use scout_settlement::config::{AppConfig, LoggingConfig};
use scout_settlement::persistence::PayoutSheet;
use scout_settlement::snapshot::PollSnapshot;
use scout_settlement::{compute_settlement, preview_all_outcomes, PollId};

const USAGE: &str = "usage: scout-settle <snapshot.json> [--payouts <out.csv> | --write-payouts]";

#[derive(Debug, PartialEq)]
enum PayoutTarget {
    Path(PathBuf),
    DataDir,
}

impl PayoutTarget {
    fn sheet(&self, config: &AppConfig, poll: &PollId) -> PayoutSheet {
        let decimals = config.settlement.unit_decimals;
        match self {
            PayoutTarget::Path(path) => PayoutSheet::new(path.clone(), decimals),
            PayoutTarget::DataDir => {
                PayoutSheet::in_data_dir(&config.persistence.data_dir, poll, decimals)
            }
        }
    }
}

#[derive(Debug)]
struct CliArgs {
    snapshot: PathBuf,
    payouts: Option<PayoutTarget>,
}

impl CliArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut snapshot = None;
        let mut payouts = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--payouts" | "--write-payouts" if payouts.is_some() => {
                    bail!("payout sheet given twice")
                }
                "--payouts" => {
                    let path = args.next().context("--payouts needs a path")?;
                    payouts = Some(PayoutTarget::Path(PathBuf::from(path)));
                }
                "--write-payouts" => payouts = Some(PayoutTarget::DataDir),
                flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
                path if snapshot.is_none() => snapshot = Some(PathBuf::from(path)),
                extra => bail!("unexpected argument {extra}"),
            }
        }

        Ok(Self {
            snapshot: snapshot.context(USAGE)?,
            payouts,
        })
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);
    info!("scout-settle starting: {}", config.digest());

    let args = CliArgs::parse(std::env::args().skip(1))?;
    let poll = PollSnapshot::read(&args.snapshot)?.into_poll()?;
    let expires = Utc
        .timestamp_opt(poll.expiry_time(), 0)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| poll.expiry_time().to_string());
    info!(
        poll = %poll.id(),
        location = %poll.location(),
        stakes = poll.stakes().len(),
        state = %poll.state(Utc::now().timestamp()),
        expires = %expires,
        "snapshot loaded"
    );

    if !poll.is_finalized() {
        if args.payouts.is_some() {
            bail!("poll {} is not finalized; no payout sheet to write", poll.id());
        }
        let [option1, option2] = preview_all_outcomes(poll.stakes())?;
        let preview = serde_json::json!({
            "poll": poll.id(),
            "option1": { "label": poll.labels().option1, "settlement": option1 },
            "option2": { "label": poll.labels().option2, "settlement": option2 },
        });
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    let result = compute_settlement(&poll)?;
    if !result.has_winners() {
        warn!(
            poll = %poll.id(),
            total_pool = result.total_pool,
            "no stake on the winning option; pool retained by creator"
        );
    }
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(target) = args.payouts {
        target.sheet(&config, poll.id()).write(poll.id(), &result)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse(args: &[&str]) -> Result<CliArgs> {
        CliArgs::parse(args.iter().map(|a| a.to_string()))
    }

    fn config_with_data_dir(data_dir: &str) -> AppConfig {
        serde_json::from_value(serde_json::json!({
            "settlement": { "asset_symbol": "APT", "unit_decimals": 8 },
            "logging": { "level": "info", "json": false },
            "persistence": { "data_dir": data_dir },
        }))
        .unwrap()
    }

    #[test]
    fn explicit_payout_path() {
        let args = parse(&["poll.json", "--payouts", "out.csv"]).unwrap();
        assert_eq!(args.snapshot, PathBuf::from("poll.json"));
        assert_eq!(args.payouts, Some(PayoutTarget::Path("out.csv".into())));
    }

    #[test]
    fn write_payouts_uses_configured_data_dir() {
        let args = parse(&["--write-payouts", "poll.json"]).unwrap();
        let config = config_with_data_dir("/var/scout");
        let sheet = args
            .payouts
            .unwrap()
            .sheet(&config, &PollId::new("0xhost", 3));
        assert_eq!(sheet.path(), Path::new("/var/scout/payouts/0xhost_3.csv"));
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["poll.json", "--payouts"]).is_err());
        assert!(parse(&["poll.json", "--write-payouts", "--payouts", "x.csv"]).is_err());
        assert!(parse(&["poll.json", "other.json"]).is_err());
        assert!(parse(&["poll.json", "--verbose"]).is_err());
    }
}
