//! CSV bar loader.
//!
//! Expected header: `timestamp,open,high,low,close,volume[,channel]`.
//! Timestamps are RFC 3339 or plain `YYYY-MM-DD` dates (midnight UTC). Bars
//! are indexed in file order; rows must be strictly increasing in time.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use signallab_core::domain::Bar;

#[derive(Debug, Deserialize)]
struct Row {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    #[serde(default)]
    channel: Option<f64>,
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid timestamp '{s}'"))?;
    Ok(date.and_time(NaiveTime::default()).and_utc())
}

pub fn load_bars(path: &Path) -> Result<Vec<Bar>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open bars file {}", path.display()))?;
    load_bars_from_reader(file).with_context(|| format!("failed to load {}", path.display()))
}

pub fn load_bars_from_reader<R: Read>(reader: R) -> Result<Vec<Bar>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars: Vec<Bar> = Vec::new();
    for (i, row) in rdr.deserialize::<Row>().enumerate() {
        let row = row.with_context(|| format!("malformed row {}", i + 1))?;
        let timestamp = parse_timestamp(&row.timestamp)?;
        if let Some(prev) = bars.last() {
            if timestamp <= prev.timestamp {
                bail!(
                    "row {}: timestamp {timestamp} is not after {}",
                    i + 1,
                    prev.timestamp
                );
            }
        }
        let mut bar = Bar::new(i, timestamp, row.open, row.high, row.low, row.close, row.volume);
        if let Some(code) = row.channel {
            bar = bar.with_channel(code);
        }
        bars.push(bar);
    }
    Ok(bars)
}
