//! CSV file data adapter.
//!
//! Two layouts are accepted, told apart by the header:
//!
//! - `token_id,timestamp,open,high,low,close`
//! - `token_id,timestamp,price` (a price history; every OHLC field is the price)
//!
//! Timestamps are unix seconds or RFC 3339 date-times.

use crate::domain::bar::Bar;
use crate::domain::error::ProbtraderError;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    path: PathBuf,
}

#[derive(Debug, Clone, Copy)]
enum Layout {
    Ohlc {
        open: usize,
        high: usize,
        low: usize,
        close: usize,
    },
    Price(usize),
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    token_id: usize,
    timestamp: usize,
    layout: Layout,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, ProbtraderError> {
        let find = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
        let required = |name: &str| {
            find(name).ok_or_else(|| parse_error(format!("missing {name} column")))
        };

        let layout = match (find("open"), find("high"), find("low"), find("close")) {
            (Some(open), Some(high), Some(low), Some(close)) => Layout::Ohlc {
                open,
                high,
                low,
                close,
            },
            _ => Layout::Price(required("price")?),
        };
        Ok(Self {
            token_id: required("token_id")?,
            timestamp: required("timestamp")?,
            layout,
        })
    }
}

fn parse_error(reason: impl Into<String>) -> ProbtraderError {
    ProbtraderError::DataParse {
        reason: reason.into(),
    }
}

fn field<'r>(record: &'r csv::StringRecord, index: usize, name: &str, line: u64) -> Result<&'r str, ProbtraderError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| parse_error(format!("line {line}: missing {name}")))
}

fn number(record: &csv::StringRecord, index: usize, name: &str, line: u64) -> Result<f64, ProbtraderError> {
    let raw = field(record, index, name, line)?;
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| parse_error(format!("line {line}: invalid {name} value {raw:?}")))
}

/// Unix seconds, RFC 3339, or `YYYY-MM-DD HH:MM:SS` taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<i64>() {
        return Some(secs);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn parse(content: &str) -> Result<Vec<Bar>, ProbtraderError> {
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| parse_error(format!("CSV header error: {e}")))?
            .clone();
        let columns = Columns::from_headers(&headers)?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| parse_error(format!("CSV parse error: {e}")))?;
            let line = record.position().map_or(0, |p| p.line());

            let token_id = field(&record, columns.token_id, "token_id", line)?;
            if token_id.is_empty() {
                return Err(parse_error(format!("line {line}: empty token_id")));
            }
            let raw_ts = field(&record, columns.timestamp, "timestamp", line)?;
            let timestamp = parse_timestamp(raw_ts)
                .ok_or_else(|| parse_error(format!("line {line}: invalid timestamp {raw_ts:?}")))?;

            let bar = match columns.layout {
                Layout::Ohlc {
                    open,
                    high,
                    low,
                    close,
                } => Bar::new(
                    token_id,
                    timestamp,
                    number(&record, open, "open", line)?,
                    number(&record, high, "high", line)?,
                    number(&record, low, "low", line)?,
                    number(&record, close, "close", line)?,
                ),
                Layout::Price(price) => {
                    Bar::from_price(token_id, timestamp, number(&record, price, "price", line)?)
                }
            };
            bars.push(bar);
        }

        bars.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.token_id.cmp(&b.token_id))
        });
        tracing::debug!(bars = bars.len(), "parsed bars");
        Ok(bars)
    }
}

impl DataPort for CsvAdapter {
    fn load_bars(&self) -> Result<Vec<Bar>, ProbtraderError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            parse_error(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        Self::parse(&content)
    }
}
