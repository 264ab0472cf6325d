//! CSV ingestion
//!
//! Normalizes the column names found in exported energy datasets, parses
//! timestamps and hands validated [`RawReading`]s to the analysis stages.
//! Rows whose timestamp cannot be parsed are dropped; a missing or
//! unparseable usage value is an error.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use sha2::{Digest, Sha256};

use crate::error::{AnalysisError, Result};
use crate::reading::RawReading;

/// Canonical name of the consumption column.
pub const USAGE_COLUMN: &str = "Usage_KWh";

/// Canonical name of the timestamp column.
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

const USAGE_ALIASES: [&str; 5] = [
    "Usage_KWh",
    "Usage_kWh",
    "Usage_Kwh",
    "usage_kwh",
    "usage_KWh",
];
const APPLIANCE_COLUMNS: [&str; 1] = ["Appliance"];
const ROOM_COLUMNS: [&str; 1] = ["Room"];
const TEMPERATURE_COLUMNS: [&str; 2] = ["Temperature (°C)", "Temperature"];
const COST_COLUMNS: [&str; 2] = ["Cost(INR)", "Cost"];

const DATETIME_FORMATS: [&str; 7] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %H:%M",
];

/// Column positions resolved from a header row
#[derive(Debug, Clone, PartialEq)]
struct ColumnMap {
    timestamp: usize,
    usage: usize,
    appliance: Option<usize>,
    room: Option<usize>,
    temperature: Option<usize>,
    cost: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let names: Vec<&str> = headers.iter().map(str::trim).collect();
        let find = |candidates: &[&str]| {
            candidates
                .iter()
                .find_map(|c| names.iter().position(|n| n == c))
        };

        let timestamp = names
            .iter()
            .position(|n| *n == TIMESTAMP_COLUMN)
            .or_else(|| {
                names.iter().position(|n| {
                    let lower = n.to_lowercase();
                    lower.contains("date") || lower.contains("time")
                })
            })
            .ok_or_else(|| AnalysisError::MissingColumn(TIMESTAMP_COLUMN.to_string()))?;

        let usage = find(&USAGE_ALIASES)
            .ok_or_else(|| AnalysisError::MissingColumn(USAGE_COLUMN.to_string()))?;

        Ok(Self {
            timestamp,
            usage,
            appliance: find(&APPLIANCE_COLUMNS),
            room: find(&ROOM_COLUMNS),
            temperature: find(&TEMPERATURE_COLUMNS),
            cost: find(&COST_COLUMNS),
        })
    }
}

/// Parse a timestamp in any of the accepted layouts.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Read readings from CSV data.
pub fn read_readings<R: Read>(source: R) -> Result<Vec<RawReading>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(source);
    let columns = ColumnMap::resolve(reader.headers()?)?;

    let mut readings = Vec::new();
    let mut dropped = 0usize;

    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();

        let Some(timestamp) = parse_timestamp(field(columns.timestamp)) else {
            tracing::debug!(
                line,
                value = field(columns.timestamp),
                "Dropping row with unparseable timestamp"
            );
            dropped += 1;
            continue;
        };

        let raw_usage = field(columns.usage);
        let usage_kwh = raw_usage
            .parse::<f64>()
            .map_err(|_| AnalysisError::InvalidValue {
                row: line,
                column: USAGE_COLUMN.to_string(),
                value: raw_usage.to_string(),
            })?;

        let text = |idx: Option<usize>| {
            idx.map(field)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let number = |idx: Option<usize>| idx.map(field).and_then(|s| s.parse::<f64>().ok());

        readings.push(RawReading {
            timestamp,
            usage_kwh,
            appliance: text(columns.appliance),
            room: text(columns.room),
            temperature_c: number(columns.temperature),
            cost: number(columns.cost),
        });
    }

    if dropped > 0 {
        tracing::warn!(dropped, kept = readings.len(), "Dropped rows with unparseable timestamps");
    }

    if readings.is_empty() {
        return Err(AnalysisError::EmptyDataset);
    }

    tracing::info!(rows = readings.len(), "Loaded readings");
    Ok(readings)
}

/// Read readings from a CSV file.
pub fn load_csv(path: &Path) -> Result<Vec<RawReading>> {
    let file = fs::File::open(path)?;
    read_readings(file)
}

/// Hex-encoded SHA-256 of file content, used as the cache key.
pub fn content_key(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Parsed datasets keyed by the hash of their content.
///
/// Entries live until explicitly invalidated or cleared.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<String, Arc<Vec<RawReading>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `bytes`, or return the readings cached for identical content.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<Arc<Vec<RawReading>>> {
        let key = content_key(bytes);
        if let Some(readings) = self.entries.get(&key) {
            tracing::debug!(key = %&key[..12], "Dataset cache hit");
            return Ok(Arc::clone(readings));
        }

        let readings = Arc::new(read_readings(bytes)?);
        self.entries.insert(key, Arc::clone(&readings));
        Ok(readings)
    }

    /// Read and parse a file through the cache.
    pub fn load(&mut self, path: &Path) -> Result<Arc<Vec<RawReading>>> {
        let bytes = fs::read(path)?;
        self.load_bytes(&bytes)
    }

    /// Drop the entry for a content key. Returns whether one existed.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
