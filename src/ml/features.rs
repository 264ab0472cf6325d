//! Feature construction for the extended forecaster
//!
//! Converts a daily series into calendar, lag and rolling features. Lags and
//! rolling windows count rows of the series, not calendar days: when dates
//! are missing, `lag_7` is simply the value seven rows earlier.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::aggregate::DailySeries;
use crate::error::{AnalysisError, Result};

/// Row offsets used for lag features.
pub const LAG_OFFSETS: [usize; 3] = [1, 7, 30];

/// Window lengths used for rolling means.
pub const ROLLING_WINDOWS: [usize; 2] = [7, 30];

/// Rows of history a training row needs before every lag is defined.
pub const MAX_LAG: usize = 30;

/// Features for a single day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub date: NaiveDate,

    // Calendar decomposition
    pub day: u32,
    pub month: u32,
    pub year: i32,
    /// Monday = 0
    pub dow: u32,
    pub weekend: bool,

    // Trailing history, `None` while there are not enough rows
    pub lag_1: Option<f64>,
    pub lag_7: Option<f64>,
    pub lag_30: Option<f64>,
    pub roll_7: Option<f64>,
    pub roll_30: Option<f64>,
}

impl FeatureRow {
    /// Number of features
    pub const NUM_FEATURES: usize = 10;

    /// Feature names in model column order
    pub const FEATURE_NAMES: [&'static str; Self::NUM_FEATURES] = [
        "day", "month", "year", "dow", "weekend", "lag_1", "lag_7", "lag_30", "roll_7", "roll_30",
    ];

    /// Row with calendar fields set and no history.
    fn calendar(date: NaiveDate) -> Self {
        let dow = date.weekday().num_days_from_monday();
        Self {
            date,
            day: date.day(),
            month: date.month(),
            year: date.year(),
            dow,
            weekend: dow >= 5,
            lag_1: None,
            lag_7: None,
            lag_30: None,
            roll_7: None,
            roll_30: None,
        }
    }

    /// Whether every lag and rolling feature is defined.
    pub fn is_complete(&self) -> bool {
        self.to_vec().is_some()
    }

    /// Convert to a model input vector, or `None` if any history feature is missing.
    pub fn to_vec(&self) -> Option<Vec<f64>> {
        Some(vec![
            self.day as f64,
            self.month as f64,
            self.year as f64,
            self.dow as f64,
            if self.weekend { 1.0 } else { 0.0 },
            self.lag_1?,
            self.lag_7?,
            self.lag_30?,
            self.roll_7?,
            self.roll_30?,
        ])
    }
}

/// Model inputs and targets derived from a daily series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingTable {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

impl TrainingTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Build one feature row per day of the series.
///
/// Rolling means end at the row itself and are `None` until a full window is
/// available; lag `k` is `None` for the first `k` rows.
pub fn build_features(daily: &DailySeries) -> Vec<FeatureRow> {
    let values = daily.values();

    daily
        .points()
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let mut row = FeatureRow::calendar(point.date);
            row.lag_1 = lag_at(&values, i, LAG_OFFSETS[0]);
            row.lag_7 = lag_at(&values, i, LAG_OFFSETS[1]);
            row.lag_30 = lag_at(&values, i, LAG_OFFSETS[2]);
            row.roll_7 = full_window_mean(&values[..=i], ROLLING_WINDOWS[0]);
            row.roll_30 = full_window_mean(&values[..=i], ROLLING_WINDOWS[1]);
            row
        })
        .collect()
}

/// Training table for the extended model: rows lacking full history are dropped.
pub fn build_training_table(daily: &DailySeries) -> TrainingTable {
    let mut table = TrainingTable::default();

    for (row, point) in build_features(daily).into_iter().zip(daily.points()) {
        if let Some(features) = row.to_vec() {
            table.dates.push(point.date);
            table.rows.push(features);
            table.targets.push(point.total_kwh);
        }
    }

    tracing::debug!(
        days = daily.len(),
        rows = table.len(),
        "Built extended training table"
    );
    table
}

/// Features for the day after `history`, where `history` may already hold
/// earlier predictions.
///
/// A lag longer than the history falls back to the last value, and rolling
/// means use as many trailing rows as exist.
pub fn build_future_feature(history: &DailySeries, next_date: NaiveDate) -> Result<FeatureRow> {
    let values = history.values();
    let last = *values.last().ok_or(AnalysisError::EmptyDataset)?;

    let lag = |k: usize| {
        if values.len() >= k {
            values[values.len() - k]
        } else {
            last
        }
    };

    let mut row = FeatureRow::calendar(next_date);
    row.lag_1 = Some(lag(LAG_OFFSETS[0]));
    row.lag_7 = Some(lag(LAG_OFFSETS[1]));
    row.lag_30 = Some(lag(LAG_OFFSETS[2]));
    row.roll_7 = Some(tail_mean(&values, ROLLING_WINDOWS[0]));
    row.roll_30 = Some(tail_mean(&values, ROLLING_WINDOWS[1]));
    Ok(row)
}

fn lag_at(values: &[f64], i: usize, k: usize) -> Option<f64> {
    i.checked_sub(k).map(|j| values[j])
}

/// Mean of the last `window` values, `None` if fewer are available.
fn full_window_mean(values: &[f64], window: usize) -> Option<f64> {
    if values.len() < window {
        return None;
    }
    Some(tail_mean(values, window))
}

/// Mean of the last `min(window, len)` values.
fn tail_mean(values: &[f64], window: usize) -> f64 {
    let start = values.len().saturating_sub(window);
    let tail = &values[start..];
    if tail.is_empty() {
        return 0.0;
    }
    tail.iter().sum::<f64>() / tail.len() as f64
}
