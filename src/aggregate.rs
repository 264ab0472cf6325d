//! Reduction of raw readings to daily and hourly totals.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::reading::RawReading;

/// Total consumption for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub total_kwh: f64,
    /// Zero-based position in the sorted series.
    pub day_index: usize,
}

/// Daily totals sorted by date, one entry per date that has readings.
///
/// Dates without readings are absent rather than zero, so consecutive
/// indices may be more than one calendar day apart.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DailySeries {
    points: Vec<DailyPoint>,
}

impl DailySeries {
    /// Build a series from (date, total) pairs. Pairs sharing a date are summed.
    pub fn from_totals<I>(totals: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut groups: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for (date, total) in totals {
            groups.entry(date).or_default().push(total);
        }
        Self::from_groups(groups)
    }

    fn from_groups(groups: BTreeMap<NaiveDate, Vec<f64>>) -> Self {
        let points = groups
            .into_iter()
            .enumerate()
            .map(|(day_index, (date, values))| DailyPoint {
                date,
                total_kwh: stable_sum(values),
                day_index,
            })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[DailyPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Consumption values in index order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.total_kwh).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Sum of all daily totals.
    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.total_kwh).sum()
    }

    /// Append a day after the current last date, taking the next index.
    pub(crate) fn push(&mut self, date: NaiveDate, total_kwh: f64) {
        debug_assert!(self.last_date().is_none_or(|last| date > last));
        let day_index = self.points.len();
        self.points.push(DailyPoint {
            date,
            total_kwh,
            day_index,
        });
    }
}

/// Total consumption for one clock hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourlyTotal {
    pub hour: NaiveDateTime,
    pub total_kwh: f64,
}

/// Group readings by calendar date and sum consumption per date.
///
/// Readings sharing a timestamp are all summed; each one is a separate
/// appliance sample.
pub fn aggregate(readings: &[RawReading]) -> Result<DailySeries> {
    if readings.is_empty() {
        return Err(AnalysisError::EmptyDataset);
    }

    let mut groups: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for reading in readings {
        groups.entry(reading.date()).or_default().push(reading.usage_kwh);
    }

    let series = DailySeries::from_groups(groups);
    tracing::debug!(
        readings = readings.len(),
        days = series.len(),
        "Aggregated readings into daily series"
    );
    Ok(series)
}

/// Per-hour totals in ascending order, only for hours that have readings.
pub fn hourly_totals(readings: &[RawReading]) -> Vec<HourlyTotal> {
    let mut groups: BTreeMap<NaiveDateTime, Vec<f64>> = BTreeMap::new();
    for reading in readings {
        groups
            .entry(reading.hour_start())
            .or_default()
            .push(reading.usage_kwh);
    }

    groups
        .into_iter()
        .map(|(hour, values)| HourlyTotal {
            hour,
            total_kwh: stable_sum(values),
        })
        .collect()
}

/// Sum in value order so the result does not depend on input row order.
fn stable_sum(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    values.into_iter().sum()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_aggregate_empty_fails() {
        assert!(matches!(aggregate(&[]), Err(AnalysisError::EmptyDataset)));
    }

    #[test]
    fn test_aggregate_sums_per_date() {
        let readings = vec![
            RawReading::new(at(2, 8, 0), 1.5),
            RawReading::new(at(1, 9, 0), 2.0),
            RawReading::new(at(2, 20, 30), 0.5),
            RawReading::new(at(1, 23, 59), 1.0),
        ];

        let series = aggregate(&readings).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0].date, date(1));
        assert_relative_eq!(series.points()[0].total_kwh, 3.0);
        assert_eq!(series.points()[1].date, date(2));
        assert_relative_eq!(series.points()[1].total_kwh, 2.0);
    }

    #[test]
    fn test_identical_timestamps_are_summed() {
        let readings = vec![
            RawReading::new(at(5, 12, 0), 1.0).with_appliance("Fridge"),
            RawReading::new(at(5, 12, 0), 1.0).with_appliance("TV"),
        ];

        let series = aggregate(&readings).unwrap();

        assert_eq!(series.len(), 1);
        assert_relative_eq!(series.points()[0].total_kwh, 2.0);
    }

    #[test]
    fn test_gaps_are_not_filled() {
        let readings = vec![
            RawReading::new(at(1, 10, 0), 1.0),
            RawReading::new(at(4, 10, 0), 1.0),
            RawReading::new(at(9, 10, 0), 1.0),
        ];

        let series = aggregate(&readings).unwrap();

        assert_eq!(series.len(), 3);
        let indices: Vec<usize> = series.points().iter().map(|p| p.day_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(series.last_date(), Some(date(9)));
    }

    #[test]
    fn test_from_totals_merges_duplicate_dates() {
        let series = DailySeries::from_totals(vec![(date(3), 1.0), (date(1), 4.0), (date(3), 2.0)]);

        assert_eq!(series.values(), vec![4.0, 3.0]);
        assert_eq!(series.first_date(), Some(date(1)));
    }

    #[test]
    fn test_push_assigns_next_index() {
        let mut series = DailySeries::from_totals(vec![(date(1), 1.0), (date(2), 2.0)]);
        series.push(date(3), 3.0);

        assert_eq!(series.len(), 3);
        assert_eq!(series.points()[2].day_index, 2);
        assert_relative_eq!(series.total(), 6.0);
    }

    #[test]
    fn test_hourly_totals() {
        let readings = vec![
            RawReading::new(at(1, 10, 5), 1.0),
            RawReading::new(at(1, 10, 55), 2.0),
            RawReading::new(at(1, 11, 0), 4.0),
        ];

        let hourly = hourly_totals(&readings);

        assert_eq!(hourly.len(), 2);
        assert_eq!(hourly[0].hour, at(1, 10, 0));
        assert_relative_eq!(hourly[0].total_kwh, 3.0);
        assert_relative_eq!(hourly[1].total_kwh, 4.0);
    }

    #[test]
    fn test_hourly_totals_empty() {
        assert!(hourly_totals(&[]).is_empty());
    }

    // ==================== Property-Based Tests ====================

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        fn reading_strategy() -> impl Strategy<Value = RawReading> {
            (1u32..=28, 0u32..24, 0u32..60, 0.0f64..50.0)
                .prop_map(|(day, hour, minute, usage)| {
                    RawReading::new(at(day, hour, minute), usage)
                })
        }

        proptest! {
            #[test]
            fn aggregate_ignores_row_order(
                (readings, shuffled) in prop::collection::vec(reading_strategy(), 1..80)
                    .prop_flat_map(|readings| {
                        let shuffled = Just(readings.clone()).prop_shuffle();
                        (Just(readings), shuffled)
                    })
            ) {
                let a = aggregate(&readings).unwrap();
                let b = aggregate(&shuffled).unwrap();
                prop_assert_eq!(a, b);
            }

            #[test]
            fn day_indices_are_contiguous(
                readings in prop::collection::vec(reading_strategy(), 1..80)
            ) {
                let series = aggregate(&readings).unwrap();
                let mut distinct: Vec<NaiveDate> = readings.iter().map(|r| r.date()).collect();
                distinct.sort();
                distinct.dedup();

                prop_assert_eq!(series.len(), distinct.len());
                for (i, point) in series.points().iter().enumerate() {
                    prop_assert_eq!(point.day_index, i);
                    prop_assert_eq!(point.date, distinct[i]);
                }
            }

            #[test]
            fn aggregation_preserves_total(
                readings in prop::collection::vec(reading_strategy(), 1..80)
            ) {
                let series = aggregate(&readings).unwrap();
                let raw_total: f64 = readings.iter().map(|r| r.usage_kwh).sum();
                prop_assert!((series.total() - raw_total).abs() < 1e-6,
                    "daily total {} differs from raw total {}", series.total(), raw_total);
            }
        }
    }
}
