use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Timelike};
use serde::Serialize;

use crate::aggregate::hourly_totals;
use crate::config::TipsConfig;
use crate::error::{AnalysisError, Result};
use crate::reading::RawReading;

// ==================== Summary Types ====================

/// Headline numbers for a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewStats {
    /// Sum of all readings
    pub total_kwh: f64,
    /// Whole days between first and last reading, inclusive
    pub span_days: i64,
    /// Total divided by the span
    pub avg_daily_kwh: f64,
    /// Hour of day (0-23) of the busiest clock hour
    pub peak_hour: Option<u32>,
    /// Number of readings
    pub records: usize,
}

/// Consumption attributed to one appliance or room.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub name: String,
    pub total_kwh: f64,
    /// Share of the summed category totals, in percent
    pub share_percent: f64,
}

/// Daily consumption of one appliance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplianceDaily {
    pub date: NaiveDate,
    pub appliance: String,
    pub total_kwh: f64,
}

/// Average hourly consumption for one (hour, weekday) slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    /// Hour of day (0-23)
    pub hour: u32,
    /// Day of week (0=Monday, 6=Sunday)
    pub weekday: u32,
    pub mean_kwh: f64,
    /// Number of hourly totals averaged
    pub samples: usize,
}

/// Cost summed over one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCost {
    pub date: NaiveDate,
    pub cost: f64,
}

/// Temperature against usage for every reading that has a temperature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureCorrelation {
    /// (temperature °C, usage kWh)
    pub pairs: Vec<(f64, f64)>,
    /// Pearson coefficient, if defined
    pub pearson: Option<f64>,
}

/// Category of a saving tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TipCategory {
    /// One of the largest consumers
    TopConsumer,
    /// Lighting above its expected share
    Lighting,
    /// Refrigeration above its expected share
    Refrigeration,
}

/// Generated energy-saving suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tip {
    pub category: TipCategory,
    pub appliance: String,
    pub share_percent: f64,
    pub message: String,
}

/// Returns the full name of a weekday index (0=Monday).
pub fn weekday_name(weekday: u32) -> &'static str {
    match weekday {
        0 => "Monday",
        1 => "Tuesday",
        2 => "Wednesday",
        3 => "Thursday",
        4 => "Friday",
        5 => "Saturday",
        6 => "Sunday",
        _ => "Unknown",
    }
}

// ==================== Overview ====================

/// Totals, span and peak hour of a dataset.
pub fn overview(readings: &[RawReading]) -> Result<OverviewStats> {
    let first = readings.iter().map(|r| r.timestamp).min();
    let last = readings.iter().map(|r| r.timestamp).max();
    let (Some(first), Some(last)) = (first, last) else {
        return Err(AnalysisError::EmptyDataset);
    };

    let total_kwh: f64 = readings.iter().map(|r| r.usage_kwh).sum();
    let span_days = (last - first).num_days() + 1;

    let peak_hour = hourly_totals(readings)
        .into_iter()
        .fold(None, |best: Option<(f64, u32)>, h| match best {
            Some((max, _)) if max >= h.total_kwh => best,
            _ => Some((h.total_kwh, h.hour.hour())),
        })
        .map(|(_, hour)| hour);

    Ok(OverviewStats {
        total_kwh,
        span_days,
        avg_daily_kwh: total_kwh / span_days as f64,
        peak_hour,
        records: readings.len(),
    })
}

// ==================== Category Totals ====================

fn category_totals<F>(readings: &[RawReading], key: F) -> Vec<CategoryTotal>
where
    F: Fn(&RawReading) -> Option<&str>,
{
    let mut groups: BTreeMap<&str, f64> = BTreeMap::new();
    for reading in readings {
        if let Some(name) = key(reading) {
            *groups.entry(name).or_default() += reading.usage_kwh;
        }
    }

    let grand_total: f64 = groups.values().sum();
    groups
        .into_iter()
        .map(|(name, total_kwh)| CategoryTotal {
            name: name.to_string(),
            total_kwh,
            share_percent: if grand_total != 0.0 {
                total_kwh / grand_total * 100.0
            } else {
                0.0
            },
        })
        .collect()
}

/// Consumption per appliance, largest first.
pub fn appliance_totals(readings: &[RawReading]) -> Vec<CategoryTotal> {
    let mut totals = category_totals(readings, |r| r.appliance.as_deref());
    totals.sort_by(|a, b| {
        b.total_kwh
            .total_cmp(&a.total_kwh)
            .then_with(|| a.name.cmp(&b.name))
    });
    totals
}

/// Consumption per room, in name order.
pub fn room_totals(readings: &[RawReading]) -> Vec<CategoryTotal> {
    category_totals(readings, |r| r.room.as_deref())
}

/// Daily totals for each selected appliance, ordered by date then name.
pub fn appliance_daily_trend(readings: &[RawReading], selected: &[&str]) -> Vec<ApplianceDaily> {
    let mut groups: BTreeMap<(NaiveDate, &str), f64> = BTreeMap::new();
    for reading in readings {
        let Some(appliance) = reading.appliance.as_deref() else {
            continue;
        };
        if selected.contains(&appliance) {
            *groups.entry((reading.date(), appliance)).or_default() += reading.usage_kwh;
        }
    }

    groups
        .into_iter()
        .map(|((date, appliance), total_kwh)| ApplianceDaily {
            date,
            appliance: appliance.to_string(),
            total_kwh,
        })
        .collect()
}

// ==================== Time Patterns ====================

/// Mean hourly consumption per (hour, weekday), ordered by hour then weekday.
pub fn hourly_heatmap(readings: &[RawReading]) -> Vec<HeatmapCell> {
    let mut slots: BTreeMap<(u32, u32), Vec<f64>> = BTreeMap::new();
    for total in hourly_totals(readings) {
        let key = (
            total.hour.hour(),
            total.hour.weekday().num_days_from_monday(),
        );
        slots.entry(key).or_default().push(total.total_kwh);
    }

    slots
        .into_iter()
        .map(|((hour, weekday), values)| HeatmapCell {
            hour,
            weekday,
            mean_kwh: values.iter().sum::<f64>() / values.len() as f64,
            samples: values.len(),
        })
        .collect()
}

/// Cost per date. Readings without a cost contribute zero.
pub fn daily_cost_trend(readings: &[RawReading]) -> Vec<DailyCost> {
    let mut groups: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for reading in readings {
        *groups.entry(reading.date()).or_default() += reading.cost.unwrap_or(0.0);
    }

    groups
        .into_iter()
        .map(|(date, cost)| DailyCost { date, cost })
        .collect()
}

// ==================== Correlation ====================

/// Temperature/usage pairs and their Pearson correlation.
pub fn temperature_correlation(readings: &[RawReading]) -> TemperatureCorrelation {
    let pairs: Vec<(f64, f64)> = readings
        .iter()
        .filter_map(|r| r.temperature_c.map(|t| (t, r.usage_kwh)))
        .collect();
    let pearson = pearson(&pairs);

    TemperatureCorrelation { pairs, pearson }
}

/// Pearson correlation coefficient; `None` with fewer than two pairs or zero variance.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator < f64::EPSILON {
        return None;
    }
    Some(cov / denominator)
}

// ==================== Saving Tips ====================

/// Rule-based tips derived from appliance shares.
pub fn smart_tips(readings: &[RawReading], config: &TipsConfig) -> Vec<Tip> {
    let totals = appliance_totals(readings);
    let mut tips = Vec::new();

    for total in totals.iter().take(config.top_n) {
        tips.push(Tip {
            category: TipCategory::TopConsumer,
            appliance: total.name.clone(),
            share_percent: total.share_percent,
            message: format!(
                "{} uses {:.1}% of the total, consider optimizing it.",
                total.name, total.share_percent
            ),
        });
    }

    let share_of = |name: &str| {
        totals
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.share_percent)
    };

    if let Some(share) = share_of("Lights").filter(|s| *s > config.lights_share_percent) {
        tips.push(Tip {
            category: TipCategory::Lighting,
            appliance: "Lights".to_string(),
            share_percent: share,
            message: "Lights are consuming high power, use LEDs or motion sensors.".to_string(),
        });
    }

    if let Some(share) = share_of("Refrigerator").filter(|s| *s > config.fridge_share_percent) {
        tips.push(Tip {
            category: TipCategory::Refrigeration,
            appliance: "Refrigerator".to_string(),
            share_percent: share,
            message: format!(
                "Refrigerator is above {:.0}% of the total, \
                 check the door seals and clean the coils.",
                config.fridge_share_percent
            ),
        });
    }

    tips
}
