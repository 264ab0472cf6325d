//! Multi-step prediction over a horizon of future days

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::aggregate::DailySeries;
use crate::error::{AnalysisError, Result};

use super::ForecastMode;
use super::features::build_future_feature;
use super::model::TrainedModel;

/// Predicted consumption for one future date
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastRow {
    pub date: NaiveDate,
    pub predicted_kwh: f64,
}

/// A forecast row together with the model input that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastStep {
    pub row: ForecastRow,
    pub features: Vec<f64>,
}

/// Predict `horizon` days following the last date of `daily`.
pub fn predict(
    model: &TrainedModel,
    daily: &DailySeries,
    horizon: i64,
) -> Result<Vec<ForecastRow>> {
    Ok(predict_steps(model, daily, horizon)?
        .into_iter()
        .map(|step| step.row)
        .collect())
}

/// Like [`predict`], but keeps the feature vector used at every step.
///
/// Future dates are consecutive calendar days even if the history had gaps.
/// Predictions are not clamped; a falling trend can go negative.
pub fn predict_steps(
    model: &TrainedModel,
    daily: &DailySeries,
    horizon: i64,
) -> Result<Vec<ForecastStep>> {
    let steps = usize::try_from(horizon)
        .ok()
        .filter(|h| *h > 0)
        .ok_or(AnalysisError::InvalidHorizon(horizon))?;
    let last_date = daily.last_date().ok_or(AnalysisError::EmptyDataset)?;
    offset_date(last_date, steps, horizon)?;

    let forecast = match model.mode() {
        ForecastMode::Simple => predict_trend(model, daily.len(), last_date, steps, horizon)?,
        ForecastMode::Extended => predict_recursive(model, daily, steps, horizon)?,
    };

    tracing::debug!(
        mode = %model.mode(),
        horizon,
        first = ?forecast.first().map(|s| s.row.date),
        "Generated forecast"
    );
    Ok(forecast)
}

/// Evaluate the fitted line at indices `n .. n + steps`.
fn predict_trend(
    model: &TrainedModel,
    n: usize,
    last_date: NaiveDate,
    steps: usize,
    horizon: i64,
) -> Result<Vec<ForecastStep>> {
    (0..steps)
        .map(|i| {
            let date = offset_date(last_date, i + 1, horizon)?;
            let features = vec![(n + i) as f64];
            let predicted_kwh = model.predict(&features)?;
            Ok(ForecastStep {
                row: ForecastRow {
                    date,
                    predicted_kwh,
                },
                features,
            })
        })
        .collect()
}

/// Predict one day at a time, appending each prediction to a working copy of
/// the history so it feeds the lag and rolling features of the next day.
///
/// The working copy starts from the whole daily series, including the early
/// rows that were too short on history to train on.
fn predict_recursive(
    model: &TrainedModel,
    daily: &DailySeries,
    steps: usize,
    horizon: i64,
) -> Result<Vec<ForecastStep>> {
    let mut history = daily.clone();
    let mut forecast = Vec::new();

    for _ in 0..steps {
        let last_date = history.last_date().ok_or(AnalysisError::EmptyDataset)?;
        let next_date = offset_date(last_date, 1, horizon)?;

        let row = build_future_feature(&history, next_date)?;
        let features = row
            .to_vec()
            .ok_or_else(|| AnalysisError::Fit(format!("incomplete features for {}", next_date)))?;
        let predicted_kwh = model.predict(&features)?;

        history.push(next_date, predicted_kwh);
        forecast.push(ForecastStep {
            row: ForecastRow {
                date: next_date,
                predicted_kwh,
            },
            features,
        });
    }

    Ok(forecast)
}

fn offset_date(date: NaiveDate, days: usize, horizon: i64) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(days as u64))
        .ok_or(AnalysisError::InvalidHorizon(horizon))
}
