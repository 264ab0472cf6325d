//! Daily consumption forecasting
//!
//! This module fits linear trend models to a daily series and extrapolates
//! them over a horizon of future days. Two feature sets are supported, see
//! [`ForecastMode`].

pub mod features;
pub mod forecast;
pub mod metrics;
pub mod model;
pub mod training;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::aggregate::DailySeries;
use crate::config::ForecastConfig;
use crate::error::Result;

pub use features::{FeatureRow, TrainingTable, build_features, build_future_feature};
pub use forecast::{ForecastRow, ForecastStep, predict, predict_steps};
pub use metrics::FitMetrics;
pub use model::{ModelBuilder, ModelSummary, TrainedModel};
pub use training::{TrainingResult, fit};

/// Feature set used by a model, chosen at fit time
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ForecastMode {
    /// Day index as the only regressor
    #[default]
    Simple,
    /// Calendar, lag and rolling features, predicted recursively
    Extended,
}

impl ForecastMode {
    /// Names of the model columns, in order
    pub fn feature_names(&self) -> Vec<&'static str> {
        match self {
            ForecastMode::Simple => vec!["day_index"],
            ForecastMode::Extended => FeatureRow::FEATURE_NAMES.to_vec(),
        }
    }

    /// Fewest daily observations that can produce a fit
    pub fn min_observations(&self) -> usize {
        match self {
            ForecastMode::Simple => 2,
            ForecastMode::Extended => features::MAX_LAG + 1,
        }
    }

    /// Model inputs and targets for this feature set
    pub fn training_table(&self, daily: &DailySeries) -> TrainingTable {
        match self {
            ForecastMode::Simple => TrainingTable {
                dates: daily.points().iter().map(|p| p.date).collect(),
                rows: daily
                    .points()
                    .iter()
                    .map(|p| vec![p.day_index as f64])
                    .collect(),
                targets: daily.values(),
            },
            ForecastMode::Extended => features::build_training_table(daily),
        }
    }
}

impl fmt::Display for ForecastMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastMode::Simple => write!(f, "simple"),
            ForecastMode::Extended => write!(f, "extended"),
        }
    }
}

/// Outcome of a full fit-then-predict run
#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    pub model: ModelSummary,
    pub metrics: FitMetrics,
    pub forecast: Vec<ForecastRow>,
}

/// Fits and applies models according to a forecast configuration
#[derive(Debug, Clone)]
pub struct Forecaster {
    config: ForecastConfig,
}

impl Forecaster {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Fit a fresh model in the configured mode
    pub fn fit(&self, daily: &DailySeries) -> Result<TrainingResult> {
        training::fit(daily, self.config.mode)
    }

    /// Predict the configured number of days after the series
    pub fn predict(&self, model: &TrainedModel, daily: &DailySeries) -> Result<Vec<ForecastRow>> {
        forecast::predict(model, daily, self.config.horizon)
    }

    /// Fit, then forecast the configured horizon
    pub fn run(&self, daily: &DailySeries) -> Result<ForecastReport> {
        let TrainingResult { model, metrics } = self.fit(daily)?;
        let forecast = self.predict(&model, daily)?;

        tracing::info!(
            mode = %self.config.mode,
            horizon = self.config.horizon,
            r_squared = metrics.r_squared,
            mae = metrics.mae,
            "Forecast complete"
        );

        Ok(ForecastReport {
            model: model.summary(),
            metrics,
            forecast,
        })
    }
}
