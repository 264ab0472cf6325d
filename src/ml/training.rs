//! Training pipeline for forecast models

use crate::aggregate::DailySeries;
use crate::error::{AnalysisError, Result};

use super::ForecastMode;
use super::metrics::FitMetrics;
use super::model::{ModelBuilder, TrainedModel};

/// Result of a training run
#[derive(Debug, Clone)]
pub struct TrainingResult {
    /// The trained model
    pub model: TrainedModel,
    /// In-sample fit quality
    pub metrics: FitMetrics,
}

/// Fit a model of the given mode to a daily series and score it in-sample.
pub fn fit(daily: &DailySeries, mode: ForecastMode) -> Result<TrainingResult> {
    let needed = mode.min_observations();
    if daily.len() < needed {
        return Err(AnalysisError::InsufficientData {
            needed,
            got: daily.len(),
        });
    }

    let table = mode.training_table(daily);
    if table.is_empty() {
        return Err(AnalysisError::InsufficientData {
            needed,
            got: daily.len(),
        });
    }

    let model = ModelBuilder::new().train(mode, &table.rows, &table.targets)?;
    let predictions = model.predict_batch(&table.rows)?;
    let metrics = FitMetrics::evaluate(&predictions, &table.targets);

    tracing::info!(
        %mode,
        days = daily.len(),
        samples = table.len(),
        r_squared = metrics.r_squared,
        mae = metrics.mae,
        "Trained forecast model"
    );
    tracing::debug!("{}", model.info());

    Ok(TrainingResult { model, metrics })
}
