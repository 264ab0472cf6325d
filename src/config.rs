use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::AnalysisError;
use crate::ml::ForecastMode;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub data: DataConfig,
    pub forecast: ForecastConfig,
    pub tips: TipsConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// CSV used when no file is given on the command line
    pub dataset_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("Energy dataset.csv"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    pub mode: ForecastMode,
    /// Number of future days to predict
    pub horizon: i64,
    /// Largest horizon the front end accepts
    pub max_horizon: i64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            mode: ForecastMode::Simple,
            horizon: 7,
            max_horizon: 90,
        }
    }
}

impl ForecastConfig {
    /// Reject horizons outside `1..=max_horizon`.
    pub fn validate(&self) -> std::result::Result<(), AnalysisError> {
        if self.horizon <= 0 || self.horizon > self.max_horizon {
            return Err(AnalysisError::InvalidHorizon(self.horizon));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TipsConfig {
    /// How many of the largest consumers get a tip
    pub top_n: usize,
    pub lights_share_percent: f64,
    pub fridge_share_percent: f64,
}

impl Default for TipsConfig {
    fn default() -> Self {
        Self {
            top_n: 3,
            lights_share_percent: 5.0,
            fridge_share_percent: 20.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("exports"),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        // Load .env file (silently ignore if not present)
        let _ = dotenvy::dotenv();

        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ecowatt");

        let builder = Config::builder()
            // 1. Load default values
            // Data
            .set_default("data.dataset_path", "Energy dataset.csv")?
            // Forecast
            .set_default("forecast.mode", "simple")?
            .set_default("forecast.horizon", 7)?
            .set_default("forecast.max_horizon", 90)?
            // Tips
            .set_default("tips.top_n", 3)?
            .set_default("tips.lights_share_percent", 5.0)?
            .set_default("tips.fridge_share_percent", 20.0)?
            // Export
            .set_default("export.output_dir", "exports")?

            // 2. Load from local config file (optional, lowest priority)
            .add_source(File::from(PathBuf::from("config.toml")).required(false))

            // 3. Load from user config directory (optional, overrides local)
            .add_source(File::from(config_dir.join("config.toml")).required(false))

            // 4. Load from Environment variables (ECOWATT__FORECAST__HORIZON=...)
            .add_source(Environment::with_prefix("ECOWATT").separator("__"));

        let s = builder.build()?;
        let config: Self = s.try_deserialize().context("Invalid configuration")?;
        config
            .forecast
            .validate()
            .context("Invalid forecast configuration")?;
        Ok(config)
    }
}
