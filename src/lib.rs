//! EcoWatt Library
//!
//! Loads household electricity readings, aggregates them into daily totals,
//! and forecasts future consumption with a linear trend model.

pub mod aggregate;
pub mod analytics;
pub mod config;
pub mod error;
pub mod export;
pub mod loader;
pub mod ml;
pub mod reading;
pub mod traits;

// Re-export commonly used types
pub use aggregate::{DailyPoint, DailySeries, HourlyTotal, aggregate, hourly_totals};
pub use analytics::{
    ApplianceDaily,
    CategoryTotal,
    DailyCost,
    HeatmapCell,
    // Overview
    OverviewStats,
    TemperatureCorrelation,
    // Saving tips
    Tip,
    TipCategory,
    appliance_daily_trend,
    appliance_totals,
    daily_cost_trend,
    hourly_heatmap,
    overview,
    room_totals,
    smart_tips,
    temperature_correlation,
    weekday_name,
};
pub use config::AppConfig;
pub use error::{AnalysisError, Result};
pub use loader::{DatasetCache, load_csv, read_readings};
pub use ml::{
    FitMetrics, ForecastMode, ForecastReport, ForecastRow, Forecaster, TrainedModel, fit, predict,
};
pub use reading::RawReading;
pub use traits::{Clock, MockClock, SystemClock};
