//! End-to-end forecasting tests from raw readings to forecast rows.

use approx::assert_relative_eq;
use chrono::{Days, NaiveDate, NaiveDateTime};
use ecowatt::{
    AnalysisError, DailySeries, ForecastMode, Forecaster, RawReading, aggregate,
    config::ForecastConfig,
    fit,
    ml::{FeatureRow, predict_steps},
    predict,
};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 11, 20).unwrap()
}

fn at(day: u64, hour: u32) -> NaiveDateTime {
    (start() + Days::new(day)).and_hms_opt(hour, 0, 0).unwrap()
}

/// Split each daily total over three readings at different hours.
fn readings_for(daily_totals: &[f64]) -> Vec<RawReading> {
    daily_totals
        .iter()
        .enumerate()
        .flat_map(|(day, total)| {
            let day = day as u64;
            [
                RawReading::new(at(day, 7), total * 0.5).with_appliance("Heater"),
                RawReading::new(at(day, 13), total * 0.25).with_appliance("Lights"),
                RawReading::new(at(day, 21), total * 0.25).with_appliance("TV"),
            ]
        })
        .collect()
}

fn seasonal(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            let weekly = if i % 7 >= 5 { 6.0 } else { 0.0 };
            30.0 + 0.1 * t + weekly + 2.0 * (t * 0.7).sin()
        })
        .collect()
}

// ==================== Simple Mode ====================

#[test]
fn test_ten_day_ramp_forecast() {
    let totals: Vec<f64> = (10..20).map(f64::from).collect();
    let daily = aggregate(&readings_for(&totals)).unwrap();

    let forecaster = Forecaster::new(ForecastConfig {
        mode: ForecastMode::Simple,
        horizon: 3,
        ..Default::default()
    });
    let report = forecaster.run(&daily).unwrap();

    let values: Vec<f64> = report.forecast.iter().map(|r| r.predicted_kwh).collect();
    assert_eq!(values.len(), 3);
    for (value, expected) in values.iter().zip([20.0, 21.0, 22.0]) {
        assert_relative_eq!(*value, expected, epsilon = 1e-6);
    }
    assert_relative_eq!(report.metrics.r_squared, 1.0, epsilon = 1e-9);
}

#[test]
fn test_simple_linear_fit_quality() {
    let totals: Vec<f64> = (0..40).map(|i| 5.0 + 2.0 * i as f64).collect();
    let daily = aggregate(&readings_for(&totals)).unwrap();

    let result = fit(&daily, ForecastMode::Simple).unwrap();

    assert!(result.metrics.r_squared >= 0.999);
    assert!(result.metrics.mae <= 1e-6);
}

#[test]
fn test_forecast_dates_are_contiguous() {
    for (mode, days) in [(ForecastMode::Simple, 20), (ForecastMode::Extended, 50)] {
        let daily = aggregate(&readings_for(&seasonal(days))).unwrap();
        let last = daily.last_date().unwrap();
        let model = fit(&daily, mode).unwrap().model;

        let forecast = predict(&model, &daily, 14).unwrap();

        assert_eq!(forecast.len(), 14);
        for (i, row) in forecast.iter().enumerate() {
            assert_eq!(row.date, last + Days::new(i as u64 + 1));
        }
    }
}

// ==================== Extended Mode ====================

#[test]
fn test_extended_lag_chain_over_horizon() {
    let daily = aggregate(&readings_for(&seasonal(75))).unwrap();
    let model = fit(&daily, ForecastMode::Extended).unwrap().model;
    let lag_1 = FeatureRow::FEATURE_NAMES
        .iter()
        .position(|n| *n == "lag_1")
        .unwrap();

    let steps = predict_steps(&model, &daily, 3).unwrap();

    assert_eq!(steps[1].features[lag_1], steps[0].row.predicted_kwh);
    assert_eq!(steps[2].features[lag_1], steps[1].row.predicted_kwh);
}

#[test]
fn test_extended_tracks_weekly_pattern() {
    let daily = aggregate(&readings_for(&seasonal(120))).unwrap();

    let result = fit(&daily, ForecastMode::Extended).unwrap();

    assert_eq!(result.metrics.samples, 90);
    assert!(result.metrics.r_squared > 0.5);
    assert_eq!(result.model.feature_names().len(), FeatureRow::NUM_FEATURES);
}

// ==================== Error Conditions ====================

#[test]
fn test_single_day_is_insufficient() {
    let daily = aggregate(&readings_for(&[12.0])).unwrap();

    assert!(matches!(
        fit(&daily, ForecastMode::Simple),
        Err(AnalysisError::InsufficientData { .. })
    ));
}

#[test]
fn test_short_history_rejected_for_extended() {
    let daily = aggregate(&readings_for(&seasonal(20))).unwrap();

    let err = fit(&daily, ForecastMode::Extended).unwrap_err();

    assert!(matches!(
        err,
        AnalysisError::InsufficientData { needed: 31, got: 20 }
    ));
    assert!(err.to_string().contains("not enough historical data"));
}

#[test]
fn test_non_positive_horizon_rejected() {
    let daily = aggregate(&readings_for(&seasonal(10))).unwrap();
    let model = fit(&daily, ForecastMode::Simple).unwrap().model;

    for horizon in [0, -1] {
        assert!(matches!(
            predict(&model, &daily, horizon),
            Err(AnalysisError::InvalidHorizon(h)) if h == horizon
        ));
    }
}

#[test]
fn test_empty_readings() {
    assert!(matches!(aggregate(&[]), Err(AnalysisError::EmptyDataset)));
    assert!(matches!(
        fit(&DailySeries::default(), ForecastMode::Simple),
        Err(AnalysisError::InsufficientData { needed: 2, got: 0 })
    ));
}

// ==================== Aggregation Feeding the Model ====================

#[test]
fn test_reversed_readings_give_same_forecast() {
    let readings = readings_for(&seasonal(45));
    let mut reversed = readings.clone();
    reversed.reverse();

    let forward = aggregate(&readings).unwrap();
    let backward = aggregate(&reversed).unwrap();
    assert_eq!(forward, backward);

    let a = predict(&fit(&forward, ForecastMode::Extended).unwrap().model, &forward, 5).unwrap();
    let b = predict(&fit(&backward, ForecastMode::Extended).unwrap().model, &backward, 5).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_daily_sum_matches_readings() {
    let readings = readings_for(&seasonal(30));

    let daily = aggregate(&readings).unwrap();

    let raw: f64 = readings.iter().map(|r| r.usage_kwh).sum();
    assert_relative_eq!(daily.total(), raw, epsilon = 1e-9);
    let indices: Vec<usize> = daily.points().iter().map(|p| p.day_index).collect();
    assert_eq!(indices, (0..30).collect::<Vec<_>>());
}
