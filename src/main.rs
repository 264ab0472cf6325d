use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ecowatt::{
    AppConfig, DatasetCache, ForecastMode, Forecaster, RawReading, SystemClock, aggregate,
    analytics, export,
};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "ecowatt")]
#[command(about = "Home energy analyzer - usage breakdowns, tips and forecasts")]
struct Args {
    /// CSV dataset (defaults to data.dataset_path from the configuration)
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Totals, peak hour, cost and temperature correlation
    Overview,
    /// Consumption per appliance
    Appliances {
        /// Also print daily totals for these appliances
        #[arg(long, value_delimiter = ',')]
        trend: Vec<String>,
    },
    /// Consumption per room
    Rooms,
    /// Forecast daily consumption
    Forecast {
        #[arg(long, value_enum)]
        mode: Option<ForecastMode>,
        /// Number of days to predict
        #[arg(long, allow_negative_numbers = true)]
        horizon: Option<i64>,
    },
    /// Energy saving tips
    Tips,
    /// Write raw, hourly, daily and forecast tables as CSV
    Export {
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Skip the forecast table
        #[arg(long)]
        no_forecast: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .parse_lossy("ecowatt=debug");

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let path = args
        .file
        .clone()
        .unwrap_or_else(|| config.data.dataset_path.clone());
    let mut cache = DatasetCache::new();
    let readings = cache
        .load(&path)
        .with_context(|| format!("Failed to load dataset {}", path.display()))?;
    tracing::info!(path = %path.display(), records = readings.len(), "Dataset loaded");

    match args.command {
        Command::Overview => run_overview(&readings, args.json),
        Command::Appliances { trend } => run_appliances(&readings, &trend, args.json),
        Command::Rooms => {
            let rooms = analytics::room_totals(&readings);
            if args.json {
                return print_json(&rooms);
            }
            for room in rooms {
                println!(
                    "{:<20} {:>10.2} kWh {:>6.1}%",
                    room.name, room.total_kwh, room.share_percent
                );
            }
            Ok(())
        }
        Command::Forecast { mode, horizon } => {
            let mut forecast_config = config.forecast.clone();
            if let Some(mode) = mode {
                forecast_config.mode = mode;
            }
            if let Some(horizon) = horizon {
                forecast_config.horizon = horizon;
            }
            forecast_config.validate()?;
            run_forecast(&readings, Forecaster::new(forecast_config), args.json)
        }
        Command::Tips => {
            let tips = analytics::smart_tips(&readings, &config.tips);
            if args.json {
                return print_json(&tips);
            }
            if tips.is_empty() {
                println!("No tips for this dataset.");
            }
            for tip in tips {
                println!("- {}", tip.message);
            }
            Ok(())
        }
        Command::Export {
            output_dir,
            no_forecast,
        } => {
            let output_dir = output_dir.unwrap_or_else(|| config.export.output_dir.clone());
            let daily = aggregate(&readings)?;
            let forecast = if no_forecast {
                None
            } else {
                match Forecaster::new(config.forecast.clone()).run(&daily) {
                    Ok(report) => Some(report.forecast),
                    Err(err) if err.is_data_error() => {
                        tracing::warn!(error = %err, "Skipping forecast export");
                        None
                    }
                    Err(err) => return Err(err.into()),
                }
            };

            let paths = export::export_all(
                &output_dir,
                &SystemClock,
                &readings,
                &daily,
                forecast.as_deref(),
            )
            .context("Failed to export CSV tables")?;
            for path in paths {
                println!("{}", path.display());
            }
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

#[derive(Serialize)]
struct OverviewOutput {
    stats: analytics::OverviewStats,
    daily_cost: Vec<analytics::DailyCost>,
    temperature_pearson: Option<f64>,
    heatmap: Vec<analytics::HeatmapCell>,
}

fn run_overview(readings: &[RawReading], json: bool) -> Result<()> {
    let stats = analytics::overview(readings)?;
    let daily_cost = analytics::daily_cost_trend(readings);
    let correlation = analytics::temperature_correlation(readings);

    if json {
        return print_json(&OverviewOutput {
            stats,
            daily_cost,
            temperature_pearson: correlation.pearson,
            heatmap: analytics::hourly_heatmap(readings),
        });
    }

    println!("Total consumption: {:.2} kWh", stats.total_kwh);
    println!(
        "Average per day:   {:.2} kWh over {} days",
        stats.avg_daily_kwh, stats.span_days
    );
    match stats.peak_hour {
        Some(hour) => println!("Peak hour:         {:02}:00", hour),
        None => println!("Peak hour:         n/a"),
    }
    println!("Records:           {}", stats.records);
    println!(
        "Total cost:        {:.2}",
        daily_cost.iter().map(|c| c.cost).sum::<f64>()
    );
    match correlation.pearson {
        Some(r) => println!("Temperature corr.: {:.3} ({} pairs)", r, correlation.pairs.len()),
        None => println!("Temperature corr.: n/a"),
    }
    Ok(())
}

fn run_appliances(readings: &[RawReading], trend: &[String], json: bool) -> Result<()> {
    let totals = analytics::appliance_totals(readings);
    let selected: Vec<&str> = trend.iter().map(String::as_str).collect();
    let daily = analytics::appliance_daily_trend(readings, &selected);

    if json {
        #[derive(Serialize)]
        struct Output {
            totals: Vec<analytics::CategoryTotal>,
            trend: Vec<analytics::ApplianceDaily>,
        }
        return print_json(&Output {
            totals,
            trend: daily,
        });
    }

    for total in totals {
        println!(
            "{:<20} {:>10.2} kWh {:>6.1}%",
            total.name, total.total_kwh, total.share_percent
        );
    }
    if !daily.is_empty() {
        println!();
        for point in daily {
            println!("{} {:<20} {:>8.2} kWh", point.date, point.appliance, point.total_kwh);
        }
    }
    Ok(())
}

fn run_forecast(readings: &[RawReading], forecaster: Forecaster, json: bool) -> Result<()> {
    let daily = aggregate(readings)?;
    let report = forecaster.run(&daily)?;

    if json {
        return print_json(&report);
    }

    println!(
        "Model: {} ({} samples), R² {:.3}, MAE {:.2} kWh",
        report.model.mode, report.metrics.samples, report.metrics.r_squared, report.metrics.mae
    );
    for row in &report.forecast {
        println!("{}  {:>8.2} kWh", row.date, row.predicted_kwh);
    }
    Ok(())
}
