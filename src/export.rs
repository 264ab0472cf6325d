//! CSV export of raw, hourly, daily and forecast tables.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::aggregate::{DailySeries, hourly_totals};
use crate::error::Result;
use crate::ml::ForecastRow;
use crate::reading::RawReading;
use crate::traits::Clock;

/// Table kinds written by [`export_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Raw,
    Hourly,
    Daily,
    Forecast,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Raw => "raw",
            ExportKind::Hourly => "hourly",
            ExportKind::Daily => "daily",
            ExportKind::Forecast => "forecast",
        }
    }
}

fn write_records<W, T, I>(writer: W, records: I) -> Result<()>
where
    W: Write,
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Raw readings, one row per input record.
pub fn write_raw<W: Write>(writer: W, readings: &[RawReading]) -> Result<()> {
    write_records(writer, readings)
}

/// Hourly totals of the readings.
pub fn write_hourly<W: Write>(writer: W, readings: &[RawReading]) -> Result<()> {
    write_records(writer, hourly_totals(readings))
}

pub fn write_daily<W: Write>(writer: W, daily: &DailySeries) -> Result<()> {
    write_records(writer, daily.points())
}

pub fn write_forecast<W: Write>(writer: W, forecast: &[ForecastRow]) -> Result<()> {
    write_records(writer, forecast)
}

/// File name for an export of `kind` taken at the clock's current time.
pub fn export_filename<C: Clock>(kind: ExportKind, clock: &C) -> String {
    format!(
        "ecowatt_{}_{}.csv",
        kind.as_str(),
        clock.now_utc().format("%Y%m%d_%H%M%S")
    )
}

/// Write every table into `output_dir`, creating it if needed.
///
/// The forecast file is only written when `forecast` is given. Returns the
/// paths written, in raw, hourly, daily, forecast order.
pub fn export_all<C: Clock>(
    output_dir: &Path,
    clock: &C,
    readings: &[RawReading],
    daily: &DailySeries,
    forecast: Option<&[ForecastRow]>,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)?;

    let mut written = Vec::with_capacity(4);
    let mut create = |kind: ExportKind| -> Result<fs::File> {
        let path = output_dir.join(export_filename(kind, clock));
        let file = fs::File::create(&path)?;
        written.push(path);
        Ok(file)
    };

    write_raw(create(ExportKind::Raw)?, readings)?;
    write_hourly(create(ExportKind::Hourly)?, readings)?;
    write_daily(create(ExportKind::Daily)?, daily)?;
    if let Some(forecast) = forecast {
        write_forecast(create(ExportKind::Forecast)?, forecast)?;
    }

    tracing::info!(
        dir = %output_dir.display(),
        files = written.len(),
        "Exported CSV tables"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::aggregate::aggregate;
    use crate::traits::MockClock;

    fn readings() -> Vec<RawReading> {
        let day = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        vec![
            RawReading::new(day.and_hms_opt(9, 15, 0).unwrap(), 1.5)
                .with_appliance("Heater")
                .with_room("Bedroom")
                .with_temperature(18.5),
            RawReading::new(day.and_hms_opt(9, 45, 0).unwrap(), 0.5).with_cost(4.0),
            RawReading::new(day.and_hms_opt(11, 0, 0).unwrap(), 2.0),
        ]
    }

    fn to_string(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_write_raw_headers_and_blanks() {
        let mut buf = Vec::new();
        write_raw(&mut buf, &readings()).unwrap();

        let text = to_string(buf);
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "timestamp,usage_kwh,appliance,room,temperature_c,cost"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2024-02-10T09:15:00,1.5,Heater,Bedroom,18.5,"
        );
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn test_write_hourly_sums_within_hour() {
        let mut buf = Vec::new();
        write_hourly(&mut buf, &readings()).unwrap();

        let text = to_string(buf);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "hour,total_kwh");
        assert_eq!(lines[1], "2024-02-10T09:00:00,2.0");
        assert_eq!(lines[2], "2024-02-10T11:00:00,2.0");
    }

    #[test]
    fn test_write_daily() {
        let daily = aggregate(&readings()).unwrap();
        let mut buf = Vec::new();
        write_daily(&mut buf, &daily).unwrap();

        let text = to_string(buf);
        assert_eq!(text, "date,total_kwh,day_index\n2024-02-10,4.0,0\n");
    }

    #[test]
    fn test_write_forecast() {
        let forecast = vec![ForecastRow {
            date: NaiveDate::from_ymd_opt(2024, 2, 11).unwrap(),
            predicted_kwh: -0.25,
        }];
        let mut buf = Vec::new();
        write_forecast(&mut buf, &forecast).unwrap();

        assert_eq!(to_string(buf), "date,predicted_kwh\n2024-02-11,-0.25\n");
    }

    #[test]
    fn test_export_filename_uses_clock() {
        let clock = MockClock::new(Utc.with_ymd_and_hms(2024, 6, 15, 14, 30, 5).unwrap());

        assert_eq!(
            export_filename(ExportKind::Daily, &clock),
            "ecowatt_daily_20240615_143005.csv"
        );
    }

    #[test]
    fn test_export_all_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let clock = MockClock::new(Utc.with_ymd_and_hms(2024, 6, 15, 8, 0, 0).unwrap());
        let data = readings();
        let daily = aggregate(&data).unwrap();

        let paths = export_all(&out, &clock, &data, &daily, None).unwrap();

        assert_eq!(paths.len(), 3);
        assert!(paths.iter().all(|p| p.exists()));
        assert_eq!(
            paths[0].file_name().unwrap(),
            "ecowatt_raw_20240615_080000.csv"
        );

        let forecast = [ForecastRow {
            date: NaiveDate::from_ymd_opt(2024, 2, 11).unwrap(),
            predicted_kwh: 3.0,
        }];
        let paths = export_all(&out, &clock, &data, &daily, Some(&forecast)).unwrap();
        assert_eq!(paths.len(), 4);
        let written = fs::read_to_string(&paths[3]).unwrap();
        assert!(written.starts_with("date,predicted_kwh"));
    }
}
