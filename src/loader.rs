//! CSV loaders for the gym usage export and the hourly weather observations.
//!
//! Both loaders share one failure policy: problems are logged and returned
//! as a [`DataError`], never swallowed.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::StringRecord;

use crate::config::{ColumnsConfig, WeatherFieldsConfig};
use crate::error::DataError;
use crate::frame::{Column, Frame, parse_cell};

/// Naive layouts accepted for gym timestamps; these are read as UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Column layout of the weather CSV.
#[derive(Debug, Clone)]
pub struct WeatherSchema {
    pub fields: WeatherFieldsConfig,
    /// Numeric measurement columns to keep (temperature, precipitation, ...)
    pub measurements: Vec<String>,
    /// Name given to the composed timestamp column
    pub time_col: String,
}

impl WeatherSchema {
    pub fn from_config(columns: &ColumnsConfig, fields: &WeatherFieldsConfig) -> Self {
        Self {
            fields: fields.clone(),
            measurements: columns.weather_measurements(),
            time_col: columns.time_col.clone(),
        }
    }
}

/// Load the gym usage CSV.
///
/// `time_col` holds the timestamp; every other column is a device counter.
pub fn load_gym_data(path: &Path, time_col: &str) -> Result<Frame, DataError> {
    tracing::info!("Loading gym data from {}", path.display());

    let result = read_gym_csv(path, time_col);
    match &result {
        Ok(frame) => tracing::info!(
            "Gym data loaded: {} rows, {} device columns",
            frame.len(),
            frame.columns().len()
        ),
        Err(e) => tracing::error!("Failed to load gym data: {}", e),
    }
    result
}

fn read_gym_csv(path: &Path, time_col: &str) -> Result<Frame, DataError> {
    let mut reader = open_csv(path)?;
    let headers = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .clone();

    let time_idx = header_index(&headers, time_col)?;
    let device_idx: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != time_idx)
        .map(|(i, name)| (i, name.trim().to_string()))
        .collect();

    let mut times = Vec::new();
    let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); device_idx.len()];

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| csv_error(path, e))?;

        let raw_time = record.get(time_idx).unwrap_or_default();
        let time = parse_timestamp(raw_time).ok_or_else(|| DataError::InvalidTimestamp {
            row,
            value: raw_time.to_string(),
        })?;
        times.push(time);

        for (slot, (idx, name)) in device_idx.iter().enumerate() {
            let raw = record.get(*idx).unwrap_or_default();
            let cell = parse_cell(raw).map_err(|_| DataError::InvalidValue {
                row,
                column: name.clone(),
                value: raw.to_string(),
            })?;
            values[slot].push(cell);
        }
    }

    let columns = device_idx
        .into_iter()
        .zip(values)
        .map(|((_, name), values)| Column::new(name, values))
        .collect();

    Frame::from_parts(time_col, times, columns)
}

/// Load the weather CSV and compose one UTC timestamp per row.
pub fn load_weather_data(path: &Path, schema: &WeatherSchema) -> Result<Frame, DataError> {
    tracing::info!("Loading weather data from {}", path.display());

    let result = read_weather_csv(path, schema);
    match &result {
        Ok(frame) => tracing::info!("Weather data loaded and preprocessed: {} rows", frame.len()),
        Err(e) => tracing::error!("Error loading weather data: {}", e),
    }
    result
}

fn read_weather_csv(path: &Path, schema: &WeatherSchema) -> Result<Frame, DataError> {
    let mut reader = open_csv(path)?;
    let headers = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .clone();

    let year_idx = header_index(&headers, &schema.fields.year_col)?;
    let month_idx = header_index(&headers, &schema.fields.month_col)?;
    let day_idx = header_index(&headers, &schema.fields.day_col)?;
    let hour_idx = header_index(&headers, &schema.fields.hour_col)?;
    let measurement_idx = schema
        .measurements
        .iter()
        .map(|name| header_index(&headers, name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut times = Vec::new();
    let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); measurement_idx.len()];

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| csv_error(path, e))?;

        let field = |idx: usize| record.get(idx).unwrap_or_default().trim();
        let time = weather_timestamp(field(year_idx), field(month_idx), field(day_idx), field(hour_idx))
            .ok_or_else(|| DataError::InvalidTimestamp {
                row,
                value: format!(
                    "{}-{}-{} {}",
                    field(year_idx),
                    field(month_idx),
                    field(day_idx),
                    field(hour_idx)
                ),
            })?;
        times.push(time);

        for (slot, idx) in measurement_idx.iter().enumerate() {
            let raw = field(*idx);
            let cell = parse_cell(raw).map_err(|_| DataError::InvalidValue {
                row,
                column: schema.measurements[slot].clone(),
                value: raw.to_string(),
            })?;
            values[slot].push(cell);
        }
    }

    let columns = schema
        .measurements
        .iter()
        .zip(values)
        .map(|(name, values)| Column::new(name.clone(), values))
        .collect();

    Frame::from_parts(schema.time_col.clone(), times, columns)
}

/// Compose `UTC(year, month, day, hour:00:00)` from the raw weather fields.
///
/// The hour field is either a bare hour (`"7"`, `"13"`) or clock text on the
/// hour (`"13:00"`, `"13:00:00"`). Clock text past the hour is rejected.
pub fn weather_timestamp(year: &str, month: &str, day: &str, hour: &str) -> Option<DateTime<Utc>> {
    let year: i32 = year.trim().parse().ok()?;
    let month: u32 = month.trim().parse().ok()?;
    let day: u32 = day.trim().parse().ok()?;

    let mut clock = hour.trim().split(':');
    let hour_part = clock.next()?;
    let rest: Vec<&str> = clock.collect();
    if rest.len() > 2 || rest.iter().any(|part| part.trim().parse::<u32>().ok() != Some(0)) {
        return None;
    }

    let text = format!("{:04}-{:02}-{:02} {}:00:00", year, month, day, hour_part.trim());
    let naive = NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S").ok()?;
    Some(naive.and_utc())
}

/// Parse a gym timestamp, reading offset-less values as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%#z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn open_csv(path: &Path) -> Result<csv::Reader<File>, DataError> {
    let file = File::open(path).map_err(|source| DataError::Unavailable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::ReaderBuilder::new().flexible(false).from_reader(file))
}

fn header_index(headers: &StringRecord, name: &str) -> Result<usize, DataError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| DataError::MissingColumn(name.to_string()))
}

fn csv_error(path: &Path, source: csv::Error) -> DataError {
    DataError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::{Datelike, TimeZone, Timelike};
    use tempfile::NamedTempFile;

    use super::*;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn weather_schema() -> WeatherSchema {
        WeatherSchema {
            fields: WeatherFieldsConfig::default(),
            measurements: vec!["Temperature".to_string(), "Precipitation".to_string()],
            time_col: "time".to_string(),
        }
    }

    // ==================== parse_timestamp Tests ====================

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2020, 4, 24, 6, 0, 0).unwrap();

        assert_eq!(parse_timestamp("2020-04-24T06:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2020-04-24 06:00:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2020-04-24 09:00:00+03:00"), Some(expected));
        assert_eq!(parse_timestamp("2020-04-24 06:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2020-04-24T06:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2020-04-24 06:00"), Some(expected));
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    // ==================== weather_timestamp Tests ====================

    #[test]
    fn test_weather_timestamp_bare_hour() {
        let ts = weather_timestamp("2020", "1", "5", "7").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2020, 1, 5, 7, 0, 0).unwrap());
    }

    #[test]
    fn test_weather_timestamp_clock_text() {
        let ts = weather_timestamp("2021", "12", "31", "23:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2021, 12, 31, 23, 0, 0).unwrap());
    }

    #[test]
    fn test_weather_timestamp_rejects_minutes_past_the_hour() {
        assert!(weather_timestamp("2020", "1", "5", "7:30").is_none());
        assert!(weather_timestamp("2020", "1", "5", "07:00:15").is_none());
        assert!(weather_timestamp("2020", "1", "5", "07:").is_none());
        assert_eq!(
            weather_timestamp("2020", "1", "5", "07:00:00"),
            weather_timestamp("2020", "1", "5", "7")
        );
    }

    #[test]
    fn test_weather_timestamp_invalid_parts() {
        assert!(weather_timestamp("2020", "13", "1", "0").is_none());
        assert!(weather_timestamp("2020", "2", "30", "0").is_none());
        assert!(weather_timestamp("2020", "1", "1", "24").is_none());
        assert!(weather_timestamp("", "1", "1", "0").is_none());
    }

    // ==================== load_gym_data Tests ====================

    #[test]
    fn test_load_gym_data() {
        let file = write_csv(
            "time,19,20\n\
             2020-01-01 00:00:00+00:00,5,10\n\
             2020-01-01 00:10:00+00:00,,3\n",
        );

        let frame = load_gym_data(file.path(), "time").unwrap();

        assert_eq!(frame.len(), 2);
        assert_eq!(frame.column_names().collect::<Vec<_>>(), vec!["19", "20"]);
        assert_eq!(frame.values("19").unwrap(), &[Some(5.0), None]);
        assert_eq!(frame.times()[1].minute(), 10);
    }

    #[test]
    fn test_load_gym_data_reads_missing_spellings() {
        let file = write_csv(
            "time,19,20\n\
             2020-01-01 00:00:00,NAN,None\n\
             2020-01-01 01:00:00,-nan,n/a\n\
             2020-01-01 02:00:00,#N/A,<NA>\n\
             2020-01-01 03:00:00,4,5\n",
        );

        let frame = load_gym_data(file.path(), "time").unwrap();

        assert_eq!(frame.values("19").unwrap(), &[None, None, None, Some(4.0)]);
        assert_eq!(frame.values("20").unwrap(), &[None, None, None, Some(5.0)]);
    }

    #[test]
    fn test_load_gym_data_missing_file() {
        let result = load_gym_data(Path::new("/nonexistent/gym.csv"), "time");
        assert!(matches!(result, Err(DataError::Unavailable { .. })));
    }

    #[test]
    fn test_load_gym_data_missing_time_column() {
        let file = write_csv("timestamp,19\n2020-01-01 00:00:00,1\n");
        let result = load_gym_data(file.path(), "time");
        assert!(matches!(result, Err(DataError::MissingColumn(name)) if name == "time"));
    }

    #[test]
    fn test_load_gym_data_rejects_text_values() {
        let file = write_csv("time,19\n2020-01-01 00:00:00,busy\n");
        let result = load_gym_data(file.path(), "time");
        assert!(matches!(result, Err(DataError::InvalidValue { row: 0, .. })));
    }

    #[test]
    fn test_load_gym_data_rejects_bad_timestamp() {
        let file = write_csv("time,19\nnot-a-date,1\n");
        let result = load_gym_data(file.path(), "time");
        assert!(matches!(result, Err(DataError::InvalidTimestamp { row: 0, .. })));
    }

    // ==================== load_weather_data Tests ====================

    #[test]
    fn test_load_weather_data_composes_timestamp() {
        let file = write_csv(
            "Year,Month,Day,Hour,Time zone,Temperature,Precipitation\n\
             2020,1,1,0,UTC,-1.5,0.0\n\
             2020,1,1,13,UTC,2.0,\n",
        );

        let frame = load_weather_data(file.path(), &weather_schema()).unwrap();

        assert_eq!(frame.len(), 2);
        assert_eq!(frame.time_col(), "time");
        assert_eq!(frame.times()[1].hour(), 13);
        assert_eq!(frame.times()[1].day(), 1);
        assert_eq!(frame.values("Temperature").unwrap(), &[Some(-1.5), Some(2.0)]);
        assert_eq!(frame.values("Precipitation").unwrap(), &[Some(0.0), None]);
        // Columns outside the schema are not loaded
        assert!(!frame.has_column("Time zone"));
    }

    #[test]
    fn test_load_weather_data_fails_on_bad_hour() {
        let file = write_csv(
            "Year,Month,Day,Hour,Temperature,Precipitation\n\
             2020,1,1,noon,1.0,0.0\n",
        );

        let result = load_weather_data(file.path(), &weather_schema());
        assert!(matches!(result, Err(DataError::InvalidTimestamp { row: 0, .. })));
    }

    #[test]
    fn test_load_weather_data_missing_measurement_column() {
        let file = write_csv("Year,Month,Day,Hour,Temperature\n2020,1,1,0,1.0\n");
        let result = load_weather_data(file.path(), &weather_schema());
        assert!(matches!(result, Err(DataError::MissingColumn(name)) if name == "Precipitation"));
    }

    // ==================== Property-Based Tests ====================

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn weather_timestamp_matches_components(
                year in 1990i32..2100,
                month in 1u32..=12,
                day in 1u32..=28,
                hour in 0u32..24
            ) {
                let ts = weather_timestamp(
                    &year.to_string(),
                    &month.to_string(),
                    &day.to_string(),
                    &hour.to_string(),
                ).unwrap();
                let expected = Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap();
                prop_assert_eq!(ts, expected);
            }
        }
    }
}
