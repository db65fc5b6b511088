//! Parsing of Torque-exported trip logs.
//!
//! The exporter writes one row per sample with a `Device Time` column and a
//! vehicle-dependent set of sensor columns. Only the columns the dashboard
//! charts are read; everything else is passed over.

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;
use tracing::warn;

use crate::domain::sensor::{csv_columns, SensorKind, CSV_COLUMN_SENSOR_MAP};

#[derive(Debug, Error)]
pub enum CsvParseError {
    #[error("trip log contains no data rows")]
    Empty,
    #[error("missing required column {0:?}")]
    MissingColumn(&'static str),
    #[error("unreadable device time in first row: {0:?}")]
    BadStartTime(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// One trip-log row reduced to the fields the dashboard stores.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRecord {
    pub recorded_at: DateTime<Utc>,
    /// `(latitude, longitude)` when both fields parse.
    pub gps: Option<(f64, f64)>,
    pub values: Vec<(SensorKind, f64)>,
}

pub fn parse_torque_csv(bytes: &[u8]) -> Result<Vec<CsvRecord>, CsvParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let position = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(CsvParseError::MissingColumn(name))
    };
    let time_idx = position(csv_columns::DEVICE_TIME)?;
    let lat_idx = position(csv_columns::LATITUDE)?;
    let lng_idx = position(csv_columns::LONGITUDE)?;

    // Sensor columns are optional; a vehicle that reports no fuel level just
    // produces no fuel series.
    let sensor_idxs: Vec<(SensorKind, usize)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, header)| CSV_COLUMN_SENSOR_MAP.get(header).map(|kind| (*kind, idx)))
        .collect();

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let raw_time = record.get(time_idx).unwrap_or("");
        let Some(recorded_at) = parse_device_time(raw_time) else {
            if row_no == 0 {
                // The first row anchors the session id; without it the whole
                // import is meaningless.
                return Err(CsvParseError::BadStartTime(raw_time.to_string()));
            }
            warn!(row = row_no + 1, "skipping trip log row with unreadable device time");
            continue;
        };

        let latitude = field_f64(&record, lat_idx);
        let longitude = field_f64(&record, lng_idx);

        records.push(CsvRecord {
            recorded_at,
            gps: latitude.zip(longitude),
            values: sensor_idxs
                .iter()
                .filter_map(|(kind, idx)| field_f64(&record, *idx).map(|v| (*kind, v)))
                .collect(),
        });
    }

    if records.is_empty() {
        return Err(CsvParseError::Empty);
    }
    Ok(records)
}

fn field_f64(record: &csv::StringRecord, idx: usize) -> Option<f64> {
    record.get(idx).and_then(|s| s.trim().parse::<f64>().ok())
}

/// Torque's `Device Time` format, with and without the millisecond fraction.
pub(crate) fn parse_device_time(raw: &str) -> Option<DateTime<Utc>> {
    const FORMATS: [&str; 2] = ["%d-%b-%Y %H:%M:%S%.3f", "%d-%b-%Y %H:%M:%S"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Session id for an imported log: the decimal epoch-millisecond string of
/// the first sample, truncated to 12 characters. Re-importing the same log
/// therefore lands on the same id.
pub fn derive_session_id(started_at: DateTime<Utc>) -> String {
    let mut id = started_at.timestamp_millis().to_string();
    id.truncate(12);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SAMPLE: &str = "\
GPS Time,Device Time,Longitude,Latitude,GPS Speed (Meters/second),Engine Load(%),Engine RPM(rpm),Speed (OBD)(km/h),Fuel Level (From Engine ECU)(%)
Tue Jun 21 14:08:15 GMT 2016,21-Jun-2016 14:08:15.180,-0.1278,51.5074,12.0,23.5,1850.0,54.0,78.0
Tue Jun 21 14:08:16 GMT 2016,21-Jun-2016 14:08:16.201,-0.1279,51.5075,12.4,24.1,1900.0,55.0,78.0
";

    #[test]
    fn test_parse_sample_log() {
        let records = parse_torque_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.gps, Some((51.5074, -0.1278)));
        assert_eq!(
            first.values,
            vec![
                (SensorKind::EngineLoad, 23.5),
                (SensorKind::EngineRpm, 1850.0),
                (SensorKind::Speed, 54.0),
                (SensorKind::FuelLevel, 78.0),
            ]
        );
    }

    #[test]
    fn test_sensor_columns_are_optional() {
        let log = "\
Device Time,Longitude,Latitude,Engine RPM(rpm)
21-Jun-2016 14:08:15.180,-0.1278,51.5074,1850.0
";
        let records = parse_torque_csv(log.as_bytes()).unwrap();
        assert_eq!(records[0].values, vec![(SensorKind::EngineRpm, 1850.0)]);
    }

    #[test]
    fn test_missing_device_time_column() {
        let log = "Longitude,Latitude\n-0.1278,51.5074\n";
        assert!(matches!(
            parse_torque_csv(log.as_bytes()),
            Err(CsvParseError::MissingColumn("Device Time"))
        ));
    }

    #[test]
    fn test_unreadable_first_row_time() {
        let log = "\
Device Time,Longitude,Latitude
garbage,-0.1278,51.5074
";
        assert!(matches!(
            parse_torque_csv(log.as_bytes()),
            Err(CsvParseError::BadStartTime(_))
        ));
    }

    #[test]
    fn test_headers_only_is_empty() {
        let log = "Device Time,Longitude,Latitude\n";
        assert!(matches!(
            parse_torque_csv(log.as_bytes()),
            Err(CsvParseError::Empty)
        ));
    }

    #[test]
    fn test_blank_gps_fields_yield_no_fix() {
        let log = "\
Device Time,Longitude,Latitude,Engine RPM(rpm)
21-Jun-2016 14:08:15.180,,,1850.0
";
        let records = parse_torque_csv(log.as_bytes()).unwrap();
        assert_eq!(records[0].gps, None);
    }

    #[rstest]
    #[case("21-Jun-2016 14:08:15.180")]
    #[case("21-Jun-2016 14:08:15")]
    fn test_device_time_formats(#[case] raw: &str) {
        assert!(parse_device_time(raw).is_some());
    }

    #[test]
    fn test_device_time_rejects_iso() {
        assert!(parse_device_time("2016-06-21T14:08:15Z").is_none());
    }

    #[test]
    fn test_derive_session_id_known_value() {
        // 2016-06-21 14:08:15.180 UTC -> 1466518095180 ms -> first 12 digits.
        let started_at = parse_device_time("21-Jun-2016 14:08:15.180").unwrap();
        assert_eq!(derive_session_id(started_at), "146651809518");
    }

    #[test]
    fn test_derive_session_id_truncates_13_digit_millis() {
        let started_at = parse_device_time("21-Jun-2016 14:08:15").unwrap();
        assert_eq!(derive_session_id(started_at), "146651809500");
    }
}
