//! Pure parsing of the query parameters the Torque app appends to its
//! configured upload URL.

use std::collections::HashMap;
use tracing::warn;

use crate::domain::sensor::{keys, prefixes, SensorKind};

/// A classified live upload.
#[derive(Debug, Default, PartialEq)]
pub struct TorqueUpload {
    pub email: Option<String>,
    pub session: Option<String>,
    /// `(latitude, longitude)`; present only when both coordinates arrived.
    pub gps: Option<(f64, f64)>,
    pub readings: Vec<(SensorKind, f64)>,
}

/// Torque periodically uploads sensor names/units under `userFullName…` keys.
/// Those requests carry no readings and are ignored wholesale.
pub fn is_sensor_metadata(params: &HashMap<String, String>) -> bool {
    params.keys().any(|k| k.starts_with(prefixes::FULL_NAME))
}

pub fn parse_upload(params: &HashMap<String, String>) -> TorqueUpload {
    let email = params.get(keys::EMAIL).cloned().filter(|s| !s.is_empty());
    let session = params.get(keys::SESSION).cloned().filter(|s| !s.is_empty());

    let latitude = parse_value(params, keys::GPS_LATITUDE);
    let longitude = parse_value(params, keys::GPS_LONGITUDE);
    let gps = latitude.zip(longitude);

    let mut readings = Vec::new();
    for kind in SensorKind::ALL {
        if let Some(value) = parse_value(params, kind.torque_key()) {
            readings.push((kind, value));
        }
    }

    TorqueUpload {
        email,
        session,
        gps,
        readings,
    }
}

/// A malformed value drops that sensor, not the whole upload.
fn parse_value(params: &HashMap<String, String>, key: &str) -> Option<f64> {
    let raw = params.get(key)?;
    match raw.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "skipping unparseable sensor value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_metadata_upload_detected() {
        let p = params(&[
            ("eml", "driver@example.com"),
            ("userFullName04", "Engine Load"),
            ("userUnit04", "%"),
        ]);
        assert!(is_sensor_metadata(&p));
    }

    #[test]
    fn test_reading_upload_not_metadata() {
        let p = params(&[("eml", "driver@example.com"), ("k0c", "2450")]);
        assert!(!is_sensor_metadata(&p));
    }

    #[test]
    fn test_parse_full_upload() {
        let p = params(&[
            ("eml", "driver@example.com"),
            ("session", "146651809518"),
            ("kff1006", "51.5074"),
            ("kff1005", "-0.1278"),
            ("k04", "23.5"),
            ("k0c", "1850"),
            ("k0d", "54"),
            ("k2f", "78"),
        ]);
        let upload = parse_upload(&p);
        assert_eq!(upload.email.as_deref(), Some("driver@example.com"));
        assert_eq!(upload.session.as_deref(), Some("146651809518"));
        assert_eq!(upload.gps, Some((51.5074, -0.1278)));
        assert_eq!(
            upload.readings,
            vec![
                (SensorKind::EngineLoad, 23.5),
                (SensorKind::EngineRpm, 1850.0),
                (SensorKind::Speed, 54.0),
                (SensorKind::FuelLevel, 78.0),
            ]
        );
    }

    #[test]
    fn test_gps_requires_both_coordinates() {
        let p = params(&[("eml", "driver@example.com"), ("kff1006", "51.5074")]);
        assert_eq!(parse_upload(&p).gps, None);
    }

    #[test]
    fn test_unparseable_value_is_skipped() {
        let p = params(&[("k0c", "not-a-number"), ("k0d", "54")]);
        let upload = parse_upload(&p);
        assert_eq!(upload.readings, vec![(SensorKind::Speed, 54.0)]);
    }

    #[test]
    fn test_empty_email_treated_as_missing() {
        let p = params(&[("eml", ""), ("k0d", "54")]);
        assert_eq!(parse_upload(&p).email, None);
    }
}
