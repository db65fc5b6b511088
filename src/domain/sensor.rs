//! Sensor vocabulary shared by the Torque wire protocol, the CSV importer and
//! the dashboard API.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Query keys used by the Torque upload protocol. Scalar sensor keys are the
/// OBD PID codes Torque sends; `kff*` codes are Torque's extended PIDs.
pub mod keys {
    pub const EMAIL: &str = "eml";
    pub const SESSION: &str = "session";
    pub const GPS_LONGITUDE: &str = "kff1005";
    pub const GPS_LATITUDE: &str = "kff1006";
    pub const ENGINE_LOAD: &str = "k04";
    pub const ENGINE_RPM: &str = "k0c";
    pub const SPEED: &str = "k0d";
    pub const FUEL_LEVEL: &str = "k2f";
}

/// Key prefixes marking an upload that describes sensor metadata (names,
/// units) rather than readings. Such uploads are acknowledged and ignored.
pub mod prefixes {
    pub const FULL_NAME: &str = "userFullName";
    pub const SHORT_NAME: &str = "userShortName";
    pub const UNIT: &str = "userUnit";
    pub const DEFAULT_UNIT: &str = "defaultUnit";
}

/// Scalar sensor kind enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    EngineLoad,
    EngineRpm,
    Speed,
    FuelLevel,
}

impl SensorKind {
    /// Canonical ordering used when returning grouped series.
    pub const ALL: [SensorKind; 4] = [
        SensorKind::EngineLoad,
        SensorKind::EngineRpm,
        SensorKind::Speed,
        SensorKind::FuelLevel,
    ];

    /// The Torque query key carrying this sensor on live uploads.
    pub fn torque_key(&self) -> &'static str {
        match self {
            Self::EngineLoad => keys::ENGINE_LOAD,
            Self::EngineRpm => keys::ENGINE_RPM,
            Self::Speed => keys::SPEED,
            Self::FuelLevel => keys::FUEL_LEVEL,
        }
    }

    /// The column header Torque writes for this sensor in exported trip logs.
    pub fn csv_column(&self) -> &'static str {
        match self {
            Self::EngineLoad => "Engine Load(%)",
            Self::EngineRpm => "Engine RPM(rpm)",
            Self::Speed => "Speed (OBD)(km/h)",
            Self::FuelLevel => "Fuel Level (From Engine ECU)(%)",
        }
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::EngineLoad => "engine_load",
            Self::EngineRpm => "engine_rpm",
            Self::Speed => "speed",
            Self::FuelLevel => "fuel_level",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for SensorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "engine_load" => Ok(Self::EngineLoad),
            "engine_rpm" => Ok(Self::EngineRpm),
            "speed" => Ok(Self::Speed),
            "fuel_level" => Ok(Self::FuelLevel),
            _ => Err(format!("Invalid sensor kind: {}", s)),
        }
    }
}

/// Lookup from a trimmed CSV header to the sensor it carries.
pub static CSV_COLUMN_SENSOR_MAP: Lazy<HashMap<&'static str, SensorKind>> = Lazy::new(|| {
    SensorKind::ALL
        .iter()
        .map(|kind| (kind.csv_column(), *kind))
        .collect()
});

/// Non-sensor CSV columns the importer needs.
pub mod csv_columns {
    pub const DEVICE_TIME: &str = "Device Time";
    pub const LATITUDE: &str = "Latitude";
    pub const LONGITUDE: &str = "Longitude";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_kind_display() {
        assert_eq!(SensorKind::EngineLoad.to_string(), "engine_load");
        assert_eq!(SensorKind::FuelLevel.to_string(), "fuel_level");
    }

    #[test]
    fn test_sensor_kind_from_str() {
        assert_eq!("engine_rpm".parse::<SensorKind>().unwrap(), SensorKind::EngineRpm);
        assert_eq!("SPEED".parse::<SensorKind>().unwrap(), SensorKind::Speed);
        assert!("coolant_temp".parse::<SensorKind>().is_err());
    }

    #[test]
    fn test_display_from_str_roundtrip() {
        for kind in SensorKind::ALL {
            assert_eq!(kind.to_string().parse::<SensorKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_csv_column_map_covers_all_kinds() {
        assert_eq!(CSV_COLUMN_SENSOR_MAP.len(), SensorKind::ALL.len());
        for kind in SensorKind::ALL {
            assert_eq!(CSV_COLUMN_SENSOR_MAP.get(kind.csv_column()), Some(&kind));
        }
    }

    #[test]
    fn test_torque_keys_are_distinct() {
        let mut keys: Vec<_> = SensorKind::ALL.iter().map(|k| k.torque_key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), SensorKind::ALL.len());
    }
}
