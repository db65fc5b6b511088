pub mod reading;
pub mod sensor;

pub use reading::{GpsPoint, ReadingPoint, SensorSeries, SessionSummary};
pub use sensor::SensorKind;
