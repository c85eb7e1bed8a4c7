use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SurveyError;

/// Stations reserved per transect: transect `t` owns numbers `t*100+1 ..= t*100+99`.
pub const STATIONS_PER_TRANSECT: u32 = 100;

/// Highest transect number whose stations cannot collide with another transect.
pub const MAX_TRANSECT: u32 = 99;

/// Survey frequencies of the EM instrument.
///
/// Declaration order is the acquisition order (high to low), so `Ord` sorts
/// frequencies the way they are traversed in the field.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, uniffi::Enum,
)]
#[serde(try_from = "u32", into = "u32")]
pub enum Frequency {
    F813,
    F559,
    F407,
    F254,
    F203,
    F153,
    F102,
}

impl Frequency {
    pub const COUNT: usize = 7;

    pub const ALL: [Frequency; Frequency::COUNT] = [
        Frequency::F813,
        Frequency::F559,
        Frequency::F407,
        Frequency::F254,
        Frequency::F203,
        Frequency::F153,
        Frequency::F102,
    ];

    pub fn hz(self) -> u32 {
        match self {
            Frequency::F813 => 813,
            Frequency::F559 => 559,
            Frequency::F407 => 407,
            Frequency::F254 => 254,
            Frequency::F203 => 203,
            Frequency::F153 => 153,
            Frequency::F102 => 102,
        }
    }

    /// Position in the acquisition sequence.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_hz(hz: u32) -> Option<Self> {
        Frequency::ALL.into_iter().find(|f| f.hz() == hz)
    }
}

impl TryFrom<u32> for Frequency {
    type Error = SurveyError;

    fn try_from(hz: u32) -> Result<Self, Self::Error> {
        Frequency::from_hz(hz).ok_or_else(|| {
            SurveyError::validation("frequency", format!("{hz} Hz is not a survey frequency"))
        })
    }
}

impl From<Frequency> for u32 {
    fn from(frequency: Frequency) -> Self {
        frequency.hz()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.hz())
    }
}

/// First station number of a transect, saturating at `u32::MAX`.
#[uniffi::export]
pub fn starting_station(transcat: u32) -> u32 {
    transcat
        .saturating_mul(STATIONS_PER_TRANSECT)
        .saturating_add(1)
}

/// Transect encoded in the hundreds of a station number.
pub fn transect_of(station: u32) -> u32 {
    station.saturating_sub(1) / STATIONS_PER_TRANSECT
}

/// Round to the 6 decimals used for coordinates.
pub fn round_coordinate(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

/// Project-wide parameters fixed at setup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct CommonParams {
    #[serde(deserialize_with = "lenient::integer")]
    pub transcat: u32,
    /// Meters between consecutive stations.
    #[serde(deserialize_with = "lenient::decimal")]
    pub interstation: f64,
    /// Background resistivity (Ω·m) used for the exploration depth.
    #[serde(deserialize_with = "lenient::decimal")]
    pub average_resistivity: f64,
    /// Transmitter to receiver coil separation (m).
    #[serde(deserialize_with = "lenient::decimal")]
    pub intercoil: f64,
}

impl CommonParams {
    pub fn starting_station(&self) -> u32 {
        starting_station(self.transcat)
    }

    /// Last station number available to the current transect.
    pub fn last_station(&self) -> u32 {
        self.starting_station()
            .saturating_add(STATIONS_PER_TRANSECT - 2)
    }

    pub fn validate(&self) -> Result<(), SurveyError> {
        if self.transcat > MAX_TRANSECT {
            return Err(SurveyError::validation(
                "transcat",
                format!("must be below {}", MAX_TRANSECT + 1),
            ));
        }
        if !self.interstation.is_finite() || self.interstation < 0.0 {
            return Err(SurveyError::validation(
                "interstation",
                "must be a non-negative distance",
            ));
        }
        if !self.average_resistivity.is_finite() || self.average_resistivity <= 0.0 {
            return Err(SurveyError::validation(
                "averageResistivity",
                "must be greater than zero",
            ));
        }
        if !self.intercoil.is_finite() || self.intercoil <= 0.0 {
            return Err(SurveyError::validation(
                "intercoil",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct GpsFix {
    #[serde(deserialize_with = "lenient::decimal")]
    pub latitude: f64,
    #[serde(deserialize_with = "lenient::decimal")]
    pub longitude: f64,
}

impl GpsFix {
    pub fn rounded(&self) -> GpsFix {
        GpsFix {
            latitude: round_coordinate(self.latitude),
            longitude: round_coordinate(self.longitude),
        }
    }
}

/// One frequency of one committed station.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, uniffi::Record)]
#[serde(rename_all = "camelCase")]
pub struct StationMeasurement {
    pub frequency: Frequency,
    /// Transmitter current (A).
    #[serde(deserialize_with = "lenient::decimal")]
    pub tx_current: f64,
    /// Receiver voltage (mV).
    #[serde(deserialize_with = "lenient::decimal")]
    pub rx_voltage: f64,
    #[serde(deserialize_with = "lenient::decimal")]
    pub latitude: f64,
    #[serde(deserialize_with = "lenient::decimal")]
    pub longitude: f64,
    /// Offset along the transect (m).
    pub distance: f64,
    pub calculated_depth: f64,
    pub calculated_conductivity: f64,
    pub calculated_resistivity: f64,
    pub date: String,
    pub time: String,
}

/// Measurements of one station, in acquisition order.
pub type Station = Vec<StationMeasurement>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub common: CommonParams,
    #[serde(default)]
    pub stations: BTreeMap<u32, Station>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps: Option<GpsFix>,
}

/// Deserializers accepting either a JSON number or a numeric string.
///
/// Collections written by the field app before numbers were stored natively
/// carry setup parameters, raw readings and coordinates as decimal strings.
pub(crate) mod lenient {
    use serde::de::{Deserializer, Error};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Decimal {
        Number(f64),
        Text(String),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Integer {
        Number(u32),
        Text(String),
    }

    pub fn decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Decimal::deserialize(deserializer)? {
            Decimal::Number(value) => Ok(value),
            Decimal::Text(text) => {
                log::debug!("coercing legacy string value '{text}'");
                text.trim()
                    .parse()
                    .map_err(|_| D::Error::custom(format!("'{text}' is not a number")))
            }
        }
    }

    pub fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        match Integer::deserialize(deserializer)? {
            Integer::Number(value) => Ok(value),
            Integer::Text(text) => {
                log::debug!("coercing legacy string value '{text}'");
                text.trim()
                    .parse()
                    .map_err(|_| D::Error::custom(format!("'{text}' is not an integer")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_order_and_lookup() {
        let hz: Vec<u32> = Frequency::ALL.iter().map(|f| f.hz()).collect();
        assert_eq!(hz, vec![813, 559, 407, 254, 203, 153, 102]);
        assert_eq!(Frequency::from_hz(254), Some(Frequency::F254));
        assert_eq!(Frequency::from_hz(250), None);
        assert!(Frequency::try_from(1000).is_err());
        for (i, f) in Frequency::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
        }
        assert!(Frequency::F813 < Frequency::F102);
    }

    #[test]
    fn test_station_numbering() {
        assert_eq!(starting_station(0), 1);
        assert_eq!(starting_station(3), 301);
        assert_eq!(transect_of(301), 3);
        assert_eq!(transect_of(399), 3);
        assert_eq!(transect_of(400), 3);
        assert_eq!(transect_of(401), 4);

        assert_eq!(starting_station(MAX_TRANSECT), 9901);
        assert_eq!(starting_station(42_949_673), u32::MAX);
        assert_eq!(starting_station(u32::MAX), u32::MAX);
    }

    #[test]
    fn test_common_params_validation() {
        let mut common = CommonParams {
            transcat: 3,
            interstation: 10.0,
            average_resistivity: 100.0,
            intercoil: 10.0,
        };
        assert!(common.validate().is_ok());
        assert_eq!(common.last_station(), 399);

        common.interstation = 0.0;
        assert!(common.validate().is_ok());

        common.transcat = 100;
        assert!(common.validate().is_err());
        common.transcat = 3;

        common.intercoil = 0.0;
        assert!(matches!(
            common.validate(),
            Err(SurveyError::Validation { ref field, .. }) if field == "intercoil"
        ));
        common.intercoil = 10.0;

        common.average_resistivity = -1.0;
        assert!(common.validate().is_err());
        common.average_resistivity = f64::NAN;
        assert!(common.validate().is_err());
    }

    #[test]
    fn test_frequency_serializes_as_hz() {
        assert_eq!(serde_json::to_string(&Frequency::F407).unwrap(), "407");
        let f: Frequency = serde_json::from_str("153").unwrap();
        assert_eq!(f, Frequency::F153);
        assert!(serde_json::from_str::<Frequency>("150").is_err());
    }

    #[test]
    fn test_legacy_string_fields() {
        let json = r#"{
            "name": "Legacy",
            "common": {"transcat": "2", "interstation": "5", "averageResistivity": "100", "intercoil": "10"},
            "stations": {
                "201": [{
                    "frequency": 813, "txCurrent": "1.00", "rxVoltage": "50.00",
                    "latitude": "0.000000", "longitude": "0.000000", "distance": 0,
                    "calculatedDepth": -35.28, "calculatedConductivity": 51.48,
                    "calculatedResistivity": 194.23, "date": "1/2/2025", "time": "9:00:00 AM"
                }]
            }
        }"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.common.transcat, 2);
        assert_eq!(project.common.intercoil, 10.0);
        let m = &project.stations[&201][0];
        assert_eq!(m.tx_current, 1.0);
        assert_eq!(m.rx_voltage, 50.0);
        assert!(project.gps.is_none());

        let bad = json.replace("\"2\"", "\"two\"");
        assert!(serde_json::from_str::<Project>(&bad).is_err());
    }

    #[test]
    fn test_project_field_names() {
        let project = Project {
            name: "Line A".to_string(),
            common: CommonParams {
                transcat: 1,
                interstation: 10.0,
                average_resistivity: 100.0,
                intercoil: 10.0,
            },
            stations: BTreeMap::new(),
            gps: Some(GpsFix {
                latitude: -1.5,
                longitude: 36.25,
            }),
        };
        let value = serde_json::to_value(&project).unwrap();
        assert_eq!(value["common"]["transcat"], 1);
        assert_eq!(value["common"]["averageResistivity"], 100.0);
        assert_eq!(value["gps"]["longitude"], 36.25);
        assert!(value["stations"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_project_round_trip_with_gps_and_stations() {
        use crate::accumulator::{CaptureStamp, Reading, StationAccumulator};

        let gps = GpsFix {
            latitude: -1.292123,
            longitude: 36.821988,
        };
        let mut project = Project {
            name: "Rift margin".to_string(),
            common: CommonParams {
                transcat: 4,
                interstation: 12.5,
                average_resistivity: 87.3,
                intercoil: 7.5,
            },
            stations: BTreeMap::new(),
            gps: Some(gps.clone()),
        };
        let stamp = CaptureStamp {
            date: "10/19/2026".to_string(),
            time: "3:07:45 PM".to_string(),
        };
        for (n, station) in [401, 402, 405].into_iter().enumerate() {
            let mut acc = StationAccumulator::new();
            for (i, f) in Frequency::ALL.into_iter().enumerate() {
                acc.record(
                    f,
                    Reading {
                        tx_current: 1.03,
                        rx_voltage_mv: 12.37 + 0.11 * (n * 7 + i) as f64,
                    },
                );
            }
            let measurements = acc
                .finalize(station, &project.common, Some(&gps), &stamp)
                .unwrap();
            project.stations.insert(station, measurements);
        }

        let json = serde_json::to_string(&project).unwrap();
        let reloaded: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, project);
        assert_eq!(reloaded.gps, Some(gps));
        let before = &project.stations[&405][3];
        let after = &reloaded.stations[&405][3];
        assert_eq!(
            after.calculated_conductivity.to_bits(),
            before.calculated_conductivity.to_bits()
        );
        assert_eq!(after.distance, 50.0);
    }
}
