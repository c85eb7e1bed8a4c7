//! Readings of the station currently being surveyed.
//!
//! A station is complete once every survey frequency holds a reading; only
//! then can it be finalized into measurement records.

use log::debug;

use crate::error::SurveyError;
use crate::formula::{self, FormulaInput};
use crate::models::{round_coordinate, CommonParams, Frequency, GpsFix, StationMeasurement};

/// Raw pair recorded for one frequency.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    /// Transmitter current (A).
    pub tx_current: f64,
    /// Receiver voltage (mV).
    pub rx_voltage_mv: f64,
}

/// Date and time strings stamped on every measurement of a committed station.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureStamp {
    pub date: String,
    pub time: String,
}

#[derive(Clone, Debug, Default)]
pub struct StationAccumulator {
    readings: [Option<Reading>; Frequency::COUNT],
}

impl StationAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the reading for `frequency`, replacing any earlier one.
    pub fn record(&mut self, frequency: Frequency, reading: Reading) {
        debug!(
            "recorded {frequency}: tx={} A rx={} mV",
            reading.tx_current, reading.rx_voltage_mv
        );
        self.readings[frequency.index()] = Some(reading);
    }

    /// Like [`record`](Self::record) for a frequency given in Hz.
    pub fn record_hz(
        &mut self,
        hz: u32,
        tx_current: f64,
        rx_voltage_mv: f64,
    ) -> Result<(), SurveyError> {
        let frequency = Frequency::try_from(hz)?;
        self.record(
            frequency,
            Reading {
                tx_current,
                rx_voltage_mv,
            },
        );
        Ok(())
    }

    pub fn reading(&self, frequency: Frequency) -> Option<Reading> {
        self.readings[frequency.index()]
    }

    pub fn is_complete(&self) -> bool {
        self.readings.iter().all(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        self.readings.iter().all(Option::is_none)
    }

    pub fn recorded_count(&self) -> usize {
        self.readings.iter().filter(|r| r.is_some()).count()
    }

    /// Frequencies still lacking a reading, in acquisition order.
    pub fn missing(&self) -> Vec<Frequency> {
        Frequency::ALL
            .into_iter()
            .filter(|f| self.readings[f.index()].is_none())
            .collect()
    }

    /// First frequency without a reading.
    pub fn next_missing(&self) -> Option<Frequency> {
        Frequency::ALL
            .into_iter()
            .find(|f| self.readings[f.index()].is_none())
    }

    pub fn clear(&mut self) {
        self.readings = Default::default();
    }

    /// Build the measurement records for `station` without clearing the readings.
    pub fn measurements(
        &self,
        station: u32,
        common: &CommonParams,
        gps: Option<&GpsFix>,
        stamp: &CaptureStamp,
    ) -> Result<Vec<StationMeasurement>, SurveyError> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(SurveyError::IncompleteStation { station, missing });
        }

        let offset = i64::from(station) - i64::from(common.starting_station());
        let distance = offset as f64 * common.interstation;
        let (latitude, longitude) = gps
            .map(|fix| (round_coordinate(fix.latitude), round_coordinate(fix.longitude)))
            .unwrap_or((0.0, 0.0));

        let mut measurements = Vec::with_capacity(Frequency::COUNT);
        for (frequency, reading) in Frequency::ALL.into_iter().zip(self.readings.iter()) {
            let Some(reading) = reading else {
                return Err(SurveyError::IncompleteStation {
                    station,
                    missing: vec![frequency],
                });
            };
            let calc = formula::evaluate(&FormulaInput {
                frequency,
                tx_current: reading.tx_current,
                rx_voltage_mv: reading.rx_voltage_mv,
                intercoil: common.intercoil,
                average_resistivity: common.average_resistivity,
            })?;
            measurements.push(StationMeasurement {
                frequency,
                tx_current: reading.tx_current,
                rx_voltage: reading.rx_voltage_mv,
                latitude,
                longitude,
                distance,
                calculated_depth: calc.depth,
                calculated_conductivity: calc.conductivity,
                calculated_resistivity: calc.resistivity,
                date: stamp.date.clone(),
                time: stamp.time.clone(),
            });
        }
        Ok(measurements)
    }

    /// Build the measurement records for `station` and reset for the next station.
    ///
    /// Fails with `IncompleteStation` while any frequency is missing; a failed
    /// finalize leaves the recorded readings untouched.
    pub fn finalize(
        &mut self,
        station: u32,
        common: &CommonParams,
        gps: Option<&GpsFix>,
        stamp: &CaptureStamp,
    ) -> Result<Vec<StationMeasurement>, SurveyError> {
        let measurements = self.measurements(station, common, gps, stamp)?;
        self.clear();
        debug!("finalized station {station}");
        Ok(measurements)
    }
}
