//! Survey session: the caller-owned state of one project being surveyed.
//!
//! A session owns the project, the station cursor, the open station's
//! readings and the GPS fix taken when the session started. Every commit and
//! transect change is persisted to the store before the in-memory state moves
//! on, so a failed write leaves both the session and the stored collection as
//! they were.

use chrono::{Local, NaiveDateTime, Utc};
use log::{info, warn};

use crate::accumulator::{Reading, StationAccumulator};
use crate::config::SurveyConfig;
use crate::error::SurveyError;
use crate::instrument::Instrument;
use crate::location::{acquire_fix, LocationProvider};
use crate::models::{Frequency, GpsFix, Project, StationMeasurement};
use crate::setup::ProjectSetup;
use crate::store::{KeyValueStore, SurveyStore};

#[derive(Debug)]
pub struct SurveySession {
    project: Project,
    index: Option<usize>,
    cursor: u32,
    accumulator: StationAccumulator,
    gps: Option<GpsFix>,
    config: SurveyConfig,
}

impl SurveySession {
    /// Start a new project. Nothing is persisted until the first commit.
    pub fn start<L: LocationProvider + ?Sized>(
        setup: ProjectSetup,
        location: &mut L,
        config: SurveyConfig,
    ) -> Result<Self, SurveyError> {
        config.validate()?;
        let gps = acquire_fix(location, Utc::now(), config.gps_max_age());
        let project = Project::from_setup(setup)?.with_gps(gps.clone());
        let cursor = project.starting_station();
        info!("started '{}' at station {cursor}", project.name);
        Ok(Self {
            project,
            index: None,
            cursor,
            accumulator: StationAccumulator::new(),
            gps,
            config,
        })
    }

    /// Reopen the project stored at `index`; the cursor is derived from its stations.
    pub fn resume<S: KeyValueStore, L: LocationProvider + ?Sized>(
        store: &SurveyStore<S>,
        index: usize,
        location: &mut L,
        config: SurveyConfig,
    ) -> Result<Self, SurveyError> {
        config.validate()?;
        let project = store.get(index)?;
        let gps = acquire_fix(location, Utc::now(), config.gps_max_age())
            .or_else(|| project.gps.clone());
        let cursor = project.next_station();
        info!("resumed '{}' at station {cursor}", project.name);
        Ok(Self {
            project,
            index: Some(index),
            cursor,
            accumulator: StationAccumulator::new(),
            gps,
            config,
        })
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Position in the store, once persisted.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn current_station(&self) -> u32 {
        self.cursor
    }

    pub fn gps(&self) -> Option<&GpsFix> {
        self.gps.as_ref()
    }

    pub fn accumulator(&self) -> &StationAccumulator {
        &self.accumulator
    }

    pub fn missing_frequencies(&self) -> Vec<Frequency> {
        self.accumulator.missing()
    }

    pub fn record(&mut self, frequency: Frequency, reading: Reading) {
        self.accumulator.record(frequency, reading);
    }

    /// Take one reading from the instrument for `frequency`.
    ///
    /// A failed acquisition leaves earlier readings untouched and may simply be retried.
    pub fn acquire<I: Instrument + ?Sized>(
        &mut self,
        frequency: Frequency,
        instrument: &mut I,
    ) -> Result<Reading, SurveyError> {
        match instrument.acquire() {
            Ok(sample) => {
                let reading = sample.to_reading();
                self.accumulator.record(frequency, reading);
                Ok(reading)
            }
            Err(e) => {
                warn!(
                    "{} failed at {frequency} for station {}: {e}",
                    instrument.describe(),
                    self.cursor
                );
                Err(SurveyError::AcquisitionFailure(e))
            }
        }
    }

    /// Commit the open station stamped with the current local time.
    pub fn complete_station<S: KeyValueStore>(
        &mut self,
        store: &mut SurveyStore<S>,
    ) -> Result<u32, SurveyError> {
        self.complete_station_at(store, Local::now().naive_local())
    }

    /// Commit the open station, persist the project and advance the cursor.
    /// Returns the committed station number.
    pub fn complete_station_at<S: KeyValueStore>(
        &mut self,
        store: &mut SurveyStore<S>,
        captured_at: NaiveDateTime,
    ) -> Result<u32, SurveyError> {
        let station = self.cursor;
        let stamp = self.config.stamp(captured_at)?;
        let measurements: Vec<StationMeasurement> = self.accumulator.measurements(
            station,
            &self.project.common,
            self.gps.as_ref(),
            &stamp,
        )?;

        let mut updated = self.project.clone();
        updated.commit_station(station, measurements)?;
        self.persist(store, updated)?;

        self.accumulator.clear();
        self.cursor += 1;
        info!("station {station} saved, next is {}", self.cursor);
        Ok(station)
    }

    /// Start the next transect. Readings of the open station are discarded.
    pub fn new_transect<S: KeyValueStore>(
        &mut self,
        store: &mut SurveyStore<S>,
    ) -> Result<u32, SurveyError> {
        let mut updated = self.project.clone();
        let first = updated.new_transect()?;
        self.persist(store, updated)?;

        if !self.accumulator.is_empty() {
            warn!(
                "discarding {} readings of unsaved station {}",
                self.accumulator.recorded_count(),
                self.cursor
            );
            self.accumulator.clear();
        }
        self.cursor = first;
        Ok(first)
    }

    fn persist<S: KeyValueStore>(
        &mut self,
        store: &mut SurveyStore<S>,
        project: Project,
    ) -> Result<(), SurveyError> {
        match self.index {
            Some(index) => store.replace_at(index, project.clone())?,
            None => self.index = Some(store.append(project.clone())?),
        }
        self.project = project;
        Ok(())
    }
}
