//! Project-level station bookkeeping.
//!
//! Station numbers are never chosen freely: transect `t` numbers its stations
//! `t*100+1`, `t*100+2`, ... and a new transect jumps to its own block of
//! hundred. All transects share one station map keyed by absolute number.

use std::collections::{BTreeMap, BTreeSet};

use log::info;

use crate::error::SurveyError;
use crate::models::{
    starting_station, transect_of, CommonParams, Frequency, GpsFix, Project, StationMeasurement,
    MAX_TRANSECT, STATIONS_PER_TRANSECT,
};
use crate::setup::ProjectSetup;

impl Project {
    /// Create an empty project after validating its name and parameters.
    pub fn initialize(name: &str, common: CommonParams) -> Result<Self, SurveyError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SurveyError::validation("name", "is required"));
        }
        common.validate()?;
        Ok(Project {
            name: name.to_string(),
            common,
            stations: BTreeMap::new(),
            gps: None,
        })
    }

    pub fn from_setup(setup: ProjectSetup) -> Result<Self, SurveyError> {
        Self::initialize(&setup.name, setup.common)
    }

    pub fn with_gps(mut self, gps: Option<GpsFix>) -> Self {
        self.gps = gps;
        self
    }

    pub fn starting_station(&self) -> u32 {
        self.common.starting_station()
    }

    /// Store a complete station, replacing any earlier data under the same number.
    pub fn commit_station(
        &mut self,
        station: u32,
        measurements: Vec<StationMeasurement>,
    ) -> Result<(), SurveyError> {
        if station < self.starting_station() || station > self.common.last_station() {
            return Err(SurveyError::validation(
                "station",
                format!(
                    "{station} is outside transect {} ({}..={})",
                    self.common.transcat,
                    self.starting_station(),
                    self.common.last_station()
                ),
            ));
        }
        let recorded: BTreeSet<Frequency> = measurements.iter().map(|m| m.frequency).collect();
        if measurements.len() != Frequency::COUNT || recorded.len() != Frequency::COUNT {
            let missing = Frequency::ALL
                .into_iter()
                .filter(|f| !recorded.contains(f))
                .collect();
            return Err(SurveyError::IncompleteStation { station, missing });
        }

        if self.stations.insert(station, measurements).is_some() {
            info!("station {station} of '{}' overwritten", self.name);
        } else {
            info!("station {station} committed to '{}'", self.name);
        }
        Ok(())
    }

    /// Move the project to the next transect and return its starting station.
    /// Stations of earlier transects are kept.
    pub fn new_transect(&mut self) -> Result<u32, SurveyError> {
        if self.common.transcat >= MAX_TRANSECT {
            return Err(SurveyError::validation(
                "transcat",
                format!("cannot advance past transect {MAX_TRANSECT}"),
            ));
        }
        self.common.transcat += 1;
        info!(
            "'{}' advanced to transect {}",
            self.name, self.common.transcat
        );
        Ok(self.starting_station())
    }

    /// Next station to survey, derived from the stored stations.
    ///
    /// Continues after the highest station of the current transect, or starts
    /// the current transect when it has no stations yet.
    pub fn next_station(&self) -> u32 {
        let first = self.starting_station();
        self.stations
            .range(first..=self.common.last_station())
            .next_back()
            .map(|(station, _)| station + 1)
            .unwrap_or(first)
    }

    /// Highest station number in the project, across all transects.
    pub fn last_station(&self) -> Option<u32> {
        self.stations.keys().next_back().copied()
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn measurement_count(&self) -> usize {
        self.stations.values().map(Vec::len).sum()
    }

    /// Transects that hold at least one station, ascending.
    pub fn transects(&self) -> Vec<u32> {
        let set: BTreeSet<u32> = self.stations.keys().map(|&s| transect_of(s)).collect();
        set.into_iter().collect()
    }

    /// Stations belonging to `transcat`.
    pub fn stations_of(
        &self,
        transcat: u32,
    ) -> impl Iterator<Item = (&u32, &Vec<StationMeasurement>)> {
        let first = starting_station(transcat);
        self.stations.range(first..first + STATIONS_PER_TRANSECT - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::{CaptureStamp, Reading, StationAccumulator};

    fn common(transcat: u32) -> CommonParams {
        CommonParams {
            transcat,
            interstation: 10.0,
            average_resistivity: 100.0,
            intercoil: 10.0,
        }
    }

    fn station(project: &Project, number: u32) -> Vec<StationMeasurement> {
        let mut acc = StationAccumulator::new();
        for f in Frequency::ALL {
            acc.record(
                f,
                Reading {
                    tx_current: 1.0,
                    rx_voltage_mv: 40.0,
                },
            );
        }
        let stamp = CaptureStamp {
            date: "1/1/2026".to_string(),
            time: "8:00:00 AM".to_string(),
        };
        acc.finalize(number, &project.common, None, &stamp).unwrap()
    }

    #[test]
    fn test_initialize() {
        let project = Project::initialize(" Line 3 ", common(3)).unwrap();
        assert_eq!(project.name, "Line 3");
        assert_eq!(project.starting_station(), 301);
        assert_eq!(project.next_station(), 301);
        assert!(project.stations.is_empty());

        assert!(Project::initialize("", common(3)).is_err());
        let mut bad = common(3);
        bad.intercoil = 0.0;
        assert!(Project::initialize("Line", bad).is_err());
        assert!(Project::initialize("Line", common(100)).is_err());
    }

    #[test]
    fn test_commit_advances_next_station() {
        let mut project = Project::initialize("Line", common(3)).unwrap();
        let s = station(&project, 301);
        project.commit_station(301, s).unwrap();
        let s = station(&project, 302);
        project.commit_station(302, s).unwrap();

        assert_eq!(project.next_station(), 303);
        assert_eq!(project.station_count(), 2);
        assert_eq!(project.measurement_count(), 14);
    }

    #[test]
    fn test_commit_overwrites_same_station() {
        let mut project = Project::initialize("Line", common(0)).unwrap();
        let s = station(&project, 1);
        project.commit_station(1, s.clone()).unwrap();
        project.commit_station(1, s).unwrap();
        assert_eq!(project.station_count(), 1);
    }

    #[test]
    fn test_commit_rejects_foreign_or_partial_station() {
        let mut project = Project::initialize("Line", common(3)).unwrap();
        let s = station(&project, 301);
        assert!(matches!(
            project.commit_station(401, s.clone()),
            Err(SurveyError::Validation { .. })
        ));
        assert!(project.commit_station(400, s.clone()).is_err());
        assert!(project.commit_station(300, s.clone()).is_err());

        let partial: Vec<_> = s.into_iter().take(5).collect();
        match project.commit_station(301, partial) {
            Err(SurveyError::IncompleteStation { missing, .. }) => {
                assert_eq!(missing, vec![Frequency::F153, Frequency::F102]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(project.stations.is_empty());
    }

    #[test]
    fn test_new_transect_keeps_stations() {
        let mut project = Project::initialize("Line", common(3)).unwrap();
        for n in [301, 302] {
            let s = station(&project, n);
            project.commit_station(n, s).unwrap();
        }
        assert_eq!(project.new_transect().unwrap(), 401);
        assert_eq!(project.common.transcat, 4);
        assert_eq!(project.next_station(), 401);
        assert_eq!(project.station_count(), 2);

        let s = station(&project, 401);
        assert_eq!(s[0].distance, 0.0);
        project.commit_station(401, s).unwrap();
        assert_eq!(project.next_station(), 402);
        assert_eq!(project.transects(), vec![3, 4]);
        assert_eq!(project.last_station(), Some(401));
        assert_eq!(project.stations_of(3).count(), 2);
        assert_eq!(project.stations_of(4).count(), 1);
    }

    #[test]
    fn test_new_transect_limit() {
        let mut project = Project::initialize("Line", common(98)).unwrap();
        assert_eq!(project.new_transect().unwrap(), 9901);
        assert!(project.new_transect().is_err());
        assert_eq!(project.common.transcat, 99);
    }

    #[test]
    fn test_next_station_after_resume() {
        let mut project = Project::initialize("Line", common(2)).unwrap();
        for n in [201, 202, 205] {
            let s = station(&project, n);
            project.commit_station(n, s).unwrap();
        }
        let json = serde_json::to_string(&project).unwrap();
        let reloaded: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, project);
        assert_eq!(reloaded.next_station(), 206);
    }
}
