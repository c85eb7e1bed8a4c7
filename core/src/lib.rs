pub mod accumulator;
pub mod config;
pub mod error;
pub mod export;
pub mod formula;
pub mod instrument;
pub mod instrument_mock;
pub mod location;
pub mod models;
pub mod project;
pub mod session;
pub mod setup;
pub mod store;

uniffi::setup_scaffolding!();

pub use accumulator::{CaptureStamp, Reading, StationAccumulator};
pub use config::SurveyConfig;
pub use error::SurveyError;
pub use export::{flatten, write_report, Cell, CsvSink, ReportRow, TableSink, HEADER};
pub use formula::{calculate_measurement, Calculation, FormulaInput};
pub use instrument::{Instrument, InstrumentError, InstrumentSample};
pub use location::{CachedFix, LocationProvider};
pub use models::{
    starting_station, CommonParams, Frequency, GpsFix, Project, Station, StationMeasurement,
};
pub use session::SurveySession;
pub use setup::{parse_setup, ProjectSetup, SetupForm};
pub use store::{FileStore, KeyValueStore, MemoryStore, SurveyStore};

/// Survey frequencies in acquisition order.
#[uniffi::export]
pub fn survey_frequencies() -> Vec<Frequency> {
    Frequency::ALL.to_vec()
}
