//! Tabular report of a project.
//!
//! A report is a short banner describing the project, a blank separator row,
//! the fixed header and one row per stored measurement. Numbers are carried as
//! typed cells; the sink decides how to render them.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::info;

use crate::error::SurveyError;
use crate::models::{Frequency, Project, StationMeasurement};

/// Column titles, in output order.
pub const HEADER: [&str; 12] = [
    "Station",
    "Frequency (Hz)",
    "Latitude",
    "Longitude",
    "Distance (m)",
    "Depth (m)",
    "Tx (A)",
    "Rx (mV)",
    "Conductivity (µS/cm)",
    "Resistivity (Ω·m)",
    "Date",
    "Time",
];

const COORDINATE_PRECISION: usize = 6;
const DISTANCE_PRECISION: usize = 2;
const DERIVED_PRECISION: usize = 3;
const READING_PRECISION: usize = 2;

#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Integer(i64),
    Decimal { value: f64, precision: usize },
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn decimal(value: f64, precision: usize) -> Self {
        Cell::Decimal { value, precision }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(text) => f.write_str(text),
            Cell::Integer(value) => write!(f, "{value}"),
            Cell::Decimal { value, precision } => write!(f, "{value:.precision$}"),
        }
    }
}

/// One measurement flattened for the report.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportRow {
    pub station: u32,
    pub frequency: Frequency,
    pub latitude: f64,
    pub longitude: f64,
    pub distance: f64,
    pub depth: f64,
    pub tx_current: f64,
    pub rx_voltage: f64,
    pub conductivity: f64,
    pub resistivity: f64,
    pub date: String,
    pub time: String,
}

impl ReportRow {
    fn new(station: u32, m: &StationMeasurement) -> Self {
        Self {
            station,
            frequency: m.frequency,
            latitude: m.latitude,
            longitude: m.longitude,
            distance: m.distance,
            depth: m.calculated_depth,
            tx_current: m.tx_current,
            rx_voltage: m.rx_voltage,
            conductivity: m.calculated_conductivity,
            resistivity: m.calculated_resistivity,
            date: m.date.clone(),
            time: m.time.clone(),
        }
    }

    /// Cells in [`HEADER`] order.
    pub fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Integer(i64::from(self.station)),
            Cell::Integer(i64::from(self.frequency.hz())),
            Cell::decimal(self.latitude, COORDINATE_PRECISION),
            Cell::decimal(self.longitude, COORDINATE_PRECISION),
            Cell::decimal(self.distance, DISTANCE_PRECISION),
            Cell::decimal(self.depth, DERIVED_PRECISION),
            Cell::decimal(self.tx_current, READING_PRECISION),
            Cell::decimal(self.rx_voltage, READING_PRECISION),
            Cell::decimal(self.conductivity, DERIVED_PRECISION),
            Cell::decimal(self.resistivity, DERIVED_PRECISION),
            Cell::text(&self.date),
            Cell::text(&self.time),
        ]
    }
}

/// Project summary rows preceding the table.
pub fn banner(project: &Project) -> Vec<Vec<Cell>> {
    let common = &project.common;
    let mut rows = vec![
        vec![Cell::text("Project"), Cell::text(&project.name)],
        vec![Cell::text("Transect"), Cell::Integer(i64::from(common.transcat))],
        vec![
            Cell::text("Interstation (m)"),
            Cell::decimal(common.interstation, DISTANCE_PRECISION),
        ],
        vec![
            Cell::text("Average Resistivity (Ω·m)"),
            Cell::decimal(common.average_resistivity, DISTANCE_PRECISION),
        ],
        vec![
            Cell::text("Intercoil (m)"),
            Cell::decimal(common.intercoil, DISTANCE_PRECISION),
        ],
    ];
    if let Some(gps) = &project.gps {
        rows.push(vec![
            Cell::text("GPS"),
            Cell::decimal(gps.latitude, COORDINATE_PRECISION),
            Cell::decimal(gps.longitude, COORDINATE_PRECISION),
        ]);
    }
    rows
}

/// One row per measurement, stations ascending, measurements in stored order.
pub fn flatten(project: &Project) -> Vec<ReportRow> {
    project
        .stations
        .iter()
        .flat_map(|(&station, measurements)| {
            measurements.iter().map(move |m| ReportRow::new(station, m))
        })
        .collect()
}

/// Receiver of report rows (spreadsheet writer, CSV file, test buffer).
pub trait TableSink {
    fn write_row(&mut self, cells: &[Cell]) -> Result<(), SurveyError>;

    fn finish(&mut self) -> Result<(), SurveyError> {
        Ok(())
    }
}

impl TableSink for Vec<Vec<Cell>> {
    fn write_row(&mut self, cells: &[Cell]) -> Result<(), SurveyError> {
        self.push(cells.to_vec());
        Ok(())
    }
}

/// Write banner, separator, header and rows. Returns the number of data rows.
pub fn write_report<T: TableSink + ?Sized>(
    project: &Project,
    sink: &mut T,
) -> Result<usize, SurveyError> {
    for row in banner(project) {
        sink.write_row(&row)?;
    }
    sink.write_row(&[Cell::Empty])?;
    let header: Vec<Cell> = HEADER.iter().map(|h| Cell::text(*h)).collect();
    sink.write_row(&header)?;

    let rows = flatten(project);
    for row in &rows {
        sink.write_row(&row.cells())?;
    }
    sink.finish()?;
    info!("exported {} rows of '{}'", rows.len(), project.name);
    Ok(rows.len())
}

/// File name for a project's report: whitespace runs become `_`.
pub fn report_file_name(project: &Project) -> String {
    let stem = project.name.split_whitespace().collect::<Vec<_>>().join("_");
    format!("{stem}_data.csv")
}

/// CSV rendering of a report. Rows may have different widths.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().flexible(true).from_writer(inner),
        }
    }

    pub fn into_inner(self) -> Result<W, SurveyError> {
        self.writer
            .into_inner()
            .map_err(|e| SurveyError::Export(e.to_string()))
    }
}

impl CsvSink<File> {
    pub fn create(path: &Path) -> Result<Self, SurveyError> {
        let file = File::create(path)
            .map_err(|e| SurveyError::Export(format!("{}: {e}", path.display())))?;
        Ok(Self::new(file))
    }
}

impl<W: Write> TableSink for CsvSink<W> {
    fn write_row(&mut self, cells: &[Cell]) -> Result<(), SurveyError> {
        self.writer
            .write_record(cells.iter().map(|c| c.to_string()))
            .map_err(|e| SurveyError::Export(e.to_string()))
    }

    fn finish(&mut self) -> Result<(), SurveyError> {
        self.writer
            .flush()
            .map_err(|e| SurveyError::Export(e.to_string()))
    }
}
