//! CSV ingestion of plot rows.
//!
//! Reads the land sale spreadsheet export, one plot per row, with columns:
//!
//! `Rank, Name, Neighborhood, Zoning Type, Plot Size, Building Size,
//! Distance to Ocean, Distance to Ocean (m), Distance to Bay,
//! Distance to Bay (m), Min # of Floors, Max # of Floors,
//! Min Building Height (m), Max Building Height (m), Plot Area (m²)`
//!
//! The two category columns are informational: categories are always
//! recomputed from the meters columns, and a disagreeing label is logged.
//! A malformed row is reported and skipped; it never aborts the file.

use std::fs::File;
use std::io;
use std::path::Path;

use landmem_core::model::DistanceCategory;
use landmem_core::{BuildingType, Error, PlotMetadata, PlotSize, Result, ZoningType};
use serde::{Deserialize, Serialize};

/// One raw row of the CSV export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvPlotRow {
    #[serde(rename = "Rank")]
    pub rank: u32,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Neighborhood")]
    pub neighborhood: String,
    #[serde(rename = "Zoning Type")]
    pub zoning: String,
    #[serde(rename = "Plot Size")]
    pub plot_size: String,
    #[serde(rename = "Building Size")]
    pub building_size: String,
    #[serde(rename = "Distance to Ocean", default)]
    pub ocean_category: Option<String>,
    #[serde(rename = "Distance to Ocean (m)")]
    pub ocean_meters: f64,
    #[serde(rename = "Distance to Bay", default)]
    pub bay_category: Option<String>,
    #[serde(rename = "Distance to Bay (m)")]
    pub bay_meters: f64,
    #[serde(rename = "Min # of Floors")]
    pub min_floors: u32,
    #[serde(rename = "Max # of Floors")]
    pub max_floors: u32,
    #[serde(rename = "Min Building Height (m)")]
    pub min_height: f64,
    #[serde(rename = "Max Building Height (m)")]
    pub max_height: f64,
    #[serde(rename = "Plot Area (m²)")]
    pub plot_area: f64,
}

impl CsvPlotRow {
    /// Convert to validated plot metadata.
    ///
    /// # Errors
    ///
    /// Returns an invalid-data error for an unknown enumeration label and a
    /// validation error for inconsistent values.
    pub fn to_metadata(&self) -> Result<PlotMetadata> {
        let metadata = PlotMetadata::builder(self.name.trim(), self.rank)
            .neighborhood(self.neighborhood.trim())
            .zoning(self.zoning.parse::<ZoningType>()?)
            .plot_size(self.plot_size.parse::<PlotSize>()?)
            .building_type(self.building_size.parse::<BuildingType>()?)
            .ocean_meters(self.ocean_meters)
            .bay_meters(self.bay_meters)
            .floors(self.min_floors, self.max_floors)
            .height(self.min_height, self.max_height)
            .plot_area(self.plot_area)
            .build()?;

        check_label(
            &metadata.name,
            "ocean",
            self.ocean_category.as_deref(),
            metadata.distances.ocean.category(),
        );
        check_label(
            &metadata.name,
            "bay",
            self.bay_category.as_deref(),
            metadata.distances.bay.category(),
        );
        Ok(metadata)
    }
}

fn check_label(plot: &str, water: &str, label: Option<&str>, computed: DistanceCategory) {
    let Some(label) = label.map(str::trim).filter(|l| !l.is_empty()) else {
        return;
    };
    match label.parse::<DistanceCategory>() {
        Ok(given) if given == computed => {}
        Ok(given) => log::warn!(
            "{plot}: {water} distance labelled {given} but its meters bucket to {computed}; using {computed}"
        ),
        Err(_) => log::warn!(
            "{plot}: unrecognised {water} distance label '{label}'; using {computed}"
        ),
    }
}

/// A row that could not be turned into plot metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRow {
    /// 1-based line number in the file (the header is line 1).
    pub line: u64,
    /// Why the row was rejected.
    pub reason: String,
}

/// Outcome of reading one row.
#[derive(Debug)]
pub struct ParsedRow {
    /// 1-based line number in the file.
    pub line: u64,
    /// The row's metadata, or why it was rejected.
    pub metadata: Result<PlotMetadata>,
}

/// Reads plot rows from CSV.
pub struct CsvPlotReader<R: io::Read> {
    reader: csv::Reader<R>,
}

impl CsvPlotReader<File> {
    /// Open a CSV file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io_with_path(e, path))?;
        Ok(Self::from_reader(file))
    }
}

impl<R: io::Read> CsvPlotReader<R> {
    /// Read CSV from any reader.
    pub fn from_reader(reader: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(false)
            .from_reader(reader);
        Self { reader }
    }

    /// Parse every row.
    ///
    /// # Errors
    ///
    /// Fails only when the header row is unreadable or lacks a required
    /// column; bad data rows come back as failed [`ParsedRow`]s.
    pub fn read_all(mut self) -> Result<Vec<ParsedRow>> {
        let headers = self
            .reader
            .headers()
            .map_err(|e| Error::invalid_data(format!("unreadable CSV header: {e}")))?
            .clone();
        for required in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == *required) {
                return Err(Error::invalid_data(format!(
                    "CSV header is missing column '{required}'"
                )));
            }
        }

        let mut rows = Vec::new();
        let mut record = csv::StringRecord::new();
        loop {
            let next_line = self.reader.position().line();
            match self.reader.read_record(&mut record) {
                Ok(false) => break,
                Ok(true) => {
                    let line = record.position().map_or(next_line, |p| p.line());
                    let metadata = record
                        .deserialize::<CsvPlotRow>(Some(&headers))
                        .map_err(|e| Error::invalid_data(format!("malformed row: {e}")))
                        .and_then(|row| row.to_metadata());
                    rows.push(ParsedRow { line, metadata });
                }
                Err(e) => {
                    let line = e.position().map_or(next_line, |p| p.line());
                    let fatal = e.is_io_error();
                    rows.push(ParsedRow {
                        line,
                        metadata: Err(Error::invalid_data(format!("malformed row: {e}"))),
                    });
                    if fatal {
                        break;
                    }
                }
            }
        }
        Ok(rows)
    }
}

const REQUIRED_COLUMNS: &[&str] = &[
    "Rank",
    "Name",
    "Neighborhood",
    "Zoning Type",
    "Plot Size",
    "Building Size",
    "Distance to Ocean (m)",
    "Distance to Bay (m)",
    "Min # of Floors",
    "Max # of Floors",
    "Min Building Height (m)",
    "Max Building Height (m)",
    "Plot Area (m²)",
];

// ============================================================================
// Tests
// ============================================================================
