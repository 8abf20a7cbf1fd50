//! # fuelsheet-core
//!
//! Core domain model and traits for the fuelsheet report exporter.
//!
//! This crate provides:
//! - Report records: `DailySeries`, `EntityPeriodList`, `MonthlySeries`, tagged by `PeriodRecord`
//! - Canonical category ordering: `CategorySet`
//! - Collaborator traits: `ReportSource`, `Delivery`, `Renderer`
//! - Request validation and upstream payload decoding
//! - Error types for every stage of a request
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use chrono::NaiveDate;
//! use fuelsheet_core::{DailySeries, Observation, PeriodRecord, ReportKind, Station};
//!
//! let may = NaiveDate::from_ymd_opt(2018, 5, 1).unwrap();
//! let mut series = DailySeries::new(Station::new("st-1", "Bridgeport"), may);
//! series.categories = vec!["NL".into(), "DSL".into()];
//! series.observations.push(Observation::new(
//!     may,
//!     HashMap::from([("NL".to_string(), 100.0), ("DSL".to_string(), 50.0)]),
//! ));
//!
//! let record = PeriodRecord::FuelSales(series);
//! assert_eq!(record.kind(), ReportKind::FuelSales);
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod category;
pub mod payload;
pub mod request;

pub use category::CategorySet;
pub use request::{ErrorResponse, Request, RequestError, RequestInput};

// ============================================================================
// Type Aliases
// ============================================================================

/// Category code (fuel type) -> value
pub type CategoryValues = HashMap<String, f64>;

/// Unique identifier for a station
pub type StationId = String;

// ============================================================================
// Report Records
// ============================================================================

/// Station a report belongs to
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Station {
    pub id: StationId,
    pub name: String,
}

impl Station {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One dated row of a daily series
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub values: CategoryValues,
}

impl Observation {
    pub fn new(date: NaiveDate, values: CategoryValues) -> Self {
        Self { date, values }
    }
}

/// Day-by-day values for one station over a month
///
/// Used by the sales, delivery and short-term over/short reports.
#[derive(Clone, Debug, PartialEq)]
pub struct DailySeries {
    pub station: Station,
    /// Requested period; rendered as "Month YYYY"
    pub period: NaiveDate,
    /// Categories present in the record, in any order
    pub categories: Vec<String>,
    /// Observations in chronological order (not re-sorted)
    pub observations: Vec<Observation>,
    pub summary: CategoryValues,
    /// Grand total over all categories, when the source supplies one
    pub total: Option<f64>,
}

impl DailySeries {
    pub fn new(station: Station, period: NaiveDate) -> Self {
        Self {
            station,
            period,
            categories: Vec::new(),
            observations: Vec::new(),
            summary: CategoryValues::new(),
            total: None,
        }
    }
}

/// Labeled date range used as a column group (typically a calendar week)
#[derive(Clone, Debug, PartialEq)]
pub struct PeriodWindow {
    /// Lookup key for per-window data such as unit prices (e.g. "201818")
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodWindow {
    pub fn new(label: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            label: label.into(),
            start,
            end,
        }
    }
}

/// One station's row in an entity list report
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityPeriods {
    pub station: Station,
    /// Values per period window, aligned by position with the report's windows
    pub periods: Vec<CategoryValues>,
    /// Unit price per window label
    pub unit_prices: HashMap<String, f64>,
    /// Totals over all windows as reported by the source
    pub totals: CategoryValues,
}

impl EntityPeriods {
    pub fn new(station: Station) -> Self {
        Self {
            station,
            ..Self::default()
        }
    }

    /// Value for `category` in window `index`, zero if absent
    pub fn value(&self, index: usize, category: &str) -> f64 {
        self.periods
            .get(index)
            .and_then(|values| values.get(category))
            .copied()
            .unwrap_or(0.0)
    }

    /// Reported total for `category`, zero if absent
    pub fn total(&self, category: &str) -> f64 {
        self.totals.get(category).copied().unwrap_or(0.0)
    }

    pub fn unit_price(&self, label: &str) -> f64 {
        self.unit_prices.get(label).copied().unwrap_or(0.0)
    }
}

/// Per-station values across a sequence of period windows
#[derive(Clone, Debug, PartialEq)]
pub struct EntityPeriodList {
    pub period: NaiveDate,
    pub windows: Vec<PeriodWindow>,
    pub entities: Vec<EntityPeriods>,
}

impl EntityPeriodList {
    pub fn new(period: NaiveDate) -> Self {
        Self {
            period,
            windows: Vec::new(),
            entities: Vec::new(),
        }
    }
}

/// Month-by-month values for one station over a year
#[derive(Clone, Debug, PartialEq)]
pub struct MonthlySeries {
    pub station: Station,
    pub period: NaiveDate,
    pub year: i32,
    pub categories: Vec<String>,
    /// Buckets keyed by encoded year-month ("201801")
    pub months: HashMap<String, CategoryValues>,
    pub summary: CategoryValues,
}

impl MonthlySeries {
    pub fn new(station: Station, period: NaiveDate, year: i32) -> Self {
        Self {
            station,
            period,
            year,
            categories: Vec::new(),
            months: HashMap::new(),
            summary: CategoryValues::new(),
        }
    }

    /// Encoded bucket key for a year and 1-based month
    pub fn month_key(year: i32, month: u32) -> String {
        format!("{year:04}{month:02}")
    }
}

/// Report types, declared in the order their sheets appear in a workbook
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    FuelSales,
    FuelSalesList,
    FuelDelivery,
    OverShortMonth,
    OverShortAnnual,
}

impl ReportKind {
    pub const ALL: [ReportKind; 5] = [
        ReportKind::FuelSales,
        ReportKind::FuelSalesList,
        ReportKind::FuelDelivery,
        ReportKind::OverShortMonth,
        ReportKind::OverShortAnnual,
    ];

    /// Stable kebab-case name, also used as the payload file stem
    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::FuelSales => "fuel-sales",
            ReportKind::FuelSalesList => "fuel-sales-list",
            ReportKind::FuelDelivery => "fuel-delivery",
            ReportKind::OverShortMonth => "over-short-month",
            ReportKind::OverShortAnnual => "over-short-annual",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown report kind: {s}"))
    }
}

/// A fetched report, tagged by type
#[derive(Clone, Debug, PartialEq)]
pub enum PeriodRecord {
    FuelSales(DailySeries),
    FuelSalesList(EntityPeriodList),
    FuelDelivery(DailySeries),
    OverShortMonth(DailySeries),
    OverShortAnnual(MonthlySeries),
}

impl PeriodRecord {
    pub fn kind(&self) -> ReportKind {
        match self {
            PeriodRecord::FuelSales(_) => ReportKind::FuelSales,
            PeriodRecord::FuelSalesList(_) => ReportKind::FuelSalesList,
            PeriodRecord::FuelDelivery(_) => ReportKind::FuelDelivery,
            PeriodRecord::OverShortMonth(_) => ReportKind::OverShortMonth,
            PeriodRecord::OverShortAnnual(_) => ReportKind::OverShortAnnual,
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Supplies report records for a validated request
pub trait ReportSource {
    fn fetch(&self, request: &Request, kind: ReportKind) -> Result<PeriodRecord, FetchError>;
}

/// Takes a serialized workbook somewhere retrievable
pub trait Delivery {
    /// Store `bytes` under `key`, returning a locator (path or URL)
    fn deliver(&self, bytes: &[u8], key: &str) -> Result<String, DeliveryError>;
}

/// Output rendering
pub trait Renderer {
    type Output;

    /// Render a set of report records to the output format
    fn render(&self, records: &[PeriodRecord]) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Layout error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Cell address out of range: column {col}, row {row}")]
    OutOfRangeAddress { col: u32, row: u32 },

    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    #[error("Formula {formula} references unwritten cell {cell}")]
    ForwardReference { formula: String, cell: String },
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Data fetch error
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Report not available: {0}")]
    NotFound(String),

    #[error("Malformed report payload: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Delivery error
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Invalid delivery key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Whether a failure was caused by the caller or by the service
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    Client,
    Server,
}

impl StatusClass {
    pub fn http_status(self) -> u16 {
        match self {
            StatusClass::Client => 400,
            StatusClass::Server => 500,
        }
    }
}

/// Any failure while serving one export request
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl From<LayoutError> for PipelineError {
    fn from(err: LayoutError) -> Self {
        PipelineError::Render(RenderError::Layout(err))
    }
}

impl PipelineError {
    pub fn status_class(&self) -> StatusClass {
        match self {
            PipelineError::Request(_) => StatusClass::Client,
            PipelineError::Fetch(_) | PipelineError::Render(_) | PipelineError::Delivery(_) => {
                StatusClass::Server
            }
        }
    }

    /// Short error category for response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Request(_) => "RequestValidation",
            PipelineError::Fetch(_) => "FetchError",
            PipelineError::Render(_) => "ProcessError",
            PipelineError::Delivery(_) => "DeliveryError",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            status: self.status_class().http_status(),
            kind: self.kind().to_string(),
            message: self.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
