//! # fuelsheet-render
//!
//! Report layout engine and XLSX workbook assembly.
//!
//! This crate provides:
//! - Cell address codec (`B3`, `A1:D1`) and a small `SUM` formula builder
//! - Declarative cell styles resolved to XLSX formats on write
//! - `SheetBuilder`: an in-memory sheet of values, formulas, merges and widths
//! - `ReportLayoutEngine`: one sheet per report record
//! - `Workbook`: ordered sheets serialized with `rust_xlsxwriter`
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use chrono::NaiveDate;
//! use fuelsheet_core::{CategorySet, DailySeries, Observation, PeriodRecord, Renderer, Station};
//! use fuelsheet_render::ReportLayoutEngine;
//!
//! let may = NaiveDate::from_ymd_opt(2018, 5, 1).unwrap();
//! let mut series = DailySeries::new(Station::new("st-1", "Bridgeport"), may);
//! series.categories = vec!["NL".into(), "DSL".into()];
//! series.observations.push(Observation::new(
//!     may,
//!     HashMap::from([("NL".to_string(), 100.0), ("DSL".to_string(), 50.0)]),
//! ));
//!
//! let engine = ReportLayoutEngine::new(CategorySet::fuel_types());
//! let xlsx_bytes = engine.render(&[PeriodRecord::FuelSales(series)]).unwrap();
//! assert!(xlsx_bytes.starts_with(b"PK"));
//! ```

pub mod address;
pub mod formula;
pub mod layout;
pub mod sheet;
pub mod style;
pub mod workbook;

pub use address::{address, column_letter, parse_address, range, CellAddress, CellRange};
pub use formula::{CellRef, SumFormula};
pub use layout::{EntityListVariant, ReportLayoutEngine};
pub use sheet::{Cell, CellValue, LayoutCursor, SheetBuilder};
pub use style::{FontColor, NumberFormat, Style};
pub use workbook::{Workbook, DEFAULT_SHEET_NAME};
