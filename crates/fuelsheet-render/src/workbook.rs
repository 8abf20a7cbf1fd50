//! Workbook assembly and xlsx serialization

use std::path::{Path, PathBuf};

use fuelsheet_core::RenderError;
use rust_xlsxwriter::{Workbook as XlsxWorkbook, XlsxError};

use crate::sheet::SheetBuilder;

/// Name of the sheet every new workbook starts with
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Ordered collection of named sheets, built for one request
#[derive(Clone, Debug)]
pub struct Workbook {
    sheets: Vec<SheetBuilder>,
    /// The initial sheet has not been claimed yet
    default_unused: bool,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    pub fn new() -> Self {
        Self {
            sheets: vec![SheetBuilder::new(DEFAULT_SHEET_NAME)],
            default_unused: true,
        }
    }

    /// Append a sheet; the first call renames the untouched default sheet
    pub fn add_sheet(&mut self, name: impl Into<String>) -> &mut SheetBuilder {
        if self.claim_default() {
            let sheet = &mut self.sheets[0];
            sheet.rename(name);
            return sheet;
        }
        self.sheets.push(SheetBuilder::new(name));
        let last = self.sheets.len() - 1;
        &mut self.sheets[last]
    }

    /// Append a sheet built elsewhere, replacing the untouched default sheet
    pub fn adopt(&mut self, sheet: SheetBuilder) {
        if self.claim_default() {
            self.sheets[0] = sheet;
        } else {
            self.sheets.push(sheet);
        }
    }

    fn claim_default(&mut self) -> bool {
        let claimable = self.default_unused
            && self.sheets.len() == 1
            && self.sheets[0].name() == DEFAULT_SHEET_NAME
            && self.sheets[0].is_empty();
        self.default_unused = false;
        claimable
    }

    pub fn sheets(&self) -> &[SheetBuilder] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetBuilder> {
        self.sheets.iter().find(|sheet| sheet.name() == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut SheetBuilder> {
        self.sheets.iter_mut().find(|sheet| sheet.name() == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(SheetBuilder::name).collect()
    }

    /// Serialize to xlsx bytes
    pub fn serialize_to_buffer(&self) -> Result<Vec<u8>, RenderError> {
        let mut workbook = self.to_xlsx().map_err(serialization)?;
        workbook.save_to_buffer().map_err(serialization)
    }

    /// Serialize to a file, returning the path written
    pub fn serialize_to_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, RenderError> {
        let path = path.as_ref();
        let bytes = self.serialize_to_buffer()?;
        std::fs::write(path, bytes)?;
        tracing::debug!(path = %path.display(), "workbook written");
        Ok(path.to_path_buf())
    }

    fn to_xlsx(&self) -> Result<XlsxWorkbook, XlsxError> {
        let mut workbook = XlsxWorkbook::new();
        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            sheet.write_to(worksheet)?;
        }
        Ok(workbook)
    }
}

fn serialization(err: XlsxError) -> RenderError {
    RenderError::Serialization(err.to_string())
}
