//! Export pipeline: fetch, render, deliver

use std::path::{Path, PathBuf};

use fuelsheet_core::{
    Delivery, PeriodRecord, PipelineError, Renderer, ReportKind, ReportSource, Request,
};
use fuelsheet_render::ReportLayoutEngine;

use crate::config::Config;
use crate::delivery::DirectoryDelivery;
use crate::source::JsonDirSource;

/// Serves export requests against a report source and a delivery target
#[derive(Debug)]
pub struct ReportPipeline<S, D> {
    source: S,
    delivery: D,
    engine: ReportLayoutEngine,
    reports: Vec<ReportKind>,
    file_prefix: String,
}

impl ReportPipeline<JsonDirSource, DirectoryDelivery> {
    /// Pipeline reading payloads and writing workbooks as configured
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            JsonDirSource::new(&config.source_dir),
            DirectoryDelivery::new(&config.output_dir),
            ReportLayoutEngine::new(config.categories.clone()),
        )
        .reports(config.reports.clone())
        .file_prefix(config.file_prefix.clone())
    }
}

impl<S: ReportSource, D: Delivery> ReportPipeline<S, D> {
    pub fn new(source: S, delivery: D, engine: ReportLayoutEngine) -> Self {
        Self {
            source,
            delivery,
            engine,
            reports: ReportKind::ALL.to_vec(),
            file_prefix: String::new(),
        }
    }

    /// Report kinds fetched for every request
    pub fn reports(mut self, reports: Vec<ReportKind>) -> Self {
        self.reports = reports;
        self
    }

    /// Key prefix for delivered workbooks
    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// Delivery key for a request: `<prefix>/<station>-<YYYY-MM>.xlsx`
    pub fn object_key(&self, request: &Request) -> String {
        let file = format!(
            "{}-{}.xlsx",
            request.station_id,
            request.date.format("%Y-%m")
        );
        let prefix = self.file_prefix.trim_matches('/');
        if prefix.is_empty() {
            file
        } else {
            format!("{prefix}/{file}")
        }
    }

    /// Fetch one record per configured report kind
    pub fn fetch_all(&self, request: &Request) -> Result<Vec<PeriodRecord>, PipelineError> {
        self.reports
            .iter()
            .map(|&kind| {
                tracing::debug!(%kind, "fetching report");
                self.source
                    .fetch(request, kind)
                    .map_err(PipelineError::from)
            })
            .collect()
    }

    /// Fetch and render to xlsx bytes
    pub fn render(&self, request: &Request) -> Result<Vec<u8>, PipelineError> {
        let records = self.fetch_all(request)?;
        Ok(self.engine.render(&records)?)
    }

    /// Fetch, render and deliver, returning the delivery locator
    pub fn run(&self, request: &Request) -> Result<String, PipelineError> {
        let bytes = self.render(request)?;
        let key = self.object_key(request);
        let locator = self.delivery.deliver(&bytes, &key)?;
        tracing::info!(
            station = %request.station_id,
            date = %request.date,
            %locator,
            "export complete"
        );
        Ok(locator)
    }

    /// Fetch and render straight to a file, bypassing delivery
    pub fn run_to_path(&self, request: &Request, path: &Path) -> Result<PathBuf, PipelineError> {
        let records = self.fetch_all(request)?;
        let workbook = self.engine.layout_all(&records)?;
        Ok(workbook.serialize_to_path(path)?)
    }
}
