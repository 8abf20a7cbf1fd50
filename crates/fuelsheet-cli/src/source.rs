//! File-backed report source
//!
//! Reads upstream report payloads from `<dir>/<report-kind>.json`, e.g.
//! `reports/fuel-sales.json`, and decodes them for the requested period.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fuelsheet_core::{payload, FetchError, PeriodRecord, ReportKind, ReportSource, Request};

#[derive(Clone, Debug)]
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Payload file for a report kind
    pub fn path_for(&self, kind: ReportKind) -> PathBuf {
        self.dir.join(format!("{kind}.json"))
    }
}

impl ReportSource for JsonDirSource {
    fn fetch(&self, request: &Request, kind: ReportKind) -> Result<PeriodRecord, FetchError> {
        let path = self.path_for(kind);
        let text = std::fs::read_to_string(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => FetchError::NotFound(format!("{kind} ({})", path.display())),
            _ => FetchError::Io(err),
        })?;
        tracing::debug!(
            %kind,
            path = %path.display(),
            station = %request.station_id,
            "payload read"
        );
        payload::decode(kind, &text, request.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn request() -> Request {
        Request::new(NaiveDate::from_ymd_opt(2018, 5, 1).unwrap(), "st-1")
    }

    #[test]
    fn reads_payload_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("fuel-delivery.json"),
            r#"{"station": {"id": "st-1", "name": "Bridgeport"},
                "fuelDeliveryReport": {"fuelTypes": ["NL"],
                    "deliveries": [{"date": 20180502, "data": {"NL": 9000}}],
                    "deliverySummary": {"NL": 9000}}}"#,
        )
        .unwrap();

        let source = JsonDirSource::new(dir.path());
        let record = source.fetch(&request(), ReportKind::FuelDelivery).unwrap();
        match record {
            PeriodRecord::FuelDelivery(series) => {
                assert_eq!(series.station.name, "Bridgeport");
                assert_eq!(series.observations.len(), 1);
                assert_eq!(series.period, request().date);
            }
            other => panic!("unexpected record {:?}", other.kind()),
        }
    }

    #[test]
    fn missing_payload_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonDirSource::new(dir.path());
        let err = source
            .fetch(&request(), ReportKind::OverShortAnnual)
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFound(ref msg) if msg.contains("over-short-annual")));
    }

    #[test]
    fn garbage_payload_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fuel-sales.json"), "not json").unwrap();
        let source = JsonDirSource::new(dir.path());
        let err = source.fetch(&request(), ReportKind::FuelSales).unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }
}
