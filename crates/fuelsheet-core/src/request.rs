//! Request boundary types
//!
//! An export request arrives as loosely-typed JSON (`{"date": "2018-05-01",
//! "stationID": "..."}`) and is validated into a [`Request`] before any data
//! is fetched. Failures are reported back as an [`ErrorResponse`] body.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Date format accepted in request bodies
pub const REQUEST_DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw request body
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestInput {
    #[serde(default)]
    pub date: String,
    #[serde(rename = "stationID", default)]
    pub station_id: String,
}

/// Validated export request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub date: NaiveDate,
    pub station_id: String,
}

impl Request {
    pub fn new(date: NaiveDate, station_id: impl Into<String>) -> Self {
        Self {
            date,
            station_id: station_id.into(),
        }
    }

    /// Validate a raw request body
    pub fn from_input(input: &RequestInput) -> Result<Self, RequestError> {
        let date = parse_date(&input.date)?;
        let station_id = input.station_id.trim();
        if station_id.is_empty() {
            return Err(RequestError::MissingStation);
        }
        Ok(Self::new(date, station_id))
    }
}

impl TryFrom<RequestInput> for Request {
    type Error = RequestError;

    fn try_from(input: RequestInput) -> Result<Self, Self::Error> {
        Request::from_input(&input)
    }
}

/// Parse a `YYYY-MM-DD` request date
pub fn parse_date(raw: &str) -> Result<NaiveDate, RequestError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RequestError::MissingDate);
    }
    NaiveDate::parse_from_str(raw, REQUEST_DATE_FORMAT)
        .map_err(|_| RequestError::InvalidDate(raw.to_string()))
}

/// Request validation error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Missing request date")]
    MissingDate,

    #[error("Invalid request date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Missing station id")]
    MissingStation,

    #[error("Malformed request body: {0}")]
    MalformedBody(String),
}

/// JSON body returned for a failed request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}
