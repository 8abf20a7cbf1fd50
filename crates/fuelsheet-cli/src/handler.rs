//! Request handler
//!
//! Turns a raw JSON request body into a response: `201` with the delivery
//! locator on success, or an error body
//!
//! ```text
//! {"status": 400, "type": "RequestValidation", "message": "Missing request date"}
//! ```
//!
//! with status 400 for caller errors and 500 for everything else.

use fuelsheet_core::{
    Delivery, ErrorResponse, PipelineError, ReportSource, Request, RequestError, RequestInput,
};

use serde::Deserialize;
use serde_json::Value;

use crate::pipeline::ReportPipeline;

pub const STATUS_CREATED: u16 = 201;

/// Status code and body returned to the caller
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn error(err: &PipelineError) -> Self {
        let response = err.to_response();
        tracing::error!(
            status = response.status,
            kind = %response.kind,
            message = %response.message,
            "request failed"
        );
        Self {
            status: response.status,
            body: error_body(&response),
        }
    }
}

fn error_body(response: &ErrorResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|_| response.message.clone())
}

/// Parse and validate a request body
pub fn parse_request(body: &str) -> Result<Request, RequestError> {
    if body.trim().is_empty() {
        return Err(RequestError::MalformedBody("empty request body".into()));
    }
    let value: Value =
        serde_json::from_str(body).map_err(|e| RequestError::MalformedBody(e.to_string()))?;
    if !value.is_object() {
        return Err(RequestError::MalformedBody("request body must be a JSON object".into()));
    }
    let input =
        RequestInput::deserialize(value).map_err(|e| RequestError::MalformedBody(e.to_string()))?;
    Request::try_from(input)
}

/// Serve one export request
pub fn handle<S, D>(pipeline: &ReportPipeline<S, D>, body: &str) -> Response
where
    S: ReportSource,
    D: Delivery,
{
    let outcome = parse_request(body)
        .map_err(PipelineError::from)
        .and_then(|request| pipeline.run(&request));
    match outcome {
        Ok(locator) => Response {
            status: STATUS_CREATED,
            body: locator,
        },
        Err(err) => Response::error(&err),
    }
}
