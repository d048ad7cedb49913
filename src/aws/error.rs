//! AWS API errors
//!
//! EC2 reports failures as an XML document carrying a machine-readable error
//! code. The code is what table policies match against, so it is kept as a
//! typed error inside the `anyhow::Error` chain and recovered with
//! `downcast_ref`.

use super::xml::xml_to_json;
use serde_json::Value;
use thiserror::Error;

/// Error returned by an AWS Query-protocol endpoint
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}: {message} (status {status})")]
pub struct ApiError {
    pub status: u16,
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

impl ApiError {
    /// Decode an EC2 error document
    ///
    /// Format: `<Response><Errors><Error><Code/><Message/></Error></Errors><RequestID/></Response>`.
    /// Bodies that are not an error document still produce an `ApiError` with
    /// an `Unknown` code so the HTTP status is never lost.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = xml_to_json(body).ok();
        let root = parsed
            .as_ref()
            .and_then(|v| v.get("Response").or_else(|| v.get("ErrorResponse")));

        let error = root
            .and_then(|r| r.get("Errors").and_then(|e| e.get("Error")).or_else(|| r.get("Error")))
            .map(|e| match e {
                // Several errors: the first one is the cause
                Value::Array(arr) => arr.first().cloned().unwrap_or(Value::Null),
                other => other.clone(),
            });

        let text = |v: Option<&Value>| v.and_then(|v| v.as_str()).map(|s| s.to_string());

        let code = text(error.as_ref().and_then(|e| e.get("Code")))
            .unwrap_or_else(|| "Unknown".to_string());
        let message = text(error.as_ref().and_then(|e| e.get("Message")))
            .unwrap_or_else(|| format!("request failed with status {}", status));
        let request_id = text(root.and_then(|r| r.get("RequestID").or_else(|| r.get("RequestId"))));

        Self {
            status,
            code,
            message,
            request_id,
        }
    }
}

/// Check whether an error is an [`ApiError`] with one of the given codes
pub fn has_error_code(error: &anyhow::Error, codes: &[String]) -> bool {
    error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<ApiError>())
        .any(|api| codes.iter().any(|c| c == &api.code))
}
