//! Normalization of the fetch endpoint's response.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::upstream::UpstreamRequest;
use crate::domain::view::{RequestId, RequestViewModel};
use crate::gateway::{GatewayError, RequestFeed};
use crate::session::Session;

pub const DEFAULT_FETCH_ERROR: &str = "Failed to fetch approval requests";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("fetch rejected by review backend: {message}")]
    Rejected { message: String, code: Option<String>, error_code: Option<String> },
    #[error("fetch response carries no request list: {message}")]
    MissingData { message: String },
    #[error("fetch response has an unrecognised shape ({0})")]
    MalformedShape(&'static str),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl FeedError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Gateway(error) if error.is_connectivity())
    }

    /// Every fetch failure leaves the console empty with a manual reload.
    pub fn notice(&self) -> String {
        match self {
            Self::Rejected { message, .. } | Self::MissingData { message } => {
                format!("{message}. Reload to try again.")
            }
            Self::MalformedShape(_) => format!("{DEFAULT_FETCH_ERROR}. Reload to try again."),
            Self::Gateway(error) if error.is_connectivity() => {
                "Could not reach the review backend. Check connectivity and reload.".to_string()
            }
            Self::Gateway(error) => format!("{DEFAULT_FETCH_ERROR}: {error}. Reload to try again."),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedSnapshot {
    /// Correlation id assigned by the backend, when it sends one.
    pub request_id: Option<String>,
    pub requests: Vec<RequestViewModel>,
    pub skipped: Vec<SkippedRecord>,
}

/// Accepts a bare envelope object, a one-element array wrapping one, or a raw
/// array of records. Pure: the same input always yields the same snapshot.
pub fn normalize_feed(raw: &Value) -> Result<FeedSnapshot, FeedError> {
    let envelope = match raw {
        Value::Object(_) => raw,
        Value::Array(items) => match items.as_slice() {
            [single] if is_envelope(single) => single,
            _ => return Ok(build_snapshot(None, items)),
        },
        Value::Null => return Err(FeedError::MalformedShape("null")),
        Value::Bool(_) => return Err(FeedError::MalformedShape("boolean")),
        Value::Number(_) => return Err(FeedError::MalformedShape("number")),
        Value::String(_) => return Err(FeedError::MalformedShape("string")),
    };

    let message = envelope
        .get("errorMessage")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(ToString::to_string);

    if envelope.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(FeedError::Rejected {
            message: message.unwrap_or_else(|| DEFAULT_FETCH_ERROR.to_string()),
            code: scalar(envelope.get("code")),
            error_code: scalar(envelope.get("errorCode")),
        });
    }

    let Some(Value::Array(records)) = envelope.get("data") else {
        return Err(FeedError::MissingData {
            message: message.unwrap_or_else(|| DEFAULT_FETCH_ERROR.to_string()),
        });
    };

    Ok(build_snapshot(scalar(envelope.get("requestId")), records))
}

/// Fetches and normalizes one snapshot for the logged-in admin.
pub async fn load_snapshot<F>(feed: &F, session: &Session) -> Result<FeedSnapshot, FeedError>
where
    F: RequestFeed + ?Sized,
{
    let raw = feed.fetch(session.username()).await?;
    let snapshot = normalize_feed(&raw)?;

    for skipped in &snapshot.skipped {
        warn!(
            event_name = "feed.record.skipped",
            correlation_id = snapshot.request_id.as_deref().unwrap_or("unknown"),
            record_index = skipped.index,
            reason = %skipped.reason,
            "skipped malformed upstream record"
        );
    }
    info!(
        event_name = "feed.loaded",
        correlation_id = snapshot.request_id.as_deref().unwrap_or("unknown"),
        request_count = snapshot.requests.len(),
        skipped_count = snapshot.skipped.len(),
        "approval requests loaded"
    );

    Ok(snapshot)
}

fn is_envelope(value: &Value) -> bool {
    value.get("data").is_some() || value.get("success").is_some()
}

fn build_snapshot(request_id: Option<String>, records: &[Value]) -> FeedSnapshot {
    let mut seen = HashSet::new();
    let mut requests = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let upstream = match UpstreamRequest::deserialize(record) {
            Ok(upstream) => upstream,
            Err(error) => {
                skipped.push(SkippedRecord { index, reason: error.to_string() });
                continue;
            }
        };

        if !seen.insert(RequestId::from_number(upstream.request_id)) {
            skipped.push(SkippedRecord {
                index,
                reason: format!("duplicate request id {}", upstream.request_id),
            });
            continue;
        }

        requests.push(RequestViewModel::from_upstream(&upstream));
    }

    FeedSnapshot { request_id, requests, skipped }
}

fn scalar(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
