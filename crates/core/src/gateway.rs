//! Seams to the workflow backend's two HTTP endpoints.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::clock::ActionStamp;
use crate::domain::action::AdminAction;
use crate::domain::status::AdminDecision;
use crate::domain::view::RequestId;
use crate::errors::DomainError;

const DEFAULT_REJECTION_MESSAGE: &str = "the review backend did not accept the decision";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("review backend rejected the call: {message}")]
    Rejected { message: String },
    #[error("review backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("review backend response was malformed: {0}")]
    Malformed(String),
    #[error("review backend is unreachable: {0}")]
    Network(String),
}

impl GatewayError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Text for the operator notification. Backend refusals and connectivity
    /// problems read differently so the admin knows whether retrying helps.
    pub fn notice(&self) -> String {
        match self {
            Self::Rejected { message } => {
                format!("The review backend rejected the action: {message}")
            }
            Self::Status { status, .. } => {
                format!("The review backend rejected the action with HTTP status {status}.")
            }
            Self::Malformed(_) => {
                "The review backend sent a response that could not be understood.".to_string()
            }
            Self::Network(_) => {
                "Could not reach the review backend. Check connectivity and retry.".to_string()
            }
        }
    }
}

#[async_trait]
pub trait RequestFeed: Send + Sync {
    /// Raw JSON body of the fetch endpoint; shape handling lives in
    /// [`crate::feed::normalize_feed`].
    async fn fetch(&self, username: &str) -> Result<Value, GatewayError>;
}

#[async_trait]
pub trait DecisionGateway: Send + Sync {
    async fn submit(&self, payload: &DecisionPayload) -> Result<DecisionAck, GatewayError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FetchPayload {
    pub username: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DecisionPayload {
    #[serde(rename = "RequestId")]
    pub request_id: String,
    #[serde(rename = "AdminUsername")]
    pub admin_username: String,
    #[serde(rename = "AdminReviewedAt")]
    pub admin_reviewed_at: String,
    #[serde(rename = "AdminStatus")]
    pub admin_status: AdminDecision,
    #[serde(rename = "adminRemarks", skip_serializing_if = "Option::is_none")]
    pub admin_remarks: Option<String>,
    #[serde(rename = "adminDiscountType", skip_serializing_if = "Option::is_none")]
    pub admin_discount_type: Option<String>,
    #[serde(
        rename = "adminDiscountValue",
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub admin_discount_value: Option<Decimal>,
}

impl DecisionPayload {
    pub fn new(
        request_id: &RequestId,
        admin_username: &str,
        stamp: &ActionStamp,
        action: &AdminAction,
    ) -> Result<Self, DomainError> {
        let numeric = request_id.numeric().ok_or_else(|| {
            DomainError::InvalidInput(format!("request id `{request_id}` is not numeric"))
        })?;

        let (admin_remarks, admin_discount_type, admin_discount_value) = match action {
            AdminAction::Approve => (None, None, None),
            AdminAction::Reject { reason } => (Some(reason.clone()), None, None),
            AdminAction::Modify { discount_type, discount_value } => {
                (None, Some(discount_type.clone()), Some(*discount_value))
            }
        };

        Ok(Self {
            request_id: numeric.to_string(),
            admin_username: admin_username.to_string(),
            admin_reviewed_at: stamp.reviewed_at.clone(),
            admin_status: action.decision(),
            admin_remarks,
            admin_discount_type,
            admin_discount_value,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecisionAck {
    pub message: Option<String>,
}

/// Classifies a decision endpoint response. Non-2xx statuses and bodies with
/// `success: false` are failures; anything else, including a non-JSON body,
/// counts as success.
pub fn interpret_decision_response(status: u16, body: &str) -> Result<DecisionAck, GatewayError> {
    if !(200..300).contains(&status) {
        return Err(GatewayError::Status { status, body: truncate(body, 512) });
    }

    let Ok(parsed) = serde_json::from_str::<Value>(body) else {
        return Ok(DecisionAck::default());
    };

    // Some webhook deployments wrap the body in a one-element array.
    let object = match &parsed {
        Value::Array(items) if items.len() == 1 => &items[0],
        other => other,
    };
    let message = ["message", "errorMessage"]
        .into_iter()
        .find_map(|key| object.get(key).and_then(Value::as_str))
        .map(ToString::to_string);

    if object.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(GatewayError::Rejected {
            message: message.unwrap_or_else(|| DEFAULT_REJECTION_MESSAGE.to_string()),
        });
    }

    Ok(DecisionAck { message })
}

fn truncate(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
