use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Unified lifecycle status shown for a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
    Escalated,
    Accepted,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Escalated => "escalated",
            Self::Accepted => "accepted",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "escalated" => Ok(Self::Escalated),
            "accepted" => Ok(Self::Accepted),
            other => Err(DomainError::InvalidInput(format!(
                "unknown status `{other}` (expected pending|approved|rejected|escalated|accepted)"
            ))),
        }
    }
}

/// Status an admin can record against a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminDecision {
    Accepted,
    Rejected,
    Modified,
}

impl AdminDecision {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::Modified => "MODIFIED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            "modified" => Some(Self::Modified),
            _ => None,
        }
    }

    /// A modification is shown as an acceptance.
    pub fn review_status(&self) -> ReviewStatus {
        match self {
            Self::Accepted | Self::Modified => ReviewStatus::Accepted,
            Self::Rejected => ReviewStatus::Rejected,
        }
    }
}

pub fn is_modified(stage_status: Option<&str>) -> bool {
    stage_status.is_some_and(|status| status.trim().eq_ignore_ascii_case("modified"))
}

/// Resolves the displayed status. Any admin status wins over the intermediate
/// reviewer's; both are compared case-insensitively.
pub fn resolve_status(intermediate_status: &str, admin_status: Option<&str>) -> ReviewStatus {
    if let Some(admin_status) = admin_status {
        return match AdminDecision::parse(admin_status) {
            Some(decision) => decision.review_status(),
            None => ReviewStatus::Pending,
        };
    }

    match intermediate_status.trim().to_ascii_lowercase().as_str() {
        "approved" | "modified" => ReviewStatus::Approved,
        "rejected" => ReviewStatus::Rejected,
        "escalated" => ReviewStatus::Escalated,
        "accepted" => ReviewStatus::Accepted,
        _ => ReviewStatus::Pending,
    }
}
