//! The denormalized request record consumed by the console.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::action::AdminAction;
use crate::domain::status::{resolve_status, AdminDecision, ReviewStatus};
use crate::domain::tat::Turnaround;
use crate::domain::terms::{reconcile, EffectiveTerms};
use crate::domain::timestamp::DisplayStamp;
use crate::domain::upstream::UpstreamRequest;
use crate::errors::DomainError;

const UNKNOWN_SKU: &str = "Unknown SKU";
const UNKNOWN_REQUESTER: &str = "Unknown Customer";
const DEFAULT_CAMPAIGN: &str = "Discount Request";
const DISPLAY_ID_PREFIX: &str = "REQ-";

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn from_number(number: i64) -> Self {
        Self(number.to_string())
    }

    /// Accepts `1042` as well as the displayed `REQ-1042` form.
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let trimmed = input.trim();
        let digits = trimmed
            .get(..DISPLAY_ID_PREFIX.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(DISPLAY_ID_PREFIX))
            .map_or(trimmed, |_| &trimmed[DISPLAY_ID_PREFIX.len()..]);

        digits
            .parse::<i64>()
            .map(Self::from_number)
            .map_err(|_| DomainError::InvalidInput(format!("`{input}` is not a request id")))
    }

    pub fn numeric(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    pub fn display_label(&self) -> String {
        format!("{DISPLAY_ID_PREFIX}{}", self.0)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Ineligible requests always need attention; otherwise larger discounts
    /// rank higher.
    pub fn classify(eligible: bool, discount_value: Decimal) -> Self {
        if !eligible || discount_value > Decimal::ONE_HUNDRED {
            Self::High
        } else if discount_value > Decimal::from(50) {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(DomainError::InvalidInput(format!(
                "unknown priority `{other}` (expected low|medium|high)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntermediateReview {
    pub status: Option<String>,
    pub reviewer_id: Option<String>,
    pub reviewer_name: Option<String>,
    pub reviewer_mobile: Option<String>,
    pub remarks: Option<String>,
    pub reviewed_at: Option<String>,
    pub tat: Option<Turnaround>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminReview {
    pub status: Option<String>,
    pub decision: Option<AdminDecision>,
    pub reviewer_id: Option<String>,
    pub reviewed_at: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestViewModel {
    pub id: RequestId,
    pub title: String,
    pub requester: String,
    pub customer_id: Option<String>,
    pub customer_mobile: Option<String>,
    pub customer_type: Option<String>,
    pub campaign_type: Option<String>,
    pub sku_id: Option<String>,
    pub sku_name: Option<String>,
    pub order_mode: Option<String>,
    pub shop_image_url: Option<String>,
    pub created_date: String,
    pub created_time: String,
    created_at_raw: String,
    pub status: ReviewStatus,
    pub priority: Priority,
    pub terms: EffectiveTerms,
    pub eligible: bool,
    pub eligibility_reason: Option<String>,
    pub description: String,
    pub intermediate: IntermediateReview,
    pub admin: AdminReview,
    pub acted_at: Option<String>,
    pub tat: Option<Turnaround>,
}

impl RequestViewModel {
    pub fn from_upstream(record: &UpstreamRequest) -> Self {
        let created_at_raw = record.created_at.clone().unwrap_or_default();
        let created = DisplayStamp::from_raw(&created_at_raw);

        let terms = reconcile(
            &record.base_terms(),
            record.intermediate_override().as_ref(),
            record.admin_override().as_ref(),
        );
        let eligible = record.is_eligible();
        let eligibility_reason = non_blank(record.eligibility_reason.as_deref());
        let admin_status = record.admin_status().map(ToString::to_string);

        let intermediate_reviewed_at = non_blank(record.abm_reviewed_at.as_deref());
        let intermediate_tat = intermediate_reviewed_at
            .as_deref()
            .map(|reviewed_at| Turnaround::between(&created_at_raw, reviewed_at));
        let admin_reviewed_at = non_blank(record.admin_reviewed_at.as_deref());
        let (acted_at, tat) = match (&admin_status, &admin_reviewed_at) {
            (Some(_), Some(reviewed_at)) => (
                Some(reviewed_at.clone()),
                Some(Turnaround::between(&created_at_raw, reviewed_at)),
            ),
            _ => (None, None),
        };

        Self {
            id: RequestId::from_number(record.request_id),
            title: title(record.campaign_type.as_deref(), record.sku_name.as_deref()),
            requester: non_blank(record.customer_name.as_deref())
                .unwrap_or_else(|| UNKNOWN_REQUESTER.to_string()),
            customer_id: record.customer_id.clone(),
            customer_mobile: record.customer_mobile.clone(),
            customer_type: record.customer_type_name.clone(),
            campaign_type: record.campaign_type.clone(),
            sku_id: record.sku_id.clone(),
            sku_name: record.sku_name.clone(),
            order_mode: record.order_mode.clone(),
            shop_image_url: record.shop_image_url.clone(),
            created_date: created.date,
            created_time: created.time,
            status: resolve_status(record.intermediate_status(), record.admin_status()),
            priority: Priority::classify(eligible, terms.discount_value),
            description: describe(&terms, eligible, eligibility_reason.as_deref()),
            terms,
            eligible,
            eligibility_reason,
            intermediate: IntermediateReview {
                status: record.abm_status.clone(),
                reviewer_id: record.abm_id.clone(),
                reviewer_name: record.abm_name.clone(),
                reviewer_mobile: record.abm_mobile.clone(),
                remarks: record.abm_remarks.clone(),
                reviewed_at: intermediate_reviewed_at,
                tat: intermediate_tat,
            },
            admin: AdminReview {
                decision: admin_status.as_deref().and_then(AdminDecision::parse),
                status: admin_status,
                reviewer_id: record.admin_id.clone(),
                reviewed_at: admin_reviewed_at,
                remarks: record.admin_remarks.clone(),
            },
            acted_at,
            tat,
            created_at_raw,
        }
    }

    /// The untouched upstream creation timestamp; the only input used for
    /// turnaround computation.
    pub fn created_at_raw(&self) -> &str {
        &self.created_at_raw
    }

    pub fn has_admin_action(&self) -> bool {
        self.admin.status.is_some()
    }

    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        [
            self.id.0.as_str(),
            self.title.as_str(),
            self.requester.as_str(),
            self.description.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Applies a confirmed admin action. `reviewed_at` is the value sent to the
    /// backend and `acted_at` the ISO form used for turnaround.
    pub(crate) fn record_admin_action(
        &mut self,
        action: &AdminAction,
        admin_username: &str,
        reviewed_at: &str,
        acted_at: &str,
    ) {
        let decision = action.decision();

        if let AdminAction::Modify { discount_type, discount_value } = action {
            self.terms = self.terms.with_admin_discount(discount_type, *discount_value);
            self.priority = Priority::classify(self.eligible, self.terms.discount_value);
            self.description =
                describe(&self.terms, self.eligible, self.eligibility_reason.as_deref());
        }
        if let AdminAction::Reject { reason } = action {
            self.admin.remarks = Some(reason.clone());
        }

        self.status = decision.review_status();
        self.admin.status = Some(decision.as_wire().to_string());
        self.admin.decision = Some(decision);
        self.admin.reviewer_id = Some(admin_username.to_string());
        self.admin.reviewed_at = Some(reviewed_at.to_string());
        self.acted_at = Some(acted_at.to_string());
        self.tat = Some(Turnaround::between(&self.created_at_raw, acted_at));
    }
}

fn title(campaign_type: Option<&str>, sku_name: Option<&str>) -> String {
    let campaign = non_blank(campaign_type).unwrap_or_else(|| DEFAULT_CAMPAIGN.to_string());
    let sku = non_blank(sku_name).unwrap_or_else(|| UNKNOWN_SKU.to_string());
    format!("{campaign} - {sku}")
}

fn describe(terms: &EffectiveTerms, eligible: bool, eligibility_reason: Option<&str>) -> String {
    let discount_type = terms.discount_type.as_deref().unwrap_or("Unspecified");
    let quantity = terms
        .order_qty
        .map(|qty| qty.normalize().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let terms_text = format!(
        "{discount_type} discount of {} on order quantity {quantity}.",
        terms.discount_value.normalize()
    );

    if eligible {
        format!("{terms_text} Eligible for campaign.")
    } else {
        let reason = eligibility_reason.unwrap_or("no reason provided");
        format!("{terms_text} Not eligible: {reason}.")
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|value| !value.is_empty()).map(ToString::to_string)
}
