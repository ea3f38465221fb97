//! Records exactly as the workflow backend sends them.
//!
//! All schema quirks live here: nullable fields, numbers sent as strings,
//! eligibility flags sent as `0`/`1`, and the handful of renamed fields seen
//! across backend revisions.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::terms::{BaseTerms, StageOverride};

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamRequest {
    #[serde(alias = "RequestId", deserialize_with = "de::request_number")]
    pub request_id: i64,
    #[serde(default, deserialize_with = "de::text")]
    pub created_at: Option<String>,

    #[serde(default, deserialize_with = "de::text")]
    pub customer_id: Option<String>,
    #[serde(default, deserialize_with = "de::text")]
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "de::text")]
    pub customer_mobile: Option<String>,
    #[serde(default, deserialize_with = "de::text")]
    pub customer_type_name: Option<String>,

    #[serde(default, deserialize_with = "de::text")]
    pub campaign_type: Option<String>,
    #[serde(default, deserialize_with = "de::text")]
    pub discount_type: Option<String>,
    #[serde(default, deserialize_with = "de::decimal")]
    pub discount_value: Option<Decimal>,
    #[serde(default, alias = "orderQuantity", deserialize_with = "de::decimal")]
    pub order_qty: Option<Decimal>,

    #[serde(default, deserialize_with = "de::text")]
    pub sku_id: Option<String>,
    #[serde(default, deserialize_with = "de::text")]
    pub sku_name: Option<String>,
    #[serde(default, deserialize_with = "de::text")]
    pub order_mode: Option<String>,
    #[serde(default, alias = "shopImage", deserialize_with = "de::text")]
    pub shop_image_url: Option<String>,

    #[serde(default, alias = "eligible", deserialize_with = "de::flag")]
    pub is_eligible: Option<bool>,
    #[serde(default, alias = "ineligibilityReason", deserialize_with = "de::text")]
    pub eligibility_reason: Option<String>,

    #[serde(default, deserialize_with = "de::text")]
    pub abm_status: Option<String>,
    #[serde(default, alias = "abmUsername", deserialize_with = "de::text")]
    pub abm_id: Option<String>,
    #[serde(default, deserialize_with = "de::text")]
    pub abm_name: Option<String>,
    #[serde(default, deserialize_with = "de::text")]
    pub abm_mobile: Option<String>,
    #[serde(default, deserialize_with = "de::text")]
    pub abm_remarks: Option<String>,
    #[serde(default, deserialize_with = "de::decimal")]
    pub abm_order_qty: Option<Decimal>,
    #[serde(default, deserialize_with = "de::text")]
    pub abm_discount_type: Option<String>,
    #[serde(default, deserialize_with = "de::decimal")]
    pub abm_discount_value: Option<Decimal>,
    #[serde(default, deserialize_with = "de::text")]
    pub abm_reviewed_at: Option<String>,

    #[serde(default, deserialize_with = "de::text")]
    pub admin_status: Option<String>,
    #[serde(default, alias = "adminUsername", deserialize_with = "de::text")]
    pub admin_id: Option<String>,
    #[serde(default, deserialize_with = "de::text")]
    pub admin_reviewed_at: Option<String>,
    #[serde(default, deserialize_with = "de::text")]
    pub admin_remarks: Option<String>,
    #[serde(default, deserialize_with = "de::text")]
    pub admin_discount_type: Option<String>,
    #[serde(default, deserialize_with = "de::decimal")]
    pub admin_discount_value: Option<Decimal>,
}

impl UpstreamRequest {
    pub fn intermediate_status(&self) -> &str {
        self.abm_status.as_deref().map(str::trim).unwrap_or_default()
    }

    /// `None` until an admin has acted. Blank strings count as no action.
    pub fn admin_status(&self) -> Option<&str> {
        self.admin_status.as_deref().map(str::trim).filter(|status| !status.is_empty())
    }

    /// Requests are eligible unless the backend explicitly says otherwise.
    pub fn is_eligible(&self) -> bool {
        self.is_eligible.unwrap_or(true)
    }

    pub fn base_terms(&self) -> BaseTerms {
        BaseTerms {
            order_qty: self.order_qty,
            discount_type: self.discount_type.clone(),
            discount_value: self.discount_value,
        }
    }

    pub fn intermediate_override(&self) -> Option<StageOverride> {
        StageOverride::when_modified(
            self.abm_status.as_deref(),
            self.abm_order_qty,
            self.abm_discount_type.as_deref(),
            self.abm_discount_value,
        )
    }

    /// Admins never change the order quantity.
    pub fn admin_override(&self) -> Option<StageOverride> {
        StageOverride::when_modified(
            self.admin_status.as_deref(),
            None,
            self.admin_discount_type.as_deref(),
            self.admin_discount_value,
        )
    }
}

mod de {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use serde::{de::Error, Deserialize, Deserializer};
    use serde_json::Value;

    pub fn request_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(number) => number.as_i64().ok_or_else(|| {
                D::Error::custom(format!("request id `{number}` is not an integer"))
            }),
            Value::String(raw) => {
                let trimmed = raw.trim();
                let digits = trimmed
                    .get(..4)
                    .filter(|prefix| prefix.eq_ignore_ascii_case("REQ-"))
                    .map_or(trimmed, |_| &trimmed[4..]);
                digits
                    .parse::<i64>()
                    .map_err(|_| D::Error::custom(format!("request id `{raw}` is not numeric")))
            }
            other => Err(D::Error::custom(format!("request id has unsupported type: {other}"))),
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(value)) => Some(value),
            Some(Value::Number(value)) => Some(value.to_string()),
            Some(Value::Bool(value)) => Some(value.to_string()),
            _ => None,
        })
    }

    pub fn decimal<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Decimal>, D::Error> {
        let raw = match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(value)) => value.to_string(),
            Some(Value::String(value)) if value.trim().is_empty() => return Ok(None),
            Some(Value::String(value)) => value.trim().to_string(),
            Some(Value::Null) | None => return Ok(None),
            Some(other) => {
                return Err(D::Error::custom(format!("expected a number, found {other}")))
            }
        };

        Decimal::from_str(&raw)
            .or_else(|_| Decimal::from_scientific(&raw))
            .map(Some)
            .map_err(|_| D::Error::custom(format!("`{raw}` is not a decimal number")))
    }

    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Bool(value)) => Some(value),
            Some(Value::Number(value)) => value.as_f64().map(|number| number != 0.0),
            Some(Value::String(value)) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "y" => Some(true),
                "0" | "false" | "no" | "n" => Some(false),
                _ => None,
            },
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::UpstreamRequest;

    #[test]
    fn decodes_full_record() {
        let record: UpstreamRequest = serde_json::from_value(json!({
            "requestId": 1042,
            "createdAt": "2025-08-07T07:07:13.000+0000",
            "customerId": 88231,
            "customerName": "Sharma Traders",
            "campaignType": "Monsoon Offer",
            "discountType": "Re 1 per kg",
            "discountValue": "40.5",
            "orderQty": 40,
            "isEligible": 0,
            "eligibilityReason": "Order below slab",
            "abmStatus": "MODIFIED",
            "abmDiscountValue": 30,
            "adminStatus": null
        }))
        .expect("decode");

        assert_eq!(record.request_id, 1042);
        assert_eq!(record.customer_id.as_deref(), Some("88231"));
        assert_eq!(record.discount_value, Some(Decimal::new(405, 1)));
        assert!(!record.is_eligible());
        assert_eq!(record.admin_status(), None);
        assert_eq!(
            record.intermediate_override().and_then(|stage| stage.discount_value),
            Some(Decimal::from(30))
        );
    }

    #[test]
    fn accepts_field_name_variants() {
        let record: UpstreamRequest = serde_json::from_value(json!({
            "RequestId": "REQ-77",
            "eligible": true,
            "adminUsername": "ops.admin",
            "orderQuantity": "12.5"
        }))
        .expect("decode");

        assert_eq!(record.request_id, 77);
        assert!(record.is_eligible());
        assert_eq!(record.admin_id.as_deref(), Some("ops.admin"));
        assert_eq!(record.order_qty, Some(Decimal::new(125, 1)));
    }

    #[test]
    fn blank_admin_status_means_no_admin_action() {
        let record: UpstreamRequest =
            serde_json::from_value(json!({ "requestId": 1, "adminStatus": "  " })).expect("decode");
        assert_eq!(record.admin_status(), None);
        assert!(record.is_eligible(), "missing flag defaults to eligible");
    }

    #[test]
    fn rejects_record_without_request_id() {
        let result = serde_json::from_value::<UpstreamRequest>(json!({ "customerName": "x" }));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_garbage_numeric_fields() {
        let result = serde_json::from_value::<UpstreamRequest>(
            json!({ "requestId": 5, "discountValue": "lots" }),
        );
        assert!(result.is_err());
    }
}
