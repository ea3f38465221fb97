//! Effective discount and quantity terms.
//!
//! Each field resolves independently through admin override, then
//! intermediate-reviewer override, then the value on the original request.
//! A stage only overrides when its status is `MODIFIED` and it supplies a
//! usable value for that field.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::status::is_modified;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermSource {
    Request,
    Intermediate,
    Admin,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BaseTerms {
    pub order_qty: Option<Decimal>,
    pub discount_type: Option<String>,
    pub discount_value: Option<Decimal>,
}

/// Values proposed by one review stage. Only built for a `MODIFIED` stage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StageOverride {
    pub order_qty: Option<Decimal>,
    pub discount_type: Option<String>,
    pub discount_value: Option<Decimal>,
}

impl StageOverride {
    pub fn when_modified(
        stage_status: Option<&str>,
        order_qty: Option<Decimal>,
        discount_type: Option<&str>,
        discount_value: Option<Decimal>,
    ) -> Option<Self> {
        if !is_modified(stage_status) {
            return None;
        }

        Some(Self {
            order_qty,
            discount_type: discount_type
                .filter(|value| !value.trim().is_empty())
                .map(ToString::to_string),
            discount_value,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveTerms {
    pub order_qty: Option<Decimal>,
    pub order_qty_source: TermSource,
    pub discount_type: Option<String>,
    pub discount_type_source: TermSource,
    pub discount_value: Decimal,
    pub discount_value_source: TermSource,
}

impl EffectiveTerms {
    /// Replaces the discount with an admin modification.
    pub fn with_admin_discount(&self, discount_type: &str, discount_value: Decimal) -> Self {
        Self {
            discount_type: Some(discount_type.to_string()),
            discount_type_source: TermSource::Admin,
            discount_value,
            discount_value_source: TermSource::Admin,
            ..self.clone()
        }
    }
}

pub fn reconcile(
    base: &BaseTerms,
    intermediate: Option<&StageOverride>,
    admin: Option<&StageOverride>,
) -> EffectiveTerms {
    let (order_qty, order_qty_source) = pick(
        admin.and_then(|stage| stage.order_qty),
        intermediate.and_then(|stage| stage.order_qty),
        base.order_qty,
    );
    let (discount_type, discount_type_source) = pick(
        admin.and_then(|stage| stage.discount_type.clone()),
        intermediate.and_then(|stage| stage.discount_type.clone()),
        base.discount_type.clone(),
    );
    let (discount_value, discount_value_source) = pick(
        admin.and_then(|stage| stage.discount_value),
        intermediate.and_then(|stage| stage.discount_value),
        base.discount_value,
    );

    EffectiveTerms {
        order_qty,
        order_qty_source,
        discount_type,
        discount_type_source,
        discount_value: discount_value.unwrap_or(Decimal::ZERO),
        discount_value_source,
    }
}

fn pick<T>(admin: Option<T>, intermediate: Option<T>, base: Option<T>) -> (Option<T>, TermSource) {
    match (admin, intermediate) {
        (Some(value), _) => (Some(value), TermSource::Admin),
        (None, Some(value)) => (Some(value), TermSource::Intermediate),
        (None, None) => (base, TermSource::Request),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{reconcile, BaseTerms, StageOverride, TermSource};

    fn base() -> BaseTerms {
        BaseTerms {
            order_qty: Some(Decimal::from(40)),
            discount_type: Some("Re 1 per kg".to_string()),
            discount_value: Some(Decimal::from(50)),
        }
    }

    fn stage(status: &str, value: Option<i64>) -> Option<StageOverride> {
        StageOverride::when_modified(Some(status), None, None, value.map(Decimal::from))
    }

    #[test]
    fn admin_then_intermediate_then_request() {
        let intermediate = stage("MODIFIED", Some(75));
        let admin = stage("MODIFIED", Some(90));

        let all = reconcile(&base(), intermediate.as_ref(), admin.as_ref());
        assert_eq!(all.discount_value, Decimal::from(90));
        assert_eq!(all.discount_value_source, TermSource::Admin);

        let not_modified = stage("ACCEPTED", Some(90));
        let without_admin = reconcile(&base(), intermediate.as_ref(), not_modified.as_ref());
        assert_eq!(without_admin.discount_value, Decimal::from(75));
        assert_eq!(without_admin.discount_value_source, TermSource::Intermediate);

        let neither = reconcile(&base(), None, None);
        assert_eq!(neither.discount_value, Decimal::from(50));
        assert_eq!(neither.discount_value_source, TermSource::Request);
    }

    #[test]
    fn fields_resolve_independently() {
        let intermediate = StageOverride::when_modified(
            Some("modified"),
            Some(Decimal::from(30)),
            Some("Rs 0.75 per kg"),
            None,
        );
        let admin =
            StageOverride::when_modified(Some("MODIFIED"), None, None, Some(Decimal::from(12)));

        let terms = reconcile(&base(), intermediate.as_ref(), admin.as_ref());

        assert_eq!(terms.order_qty, Some(Decimal::from(30)));
        assert_eq!(terms.order_qty_source, TermSource::Intermediate);
        assert_eq!(terms.discount_type.as_deref(), Some("Rs 0.75 per kg"));
        assert_eq!(terms.discount_type_source, TermSource::Intermediate);
        assert_eq!(terms.discount_value, Decimal::from(12));
        assert_eq!(terms.discount_value_source, TermSource::Admin);
    }

    #[test]
    fn blank_discount_type_is_not_an_override() {
        let admin = StageOverride::when_modified(Some("MODIFIED"), None, Some("  "), None);
        let terms = reconcile(&base(), None, admin.as_ref());

        assert_eq!(terms.discount_type.as_deref(), Some("Re 1 per kg"));
        assert_eq!(terms.discount_type_source, TermSource::Request);
    }

    #[test]
    fn missing_discount_value_defaults_to_zero() {
        let terms = reconcile(&BaseTerms::default(), None, None);
        assert_eq!(terms.discount_value, Decimal::ZERO);
        assert_eq!(terms.order_qty, None);
    }

    #[test]
    fn non_modified_stage_produces_no_override() {
        assert!(StageOverride::when_modified(Some("APPROVED"), None, None, None).is_none());
        assert!(StageOverride::when_modified(None, None, None, None).is_none());
    }
}
