use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::status::AdminDecision;
use crate::domain::terms::EffectiveTerms;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdminAction {
    Approve,
    Reject { reason: String },
    Modify { discount_type: String, discount_value: Decimal },
}

impl AdminAction {
    pub fn reject(reason: &str) -> Result<Self, DomainError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::InvalidInput("a rejection reason is required".to_string()));
        }
        Ok(Self::Reject { reason: reason.to_string() })
    }

    pub fn modify(discount_type: &str, discount_value: Decimal) -> Result<Self, DomainError> {
        let discount_type = discount_type.trim();
        if discount_type.is_empty() {
            return Err(DomainError::InvalidInput("a discount type is required".to_string()));
        }
        if discount_value.is_sign_negative() {
            return Err(DomainError::InvalidInput(format!(
                "discount value must not be negative (got {discount_value})"
            )));
        }
        Ok(Self::Modify { discount_type: discount_type.to_string(), discount_value })
    }

    pub fn decision(&self) -> AdminDecision {
        match self {
            Self::Approve => AdminDecision::Accepted,
            Self::Reject { .. } => AdminDecision::Rejected,
            Self::Modify { .. } => AdminDecision::Modified,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject { .. } => "reject",
            Self::Modify { .. } => "modify",
        }
    }
}

/// Discount schemes offered when an admin modifies a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscountScheme {
    RupeePerKg,
    ThreeQuarterRupeePerKg,
    Custom,
}

impl DiscountScheme {
    pub const ALL: [Self; 3] = [Self::RupeePerKg, Self::ThreeQuarterRupeePerKg, Self::Custom];

    pub fn label(&self) -> &'static str {
        match self {
            Self::RupeePerKg => "Re 1 per kg",
            Self::ThreeQuarterRupeePerKg => "Rs 0.75 per kg",
            Self::Custom => "Custom",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim();
        Self::ALL.into_iter().find(|scheme| scheme.label().eq_ignore_ascii_case(normalized))
    }

    fn rate_per_kg(&self) -> Option<Decimal> {
        match self {
            Self::RupeePerKg => Some(Decimal::ONE),
            Self::ThreeQuarterRupeePerKg => Some(Decimal::new(75, 2)),
            Self::Custom => None,
        }
    }
}

/// A discount change an admin is about to submit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModifyProposal {
    pub scheme: DiscountScheme,
    pub discount_value: Decimal,
}

impl ModifyProposal {
    /// Per-kg schemes derive the value from the effective order quantity;
    /// `Custom` takes the admin's value. Proposals that change nothing are
    /// refused.
    pub fn resolve(
        current: &EffectiveTerms,
        scheme_label: &str,
        custom_value: Option<Decimal>,
    ) -> Result<Self, DomainError> {
        let scheme = DiscountScheme::from_label(scheme_label).ok_or_else(|| {
            DomainError::InvalidInput(format!(
                "unknown discount type `{}` (expected one of: {})",
                scheme_label.trim(),
                DiscountScheme::ALL.map(|scheme| scheme.label()).join(", ")
            ))
        })?;

        let discount_value = match scheme.rate_per_kg() {
            Some(rate) => {
                let order_qty = current.order_qty.ok_or_else(|| {
                    DomainError::InvalidInput(format!(
                        "`{}` needs an order quantity and the request has none",
                        scheme.label()
                    ))
                })?;
                order_qty * rate
            }
            None => custom_value.ok_or_else(|| {
                DomainError::InvalidInput("a custom discount needs a discount value".to_string())
            })?,
        };

        let type_changed = current.discount_type.as_deref() != Some(scheme.label());
        let value_changed =
            scheme == DiscountScheme::Custom && discount_value != current.discount_value;
        if !type_changed && !value_changed {
            return Err(DomainError::InvalidInput(
                "the proposed discount is identical to the current one".to_string(),
            ));
        }

        Ok(Self { scheme, discount_value })
    }

    pub fn into_action(self) -> Result<AdminAction, DomainError> {
        AdminAction::modify(self.scheme.label(), self.discount_value)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{AdminAction, DiscountScheme, ModifyProposal};
    use crate::domain::status::AdminDecision;
    use crate::domain::terms::{reconcile, BaseTerms};

    fn current(discount_type: &str, value: i64, qty: i64) -> crate::domain::terms::EffectiveTerms {
        reconcile(
            &BaseTerms {
                order_qty: Some(Decimal::from(qty)),
                discount_type: Some(discount_type.to_string()),
                discount_value: Some(Decimal::from(value)),
            },
            None,
            None,
        )
    }

    #[test]
    fn per_kg_schemes_derive_value_from_quantity() {
        let proposal = ModifyProposal::resolve(&current("Custom", 10, 40), "Rs 0.75 per kg", None)
            .expect("proposal");

        assert_eq!(proposal.scheme, DiscountScheme::ThreeQuarterRupeePerKg);
        assert_eq!(proposal.discount_value, Decimal::from(30));
    }

    #[test]
    fn custom_scheme_requires_a_value() {
        let error = ModifyProposal::resolve(&current("Re 1 per kg", 40, 40), "custom", None)
            .expect_err("missing value");
        assert!(error.to_string().contains("custom discount"));
    }

    #[test]
    fn unchanged_proposal_is_refused() {
        let same_scheme =
            ModifyProposal::resolve(&current("Re 1 per kg", 40, 40), "Re 1 per kg", None);
        assert!(same_scheme.is_err());

        let same_custom =
            ModifyProposal::resolve(&current("Custom", 25, 40), "Custom", Some(Decimal::from(25)));
        assert!(same_custom.is_err());

        let new_custom =
            ModifyProposal::resolve(&current("Custom", 25, 40), "Custom", Some(Decimal::from(20)))
                .expect("changed value");
        assert_eq!(new_custom.discount_value, Decimal::from(20));
    }

    #[test]
    fn unknown_scheme_lists_the_options() {
        let error = ModifyProposal::resolve(&current("Custom", 1, 1), "Half off", None)
            .expect_err("unknown");
        assert!(error.to_string().contains("Rs 0.75 per kg"));
    }

    #[test]
    fn action_constructors_validate_input() {
        assert!(AdminAction::reject("   ").is_err());
        assert!(AdminAction::modify("", Decimal::ONE).is_err());
        assert!(AdminAction::modify("Custom", Decimal::from(-1)).is_err());

        let action = AdminAction::reject(" price too low ").expect("reject");
        assert_eq!(action, AdminAction::Reject { reason: "price too low".to_string() });
        assert_eq!(action.decision(), AdminDecision::Rejected);
    }
}
