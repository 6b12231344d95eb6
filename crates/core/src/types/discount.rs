//! Discount codes.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::{DiscountId, ProductId};
use super::price::{CurrencyCode, Price};
use super::status::{DiscountScope, DiscountStatus, DiscountType, ProductCondition};

/// A named, coded price-reduction rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub id: DiscountId,
    pub name: String,
    pub code: String,
    pub discount_type: DiscountType,
    /// Percentage (10 = 10%) or flat amount, depending on `discount_type`.
    pub amount: Decimal,
    /// Products the cart must contain. Empty means any product qualifies.
    pub product_reqs: Vec<ProductId>,
    pub excluded_products: Vec<ProductId>,
    pub product_condition: ProductCondition,
    pub scope: DiscountScope,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    /// `None` means unlimited.
    pub max_uses: Option<i32>,
    pub use_count: i32,
    pub min_cart_price: Option<Decimal>,
    pub status: DiscountStatus,
    pub once_per_customer: bool,
}

impl Discount {
    /// Whether the discount is usable with any product.
    #[must_use]
    pub fn applies_to_any_product(&self) -> bool {
        self.product_reqs.is_empty()
    }

    /// Human-readable amount: `10%` for percentages, `$10.00` for flat amounts.
    #[must_use]
    pub fn display_amount(&self, currency: CurrencyCode) -> String {
        match self.discount_type {
            DiscountType::Percent => format!("{}%", self.amount.normalize()),
            DiscountType::Flat => Price::new(self.amount, currency).display(),
        }
    }

    /// Usage summary such as `3 uses` or `3/10 uses`.
    #[must_use]
    pub fn usage_label(&self) -> String {
        self.max_uses.map_or_else(
            || format!("{} uses", self.use_count),
            |max| format!("{}/{} uses", self.use_count, max),
        )
    }

    /// Whether the usage limit has been reached.
    #[must_use]
    pub fn is_maxed_out(&self) -> bool {
        self.max_uses.is_some_and(|max| self.use_count >= max)
    }
}

/// Reasons a discount code is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscountCodeError {
    #[error("code is required")]
    Empty,
    #[error("code may only contain letters, numbers, dashes and underscores")]
    InvalidCharacter,
}

/// Check that a code is non-empty and only uses `[A-Za-z0-9_-]`.
///
/// # Errors
///
/// Returns a `DiscountCodeError` describing the first problem found.
pub fn validate_discount_code(code: &str) -> Result<(), DiscountCodeError> {
    if code.is_empty() {
        return Err(DiscountCodeError::Empty);
    }
    if code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(())
    } else {
        Err(DiscountCodeError::InvalidCharacter)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::discount;
    use super::*;

    #[test]
    fn test_display_amount_percent() {
        let d = discount(DiscountType::Percent, Decimal::new(1000, 2));
        assert_eq!(d.display_amount(CurrencyCode::USD), "10%");

        let d = discount(DiscountType::Percent, Decimal::new(125, 1));
        assert_eq!(d.display_amount(CurrencyCode::USD), "12.5%");
    }

    #[test]
    fn test_display_amount_flat_uses_currency() {
        let d = discount(DiscountType::Flat, Decimal::new(5, 0));
        assert_eq!(d.display_amount(CurrencyCode::USD), "$5.00");
        assert_eq!(d.display_amount(CurrencyCode::EUR), "€5.00");
    }

    #[test]
    fn test_empty_requirements_apply_to_any_product() {
        let mut d = discount(DiscountType::Flat, Decimal::ONE);
        assert!(d.applies_to_any_product());

        d.product_reqs.push(ProductId::new(3));
        assert!(!d.applies_to_any_product());
    }

    #[test]
    fn test_usage_label_and_limit() {
        let mut d = discount(DiscountType::Flat, Decimal::ONE);
        d.use_count = 3;
        assert_eq!(d.usage_label(), "3 uses");
        assert!(!d.is_maxed_out());

        d.max_uses = Some(3);
        assert_eq!(d.usage_label(), "3/3 uses");
        assert!(d.is_maxed_out());
    }

    #[test]
    fn test_validate_discount_code() {
        assert_eq!(validate_discount_code("10PERCENT"), Ok(()));
        assert_eq!(validate_discount_code("spring_sale-2026"), Ok(()));
        assert_eq!(validate_discount_code(""), Err(DiscountCodeError::Empty));
        assert_eq!(
            validate_discount_code("TEN OFF"),
            Err(DiscountCodeError::InvalidCharacter)
        );
        assert_eq!(
            validate_discount_code("ÉTÉ"),
            Err(DiscountCodeError::InvalidCharacter)
        );
    }
}
