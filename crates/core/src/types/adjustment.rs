//! Order adjustments staged while an order is being edited.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::{DiscountId, OrderId};

/// Identifier of an order adjustment.
///
/// Generated client-side of the database (UUID v4), so an adjustment has a
/// stable identity before it is ever persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdjustmentId(Uuid);

impl AdjustmentId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for AdjustmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Kind of order adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    #[default]
    Discount,
}

impl AdjustmentKind {
    /// Database representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Discount => "discount",
        }
    }
}

impl std::str::FromStr for AdjustmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discount" => Ok(Self::Discount),
            _ => Err(format!("invalid adjustment kind: {s}")),
        }
    }
}

/// A modifier attached to an order during admin editing.
///
/// For the discount variant, `type_id` references the applied discount and
/// `description` carries its code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAdjustment {
    pub id: AdjustmentId,
    pub order_id: OrderId,
    pub kind: AdjustmentKind,
    pub type_id: Option<DiscountId>,
    pub description: String,
}

impl OrderAdjustment {
    /// A blank discount adjustment with a freshly generated identifier.
    #[must_use]
    pub fn new_discount(order_id: OrderId) -> Self {
        Self {
            id: AdjustmentId::generate(),
            order_id,
            kind: AdjustmentKind::Discount,
            type_id: None,
            description: String::new(),
        }
    }

    /// Reset the user-editable fields to their defaults, keeping identity.
    ///
    /// Returns `true` if anything changed.
    pub fn reset(&mut self) -> bool {
        self.set_discount(None, String::new())
    }

    /// Point the adjustment at a discount.
    ///
    /// Returns `true` if anything changed.
    pub fn set_discount(&mut self, type_id: Option<DiscountId>, description: String) -> bool {
        if self.type_id == type_id && self.description == description {
            return false;
        }
        self.type_id = type_id;
        self.description = description;
        true
    }

    /// Whether the user-editable fields are at their defaults.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.type_id.is_none() && self.description.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_discount_is_blank_with_fresh_id() {
        let a = OrderAdjustment::new_discount(OrderId::new(1));
        let b = OrderAdjustment::new_discount(OrderId::new(1));

        assert!(a.is_blank());
        assert_eq!(a.kind, AdjustmentKind::Discount);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_set_discount_reports_changes() {
        let mut adj = OrderAdjustment::new_discount(OrderId::new(1));

        assert!(adj.set_discount(Some(DiscountId::new(4)), "SAVE5".to_string()));
        assert!(!adj.set_discount(Some(DiscountId::new(4)), "SAVE5".to_string()));
        assert!(adj.reset());
        assert!(!adj.reset());
        assert!(adj.is_blank());
    }
}
