//! Enumerated discount attributes.
//!
//! Each enum round-trips through the lowercase string stored in the database
//! and posted by the edit form (`percent`, `not_global`, ...).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a discount's amount is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Amount is a percentage of the cart (10 = 10%).
    #[default]
    Percent,
    /// Amount is a fixed value in the store currency.
    Flat,
}

impl DiscountType {
    /// Database/form representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Percent => "percent",
            Self::Flat => "flat",
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percent" => Ok(Self::Percent),
            "flat" => Ok(Self::Flat),
            _ => Err(format!("invalid discount type: {s}")),
        }
    }
}

/// Whether a discount can currently be redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscountStatus {
    #[default]
    Active,
    Inactive,
}

impl DiscountStatus {
    /// Database/form representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for DiscountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(format!("invalid discount status: {s}")),
        }
    }
}

/// How the product requirement list is matched against a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductCondition {
    /// Cart must contain every required product.
    #[default]
    All,
    /// Cart needs at least one of the required products.
    Any,
}

impl ProductCondition {
    /// Database/form representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for ProductCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "any" => Ok(Self::Any),
            _ => Err(format!("invalid product condition: {s}")),
        }
    }
}

/// Which part of the purchase a discount applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiscountScope {
    /// Entire purchase.
    #[default]
    Global,
    /// Only the required products.
    NotGlobal,
}

impl DiscountScope {
    /// Database/form representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::NotGlobal => "not_global",
        }
    }
}

impl fmt::Display for DiscountScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscountScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Self::Global),
            "not_global" => Ok(Self::NotGlobal),
            _ => Err(format!("invalid discount scope: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_forms_round_trip() {
        for ty in [DiscountType::Percent, DiscountType::Flat] {
            assert_eq!(ty.as_str().parse::<DiscountType>(), Ok(ty));
        }
        for scope in [DiscountScope::Global, DiscountScope::NotGlobal] {
            assert_eq!(scope.to_string().parse::<DiscountScope>(), Ok(scope));
        }
    }

    #[test]
    fn test_from_str_rejects_unknown_values() {
        assert!("percentage".parse::<DiscountType>().is_err());
        assert!("expired".parse::<DiscountStatus>().is_err());
        assert!("some".parse::<ProductCondition>().is_err());
        assert!("local".parse::<DiscountScope>().is_err());
    }

    #[test]
    fn test_serde_matches_form_values() {
        let json = serde_json::to_string(&DiscountScope::NotGlobal).unwrap_or_default();
        assert_eq!(json, "\"not_global\"");
    }
}
