//! Core types for Copper Kettle.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod adjustment;
pub mod discount;
pub mod id;
pub mod price;
pub mod status;

pub use adjustment::{AdjustmentId, AdjustmentKind, OrderAdjustment};
pub use discount::{Discount, DiscountCodeError, validate_discount_code};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use status::*;
