//! Reusable UI components.
//!
//! - [`dialog`]: generic modal lifecycle
//! - [`add_order_discount`]: the "Add Discount" dialog on the order edit screen
//! - [`form_slots`]: extension slots on the discount edit form

pub mod add_order_discount;
pub mod dialog;
pub mod form_slots;

pub use add_order_discount::{
    AddOrderDiscount, AddOrderDiscountView, DiscountOption, DiscountOptionView, DiscountSelection,
};
pub use dialog::{Dialog, DialogBehavior, DialogState};
pub use form_slots::{DiscountFormSlot, FormSlots, RenderedSlots, SlotRenderer};
