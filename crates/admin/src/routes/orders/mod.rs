//! Order editing route handlers.
//!
//! An edit session is addressed by the order ID and a server-generated edit
//! ID. Dialog and adjustment endpoints answer with HTMX partials.

mod edit;

pub use edit::{
    AdjustmentView, AdjustmentsPartial, DiscountDialogPartial, DiscountSelectionInput,
    OrderEditTemplate, begin, change_discount_dialog, close_discount_dialog, commit,
    open_discount_dialog, remove_adjustment, show, submit_discount_dialog,
};
