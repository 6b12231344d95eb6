//! "Add Discount" dialog for the order edit screen.
//!
//! Lets an admin pick a discount code, warns when the draft is already among
//! the order's adjustments, and appends the draft on submit. The dialog closes
//! when the adjustments collection reports an addition, whichever path made it.

use copper_kettle_core::{CurrencyCode, Discount, DiscountId, OrderAdjustment, OrderId};

use super::dialog::DialogBehavior;
use crate::services::order_edit::{AdjustmentEvent, AdjustmentSubscription, OrderAdjustments};

/// One entry of the discount dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountOption {
    /// Option value: the discount ID as text.
    pub value: String,
    /// Code carried alongside the option; becomes the adjustment description.
    pub code: String,
    /// Text shown to the admin.
    pub label: String,
}

impl DiscountOption {
    /// Build the dropdown entry for a discount.
    #[must_use]
    pub fn from_discount(discount: &Discount, currency: CurrencyCode) -> Self {
        Self {
            value: discount.id.to_string(),
            code: discount.code.clone(),
            label: format!(
                "{} ({})",
                discount.code,
                discount.display_amount(currency)
            ),
        }
    }
}

/// Dropdown change: the selected option value, empty for the placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountSelection {
    pub value: String,
}

/// Dropdown entry as rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountOptionView {
    pub value: String,
    pub code: String,
    pub label: String,
    pub selected: bool,
}

/// Template data for the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOrderDiscountView {
    pub draft_id: String,
    pub type_id: Option<DiscountId>,
    pub description: String,
    /// The draft is already among the order's adjustments. Advisory only.
    pub is_duplicate: bool,
    pub options: Vec<DiscountOptionView>,
}

impl AddOrderDiscountView {
    /// Whether a real discount is selected.
    #[must_use]
    pub const fn has_selection(&self) -> bool {
        self.type_id.is_some()
    }
}

/// Dialog behavior editing a draft discount adjustment.
#[derive(Debug)]
pub struct AddOrderDiscount {
    draft: OrderAdjustment,
    options: Vec<DiscountOption>,
    subscription: Option<AdjustmentSubscription>,
}

impl AddOrderDiscount {
    /// Start a fresh draft for `order_id` and subscribe to `adjustments`.
    #[must_use]
    pub fn new(order_id: OrderId, adjustments: &OrderAdjustments, options: Vec<DiscountOption>) -> Self {
        Self {
            draft: OrderAdjustment::new_discount(order_id),
            options,
            subscription: Some(adjustments.subscribe()),
        }
    }

    /// The draft being edited.
    #[must_use]
    pub const fn draft(&self) -> &OrderAdjustment {
        &self.draft
    }

    /// Map a dropdown selection onto the draft.
    ///
    /// The placeholder resets the draft. A real option sets the type ID from
    /// the option value and the description from the option's code. Values
    /// that are not a known option or not an integer also reset the draft.
    ///
    /// Returns `true` if the draft changed.
    pub fn select(&mut self, value: &str) -> bool {
        if value.is_empty() {
            return self.draft.reset();
        }

        let Some(option) = self.options.iter().find(|o| o.value == value) else {
            tracing::warn!(value, "Unknown discount option selected");
            return self.draft.reset();
        };

        match option.value.trim().parse::<i32>() {
            Ok(id) => self
                .draft
                .set_discount(Some(DiscountId::new(id)), option.code.clone()),
            Err(e) => {
                tracing::warn!(value, error = %e, "Discount option value is not an integer");
                self.draft.reset()
            }
        }
    }

    /// Whether the subscription to the adjustments collection is live.
    #[must_use]
    pub const fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }
}

impl DialogBehavior for AddOrderDiscount {
    type State = OrderAdjustments;
    type Field = DiscountSelection;
    type View = AddOrderDiscountView;

    fn prepare(&self, adjustments: &OrderAdjustments) -> AddOrderDiscountView {
        let selected = self.draft.type_id.map(|id| id.to_string());
        AddOrderDiscountView {
            draft_id: self.draft.id.to_string(),
            type_id: self.draft.type_id,
            description: self.draft.description.clone(),
            is_duplicate: adjustments.has(&self.draft),
            options: self
                .options
                .iter()
                .map(|o| DiscountOptionView {
                    value: o.value.clone(),
                    code: o.code.clone(),
                    label: o.label.clone(),
                    selected: selected.as_deref() == Some(o.value.as_str()),
                })
                .collect(),
        }
    }

    fn on_field_change(&mut self, field: DiscountSelection) -> bool {
        self.select(&field.value)
    }

    fn on_submit(&mut self, adjustments: &mut OrderAdjustments) {
        adjustments.add(self.draft.clone());
    }

    fn close_requested(&mut self) -> bool {
        self.subscription.as_mut().is_some_and(|sub| {
            sub.drain()
                .iter()
                .any(|event| matches!(event, AdjustmentEvent::Added(_)))
        })
    }

    fn teardown(&mut self) {
        self.subscription = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::components::dialog::{Dialog, DialogState};

    const ORDER: OrderId = OrderId::new(42);

    fn options() -> Vec<DiscountOption> {
        vec![
            DiscountOption {
                value: "3".to_string(),
                code: "SPRING10".to_string(),
                label: "SPRING10 (10%)".to_string(),
            },
            DiscountOption {
                value: "8".to_string(),
                code: "FIVEOFF".to_string(),
                label: "FIVEOFF ($5.00)".to_string(),
            },
        ]
    }

    fn open(adjustments: &OrderAdjustments) -> Dialog<AddOrderDiscount> {
        Dialog::open(AddOrderDiscount::new(ORDER, adjustments, options()))
    }

    fn selection(value: &str) -> DiscountSelection {
        DiscountSelection {
            value: value.to_string(),
        }
    }

    #[test]
    fn test_open_creates_blank_draft_and_subscribes() {
        let adjustments = OrderAdjustments::default();
        let dialog = open(&adjustments);

        assert!(dialog.is_open());
        assert!(dialog.behavior().draft().is_blank());
        assert_eq!(dialog.behavior().draft().order_id, ORDER);
        assert_eq!(adjustments.subscriber_count(), 1);
    }

    #[test]
    fn test_draft_ids_are_unique_across_opens() {
        let adjustments = OrderAdjustments::default();
        let ids: HashSet<_> = (0..100)
            .map(|_| open(&adjustments).behavior().draft().id)
            .collect();

        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_selecting_option_maps_value_and_code() {
        let adjustments = OrderAdjustments::default();
        let mut dialog = open(&adjustments);

        let view = dialog.change(selection("8"), &adjustments).unwrap();

        assert_eq!(view.type_id, Some(DiscountId::new(8)));
        assert_eq!(view.description, "FIVEOFF");
        assert!(view.options.iter().any(|o| o.value == "8" && o.selected));
        assert!(view.options.iter().all(|o| o.value == "8" || !o.selected));
    }

    #[test]
    fn test_placeholder_resets_after_any_selection() {
        let adjustments = OrderAdjustments::default();
        let mut dialog = open(&adjustments);
        dialog.change(selection("3"), &adjustments);
        dialog.change(selection("8"), &adjustments);

        let view = dialog.change(selection(""), &adjustments).unwrap();

        assert_eq!(view.type_id, None);
        assert_eq!(view.description, "");
        assert!(dialog.behavior().draft().is_blank());
        assert!(view.options.iter().all(|o| !o.selected));
    }

    #[test]
    fn test_unchanged_selection_does_not_rerender() {
        let adjustments = OrderAdjustments::default();
        let mut dialog = open(&adjustments);

        assert!(dialog.change(selection(""), &adjustments).is_none());
        assert!(dialog.change(selection("3"), &adjustments).is_some());
        assert!(dialog.change(selection("3"), &adjustments).is_none());
        assert_eq!(dialog.render_count(), 1);
    }

    #[test]
    fn test_unknown_or_malformed_values_reset_draft() {
        let adjustments = OrderAdjustments::default();
        let mut behavior = AddOrderDiscount::new(
            ORDER,
            &adjustments,
            vec![DiscountOption {
                value: "abc".to_string(),
                code: "BROKEN".to_string(),
                label: "BROKEN".to_string(),
            }],
        );
        behavior.draft.set_discount(Some(DiscountId::new(1)), "OLD".to_string());

        assert!(behavior.select("abc"));
        assert!(behavior.draft().is_blank());

        behavior.draft.set_discount(Some(DiscountId::new(1)), "OLD".to_string());
        assert!(behavior.select("999"));
        assert!(behavior.draft().is_blank());
    }

    #[test]
    fn test_submit_adds_once_and_closes_after_addition() {
        let mut adjustments = OrderAdjustments::default();
        let mut dialog = open(&adjustments);
        dialog.change(selection("3"), &adjustments);
        let draft = dialog.behavior().draft().clone();

        assert!(dialog.submit(&mut adjustments));

        assert_eq!(adjustments.as_slice(), &[draft]);
        assert_eq!(dialog.state(), DialogState::Closed);
        assert!(!dialog.behavior().is_subscribed());
        assert_eq!(adjustments.subscriber_count(), 0);
    }

    #[test]
    fn test_submit_does_not_close_without_add_notification() {
        let mut adjustments = OrderAdjustments::default();
        let mut behavior = AddOrderDiscount::new(ORDER, &adjustments, options());
        // Unsubscribed: the addition still happens, but the dialog never
        // hears about it.
        behavior.subscription = None;
        let mut dialog = Dialog::open(behavior);

        assert!(dialog.submit(&mut adjustments));

        assert_eq!(adjustments.len(), 1);
        assert!(dialog.is_open());
    }

    #[test]
    fn test_addition_from_elsewhere_closes_dialog() {
        let mut adjustments = OrderAdjustments::default();
        let mut dialog = open(&adjustments);

        adjustments.add(OrderAdjustment::new_discount(ORDER));
        assert!(dialog.is_open());

        dialog.sync();
        assert_eq!(dialog.state(), DialogState::Closed);
    }

    #[test]
    fn test_removal_does_not_close_dialog() {
        let existing = OrderAdjustment::new_discount(ORDER);
        let mut adjustments = OrderAdjustments::new(vec![existing.clone()]);
        let mut dialog = open(&adjustments);

        adjustments.remove(existing.id);
        dialog.sync();

        assert!(dialog.is_open());
    }

    #[test]
    fn test_duplicate_flag_is_advisory() {
        let mut adjustments = OrderAdjustments::default();
        let mut dialog = open(&adjustments);
        dialog.change(selection("3"), &adjustments);
        assert!(!dialog.render(&adjustments).unwrap().is_duplicate);

        // Same draft already applied through another path; sync is not
        // called, so the dialog is still open on top of it.
        adjustments.add(dialog.behavior().draft().clone());
        let view = dialog.render(&adjustments).unwrap();
        assert!(view.is_duplicate);

        assert!(dialog.submit(&mut adjustments));
        assert_eq!(adjustments.len(), 2);
        assert_eq!(dialog.state(), DialogState::Closed);
    }

    #[test]
    fn test_option_from_discount() {
        use copper_kettle_core::{
            DiscountScope, DiscountStatus, DiscountType, ProductCondition,
        };
        use rust_decimal::Decimal;

        let discount = Discount {
            id: DiscountId::new(12),
            name: "Five off".to_string(),
            code: "FIVEOFF".to_string(),
            discount_type: DiscountType::Flat,
            amount: Decimal::new(5, 0),
            product_reqs: Vec::new(),
            excluded_products: Vec::new(),
            product_condition: ProductCondition::All,
            scope: DiscountScope::Global,
            start_date: None,
            end_date: None,
            max_uses: None,
            use_count: 0,
            min_cart_price: None,
            status: DiscountStatus::Active,
            once_per_customer: false,
        };

        let option = DiscountOption::from_discount(&discount, CurrencyCode::USD);
        assert_eq!(option.value, "12");
        assert_eq!(option.code, "FIVEOFF");
        assert_eq!(option.label, "FIVEOFF ($5.00)");
    }
}
