//! Named extension slots on the discount edit form.
//!
//! Other parts of the admin register renderers against a slot; the form
//! injects their concatenated output at that point of the page.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use copper_kettle_core::Discount;

/// Renders extra markup for a discount. Output is trusted HTML.
pub type SlotRenderer = Arc<dyn Fn(&Discount) -> String + Send + Sync>;

/// Extension points of the discount edit form, in page order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscountFormSlot {
    Top,
    BeforeName,
    BeforeCode,
    BeforeType,
    BeforeAmount,
    BeforeProducts,
    BeforeExcludedProducts,
    BeforeStart,
    BeforeExpiration,
    BeforeMaxUses,
    BeforeMinCartAmount,
    BeforeStatus,
    BeforeUseOnce,
    Bottom,
}

impl DiscountFormSlot {
    /// Every slot, in page order.
    pub const ALL: [Self; 14] = [
        Self::Top,
        Self::BeforeName,
        Self::BeforeCode,
        Self::BeforeType,
        Self::BeforeAmount,
        Self::BeforeProducts,
        Self::BeforeExcludedProducts,
        Self::BeforeStart,
        Self::BeforeExpiration,
        Self::BeforeMaxUses,
        Self::BeforeMinCartAmount,
        Self::BeforeStatus,
        Self::BeforeUseOnce,
        Self::Bottom,
    ];

    /// Slot name as used in markup.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::BeforeName => "before_name",
            Self::BeforeCode => "before_code",
            Self::BeforeType => "before_type",
            Self::BeforeAmount => "before_amount",
            Self::BeforeProducts => "before_products",
            Self::BeforeExcludedProducts => "before_excluded_products",
            Self::BeforeStart => "before_start",
            Self::BeforeExpiration => "before_expiration",
            Self::BeforeMaxUses => "before_max_uses",
            Self::BeforeMinCartAmount => "before_min_cart_amount",
            Self::BeforeStatus => "before_status",
            Self::BeforeUseOnce => "before_use_once",
            Self::Bottom => "bottom",
        }
    }
}

impl fmt::Display for DiscountFormSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry of slot renderers.
#[derive(Clone, Default)]
pub struct FormSlots {
    renderers: HashMap<DiscountFormSlot, Vec<SlotRenderer>>,
}

impl fmt::Debug for FormSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<_, _> = self
            .renderers
            .iter()
            .map(|(slot, list)| (slot.as_str(), list.len()))
            .collect();
        f.debug_struct("FormSlots").field("renderers", &counts).finish()
    }
}

impl FormSlots {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry the admin ships with: a usage summary at the bottom.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut slots = Self::new();
        slots.register(DiscountFormSlot::Bottom, usage_summary);
        slots
    }

    /// Append a renderer to `slot`. Renderers run in registration order.
    pub fn register<F>(&mut self, slot: DiscountFormSlot, renderer: F)
    where
        F: Fn(&Discount) -> String + Send + Sync + 'static,
    {
        self.renderers
            .entry(slot)
            .or_default()
            .push(Arc::new(renderer));
    }

    /// Concatenated output of every renderer registered on `slot`.
    #[must_use]
    pub fn render(&self, slot: DiscountFormSlot, discount: &Discount) -> String {
        self.renderers
            .get(&slot)
            .map(|list| list.iter().map(|r| r(discount)).collect())
            .unwrap_or_default()
    }

    /// Render every slot for a discount.
    #[must_use]
    pub fn render_all(&self, discount: &Discount) -> RenderedSlots {
        let r = |slot| self.render(slot, discount);
        RenderedSlots {
            top: r(DiscountFormSlot::Top),
            before_name: r(DiscountFormSlot::BeforeName),
            before_code: r(DiscountFormSlot::BeforeCode),
            before_type: r(DiscountFormSlot::BeforeType),
            before_amount: r(DiscountFormSlot::BeforeAmount),
            before_products: r(DiscountFormSlot::BeforeProducts),
            before_excluded_products: r(DiscountFormSlot::BeforeExcludedProducts),
            before_start: r(DiscountFormSlot::BeforeStart),
            before_expiration: r(DiscountFormSlot::BeforeExpiration),
            before_max_uses: r(DiscountFormSlot::BeforeMaxUses),
            before_min_cart_amount: r(DiscountFormSlot::BeforeMinCartAmount),
            before_status: r(DiscountFormSlot::BeforeStatus),
            before_use_once: r(DiscountFormSlot::BeforeUseOnce),
            bottom: r(DiscountFormSlot::Bottom),
        }
    }
}

/// Slot output for one render of the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedSlots {
    pub top: String,
    pub before_name: String,
    pub before_code: String,
    pub before_type: String,
    pub before_amount: String,
    pub before_products: String,
    pub before_excluded_products: String,
    pub before_start: String,
    pub before_expiration: String,
    pub before_max_uses: String,
    pub before_min_cart_amount: String,
    pub before_status: String,
    pub before_use_once: String,
    pub bottom: String,
}

/// "Used N of M times" (or "Used N times" when unlimited).
fn usage_summary(discount: &Discount) -> String {
    let text = discount.max_uses.map_or_else(
        || format!("Used {} times", discount.use_count),
        |max| format!("Used {} of {} times", discount.use_count, max),
    );
    format!(r#"<p class="text-sm text-muted-foreground" data-slot="usage">{text}</p>"#)
}
