//! Server-side order edit sessions.
//!
//! An [`OrderEditSession`] is the shared state of one order edit: the order's
//! adjustments and the discount dialog that adds to them. Sessions live in an
//! in-memory [`OrderEditStore`] and expire after a period of inactivity.

mod adjustments;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Mutex;
use uuid::Uuid;

use copper_kettle_core::{AdjustmentId, OrderAdjustment, OrderId};

use crate::components::{
    AddOrderDiscount, AddOrderDiscountView, Dialog, DiscountOption, DiscountSelection,
};

pub use adjustments::{AdjustmentEvent, AdjustmentSubscription, OrderAdjustments};

/// Upper bound on concurrently open edit sessions.
const MAX_SESSIONS: u64 = 10_000;

/// Shared state of one order being edited.
#[derive(Debug)]
pub struct OrderEditSession {
    id: Uuid,
    order_id: OrderId,
    adjustments: OrderAdjustments,
    discount_dialog: Option<Dialog<AddOrderDiscount>>,
    committed: bool,
}

impl OrderEditSession {
    /// Start a session seeded with the order's persisted adjustments.
    #[must_use]
    pub fn new(order_id: OrderId, adjustments: Vec<OrderAdjustment>) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            adjustments: OrderAdjustments::new(adjustments),
            discount_dialog: None,
            committed: false,
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn order_id(&self) -> OrderId {
        self.order_id
    }

    #[must_use]
    pub const fn adjustments(&self) -> &OrderAdjustments {
        &self.adjustments
    }

    /// Whether the adjustments have been persisted. A committed session
    /// accepts no further changes.
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        self.committed
    }

    /// Mark the session as persisted and discard any open dialog.
    pub fn mark_committed(&mut self) {
        self.close_discount_dialog();
        self.committed = true;
    }

    /// Whether the discount dialog is showing.
    #[must_use]
    pub fn is_discount_dialog_open(&self) -> bool {
        self.discount_dialog.as_ref().is_some_and(Dialog::is_open)
    }

    /// Open the discount dialog with a fresh draft, replacing any open one.
    pub fn open_discount_dialog(&mut self, options: Vec<DiscountOption>) -> Option<AddOrderDiscountView> {
        self.close_discount_dialog();
        let behavior = AddOrderDiscount::new(self.order_id, &self.adjustments, options);
        let dialog = self.discount_dialog.insert(Dialog::open(behavior));
        dialog.render(&self.adjustments)
    }

    /// Current dialog view, or `None` if the dialog is not showing.
    pub fn discount_dialog_view(&mut self) -> Option<AddOrderDiscountView> {
        self.discount_dialog.as_mut()?.render(&self.adjustments)
    }

    /// Apply a dropdown selection and return the dialog view.
    ///
    /// Returns `None` if the dialog is not showing.
    pub fn change_discount(&mut self, value: &str) -> Option<AddOrderDiscountView> {
        let dialog = self.discount_dialog.as_mut()?;
        let selection = DiscountSelection {
            value: value.to_string(),
        };
        dialog
            .change(selection, &self.adjustments)
            .or_else(|| dialog.render(&self.adjustments))
    }

    /// Submit the dialog, appending its draft to the adjustments.
    ///
    /// Returns `false` if the dialog was not showing.
    pub fn submit_discount(&mut self) -> bool {
        let Some(dialog) = self.discount_dialog.as_mut() else {
            return false;
        };
        let submitted = dialog.submit(&mut self.adjustments);
        self.drop_closed_dialog();
        submitted
    }

    /// Dismiss the dialog, discarding its draft.
    pub fn close_discount_dialog(&mut self) {
        if let Some(mut dialog) = self.discount_dialog.take() {
            dialog.close();
        }
    }

    /// Remove an adjustment. Returns the removed adjustment, if any.
    pub fn remove_adjustment(&mut self, id: AdjustmentId) -> Option<OrderAdjustment> {
        let removed = self.adjustments.remove(id);
        if let Some(dialog) = self.discount_dialog.as_mut() {
            dialog.sync();
        }
        self.drop_closed_dialog();
        removed
    }

    fn drop_closed_dialog(&mut self) {
        if !self.is_discount_dialog_open() {
            self.discount_dialog = None;
        }
    }
}

/// Handle to a session; hold the lock for the duration of one request.
pub type SharedSession = Arc<Mutex<OrderEditSession>>;

/// In-memory store of order edit sessions with idle expiry.
#[derive(Clone)]
pub struct OrderEditStore {
    sessions: Cache<Uuid, SharedSession>,
}

impl std::fmt::Debug for OrderEditStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderEditStore")
            .field("sessions", &self.sessions.entry_count())
            .finish()
    }
}

impl OrderEditStore {
    /// Create a store whose sessions expire after `idle` without access.
    #[must_use]
    pub fn new(idle: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(MAX_SESSIONS)
            .time_to_idle(idle)
            .build();
        Self { sessions }
    }

    /// Create a session for `order_id` and return its edit ID.
    pub async fn begin(&self, order_id: OrderId, adjustments: Vec<OrderAdjustment>) -> Uuid {
        let session = OrderEditSession::new(order_id, adjustments);
        let edit_id = session.id();
        self.sessions
            .insert(edit_id, Arc::new(Mutex::new(session)))
            .await;
        tracing::debug!(%edit_id, %order_id, "Order edit session started");
        edit_id
    }

    /// Look up a live session.
    pub async fn get(&self, edit_id: Uuid) -> Option<SharedSession> {
        self.sessions.get(&edit_id).await
    }

    /// Forget a session.
    pub async fn end(&self, edit_id: Uuid) {
        self.sessions.invalidate(&edit_id).await;
        tracing::debug!(%edit_id, "Order edit session ended");
    }
}
