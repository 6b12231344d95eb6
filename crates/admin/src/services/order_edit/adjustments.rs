//! The shared, observable collection of adjustments for an order being edited.

use tokio::sync::broadcast::{self, error::TryRecvError};

use copper_kettle_core::{AdjustmentId, OrderAdjustment};

/// Buffered notifications per subscriber before older ones are dropped.
const EVENT_CAPACITY: usize = 64;

/// Change notification emitted by [`OrderAdjustments`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdjustmentEvent {
    /// An adjustment was appended.
    Added(OrderAdjustment),
    /// An adjustment was removed.
    Removed(AdjustmentId),
}

/// Ordered list of order adjustments with change notifications.
///
/// Membership is by adjustment identifier. `add` never rejects: appending an
/// adjustment whose identifier is already present keeps both entries.
#[derive(Debug)]
pub struct OrderAdjustments {
    items: Vec<OrderAdjustment>,
    events: broadcast::Sender<AdjustmentEvent>,
}

impl Default for OrderAdjustments {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl OrderAdjustments {
    /// Create a collection seeded with already-applied adjustments.
    ///
    /// Seeding does not emit notifications.
    #[must_use]
    pub fn new(items: Vec<OrderAdjustment>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { items, events }
    }

    /// Register for change notifications.
    ///
    /// Dropping the returned subscription unsubscribes.
    #[must_use]
    pub fn subscribe(&self) -> AdjustmentSubscription {
        AdjustmentSubscription {
            rx: self.events.subscribe(),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Whether an adjustment with the same identifier is present.
    #[must_use]
    pub fn has(&self, adjustment: &OrderAdjustment) -> bool {
        self.contains(adjustment.id)
    }

    /// Whether an adjustment with this identifier is present.
    #[must_use]
    pub fn contains(&self, id: AdjustmentId) -> bool {
        self.items.iter().any(|a| a.id == id)
    }

    /// Append an adjustment and notify subscribers.
    pub fn add(&mut self, adjustment: OrderAdjustment) {
        self.items.push(adjustment.clone());
        // No subscribers is not an error.
        let _ = self.events.send(AdjustmentEvent::Added(adjustment));
    }

    /// Remove every adjustment with this identifier and notify subscribers.
    ///
    /// Returns the first removed adjustment, or `None` if nothing matched.
    pub fn remove(&mut self, id: AdjustmentId) -> Option<OrderAdjustment> {
        let position = self.items.iter().position(|a| a.id == id)?;
        let removed = self.items.remove(position);
        self.items.retain(|a| a.id != id);
        let _ = self.events.send(AdjustmentEvent::Removed(id));
        Some(removed)
    }

    /// Adjustments in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[OrderAdjustment] {
        &self.items
    }

    /// Number of adjustments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A registration on an [`OrderAdjustments`] collection.
#[derive(Debug)]
pub struct AdjustmentSubscription {
    rx: broadcast::Receiver<AdjustmentEvent>,
}

impl AdjustmentSubscription {
    /// Take every notification received since the last drain.
    pub fn drain(&mut self) -> Vec<AdjustmentEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Adjustment subscriber lagged behind");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copper_kettle_core::OrderId;

    fn adjustment() -> OrderAdjustment {
        OrderAdjustment::new_discount(OrderId::new(10))
    }

    #[test]
    fn test_add_appends_and_notifies() {
        let mut adjustments = OrderAdjustments::default();
        let mut sub = adjustments.subscribe();
        let adj = adjustment();

        adjustments.add(adj.clone());

        assert_eq!(adjustments.len(), 1);
        assert!(adjustments.has(&adj));
        assert_eq!(sub.drain(), vec![AdjustmentEvent::Added(adj)]);
        assert!(sub.drain().is_empty());
    }

    #[test]
    fn test_seeded_items_do_not_notify() {
        let adj = adjustment();
        let adjustments = OrderAdjustments::new(vec![adj.clone()]);
        let mut sub = adjustments.subscribe();

        assert!(adjustments.has(&adj));
        assert!(sub.drain().is_empty());
    }

    #[test]
    fn test_add_keeps_duplicates() {
        let mut adjustments = OrderAdjustments::default();
        let adj = adjustment();

        adjustments.add(adj.clone());
        adjustments.add(adj);

        assert_eq!(adjustments.len(), 2);
    }

    #[test]
    fn test_remove_drops_all_entries_with_id() {
        let mut adjustments = OrderAdjustments::default();
        let adj = adjustment();
        let other = adjustment();
        adjustments.add(adj.clone());
        adjustments.add(other.clone());
        adjustments.add(adj.clone());
        let mut sub = adjustments.subscribe();

        assert_eq!(adjustments.remove(adj.id), Some(adj.clone()));
        assert_eq!(adjustments.as_slice(), &[other]);
        assert_eq!(sub.drain(), vec![AdjustmentEvent::Removed(adj.id)]);
        assert_eq!(adjustments.remove(adj.id), None);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let adjustments = OrderAdjustments::default();
        let sub = adjustments.subscribe();
        assert_eq!(adjustments.subscriber_count(), 1);

        drop(sub);
        assert_eq!(adjustments.subscriber_count(), 0);
    }
}
