//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::components::FormSlots;
use crate::config::AdminConfig;
use crate::services::order_edit::OrderEditStore;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    order_edits: OrderEditStore,
    form_slots: FormSlots,
}

impl AppState {
    /// Create application state with the default discount form slots.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        Self::with_form_slots(config, pool, FormSlots::with_defaults())
    }

    /// Create application state with a custom slot registry.
    #[must_use]
    pub fn with_form_slots(config: AdminConfig, pool: PgPool, form_slots: FormSlots) -> Self {
        let order_edits = OrderEditStore::new(config.order_edit_idle);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                order_edits,
                form_slots,
            }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the order edit session store.
    #[must_use]
    pub fn order_edits(&self) -> &OrderEditStore {
        &self.inner.order_edits
    }

    /// Get a reference to the discount form slot registry.
    #[must_use]
    pub fn form_slots(&self) -> &FormSlots {
        &self.inner.form_slots
    }
}
