//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Discounts
//! GET  /discounts                                   - Discount listing
//! GET  /discounts/edit?discount=<id>                - Discount edit form
//! POST /discounts/edit                              - Save discount edit form
//!
//! # Order editing
//! GET  /orders/{order_id}/edit                      - Begin an edit session
//! GET  /orders/{order_id}/edit/{edit_id}            - Order edit screen
//! GET  /orders/{order_id}/edit/{edit_id}/discount-dialog         - Open discount dialog
//! POST /orders/{order_id}/edit/{edit_id}/discount-dialog/change  - Select a discount
//! POST /orders/{order_id}/edit/{edit_id}/discount-dialog         - Add the selected discount
//! POST /orders/{order_id}/edit/{edit_id}/discount-dialog/close   - Dismiss the dialog
//! POST /orders/{order_id}/edit/{edit_id}/adjustments/{adjustment_id}/remove
//! POST /orders/{order_id}/edit/{edit_id}/commit     - Persist adjustments
//! ```

pub mod discounts;
pub mod orders;

use askama::Template;
use axum::{
    Router,
    response::Html,
    routing::{get, post},
};

use crate::state::AppState;

/// Build the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Discounts
        .route("/discounts", get(discounts::index))
        .route(
            "/discounts/edit",
            get(discounts::edit).post(discounts::update),
        )
        // Order editing
        .route("/orders/{order_id}/edit", get(orders::begin))
        .route("/orders/{order_id}/edit/{edit_id}", get(orders::show))
        .route(
            "/orders/{order_id}/edit/{edit_id}/discount-dialog",
            get(orders::open_discount_dialog).post(orders::submit_discount_dialog),
        )
        .route(
            "/orders/{order_id}/edit/{edit_id}/discount-dialog/change",
            post(orders::change_discount_dialog),
        )
        .route(
            "/orders/{order_id}/edit/{edit_id}/discount-dialog/close",
            post(orders::close_discount_dialog),
        )
        .route(
            "/orders/{order_id}/edit/{edit_id}/adjustments/{adjustment_id}/remove",
            post(orders::remove_adjustment),
        )
        .route("/orders/{order_id}/edit/{edit_id}/commit", post(orders::commit))
}

/// Render a full page, logging template failures.
fn render<T: Template>(template: &T) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use axum::Router;
    use sqlx::postgres::PgPoolOptions;

    use crate::config::test_config;
    use crate::state::AppState;

    /// State over a pool that never connects unless a query runs.
    pub fn test_state() -> AppState {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/copper_kettle_test")
            .unwrap();
        AppState::new(test_config(), pool)
    }

    pub fn test_app_with(state: AppState) -> Router {
        super::routes().with_state(state)
    }

    pub fn test_app() -> Router {
        test_app_with(test_state())
    }
}
