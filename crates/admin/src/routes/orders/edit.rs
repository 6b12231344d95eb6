//! Order edit session handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tokio::sync::MutexGuard;
use tracing::instrument;
use uuid::Uuid;

use copper_kettle_core::{AdjustmentId, OrderAdjustment, OrderId};

use crate::{
    components::{AddOrderDiscountView, DiscountOption},
    db::{DiscountRepository, OrderAdjustmentRepository},
    error::AppError,
    services::order_edit::{OrderEditSession, SharedSession},
    state::AppState,
};

use super::super::render;

// =============================================================================
// Views
// =============================================================================

/// Adjustment row on the order edit screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentView {
    pub id: String,
    pub kind: String,
    pub description: String,
    pub discount_id: Option<String>,
    pub remove_url: String,
}

impl AdjustmentView {
    fn new(adjustment: &OrderAdjustment, base_url: &str) -> Self {
        Self {
            id: adjustment.id.to_string(),
            kind: adjustment.kind.as_str().to_string(),
            description: adjustment.description.clone(),
            discount_id: adjustment.type_id.map(|id| id.to_string()),
            remove_url: format!("{base_url}/adjustments/{}/remove", adjustment.id),
        }
    }
}

fn adjustment_views(session: &OrderEditSession, base_url: &str) -> Vec<AdjustmentView> {
    session
        .adjustments()
        .as_slice()
        .iter()
        .map(|a| AdjustmentView::new(a, base_url))
        .collect()
}

fn session_url(order_id: OrderId, edit_id: Uuid) -> String {
    format!("/orders/{order_id}/edit/{edit_id}")
}

// =============================================================================
// Templates
// =============================================================================

/// Order edit screen.
#[derive(Template)]
#[template(path = "orders/edit.html")]
pub struct OrderEditTemplate {
    pub current_path: String,
    pub order_id: OrderId,
    pub base_url: String,
    pub adjustments: Vec<AdjustmentView>,
    pub dialog: Option<AddOrderDiscountView>,
}

/// Adjustment list partial (HTMX swap).
#[derive(Template, WebTemplate)]
#[template(path = "orders/_adjustments.html")]
pub struct AdjustmentsPartial {
    pub base_url: String,
    pub adjustments: Vec<AdjustmentView>,
}

/// "Add Discount" dialog partial (HTMX swap).
#[derive(Template, WebTemplate)]
#[template(path = "orders/_discount_dialog.html")]
pub struct DiscountDialogPartial {
    pub base_url: String,
    pub dialog: AddOrderDiscountView,
}

// =============================================================================
// Input Types
// =============================================================================

/// Dropdown change from the discount dialog.
#[derive(Debug, Deserialize)]
pub struct DiscountSelectionInput {
    /// Selected option value; empty for the placeholder.
    #[serde(default)]
    pub discount: String,
}

// =============================================================================
// Session Lookup
// =============================================================================

fn parse_order_id(raw: &str) -> Result<OrderId, AppError> {
    OrderId::parse_positive(raw).ok_or_else(|| AppError::NotFound(format!("order {raw}")))
}

/// Resolve a live session, requiring it to belong to `order_id`.
async fn find_session(
    state: &AppState,
    order_id: &str,
    edit_id: &str,
) -> Result<(OrderId, Uuid, SharedSession), AppError> {
    let order_id = parse_order_id(order_id)?;
    let not_found = || AppError::NotFound(format!("edit session {edit_id}"));
    let edit_id = Uuid::parse_str(edit_id).map_err(|_| not_found())?;
    let session = state.order_edits().get(edit_id).await.ok_or_else(not_found)?;

    if lock_live(&session).await?.order_id() != order_id {
        return Err(not_found());
    }
    Ok((order_id, edit_id, session))
}

/// Lock a session, rejecting one committed while this request waited.
async fn lock_live(session: &SharedSession) -> Result<MutexGuard<'_, OrderEditSession>, AppError> {
    let guard = session.lock().await;
    if guard.is_committed() {
        return Err(AppError::NotFound(format!("edit session {}", guard.id())));
    }
    Ok(guard)
}

async fn discount_options(state: &AppState) -> Result<Vec<DiscountOption>, AppError> {
    let currency = state.config().currency;
    let discounts = DiscountRepository::new(state.pool()).list_active().await?;
    Ok(discounts
        .iter()
        .map(|d| DiscountOption::from_discount(d, currency))
        .collect())
}

// =============================================================================
// Handlers
// =============================================================================

/// Begin editing an order.
#[instrument(skip(state))]
pub async fn begin(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Redirect, AppError> {
    let order_id = parse_order_id(&order_id)?;
    let adjustments = OrderAdjustmentRepository::new(state.pool())
        .list_for_order(order_id)
        .await?;

    let edit_id = state.order_edits().begin(order_id, adjustments).await;
    tracing::info!(%order_id, %edit_id, "Order edit started");

    Ok(Redirect::to(&session_url(order_id, edit_id)))
}

/// Order edit screen.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path((order_id, edit_id)): Path<(String, String)>,
) -> Result<Html<String>, AppError> {
    let (order_id, edit_id, session) = find_session(&state, &order_id, &edit_id).await?;
    let mut session = lock_live(&session).await?;
    let base_url = session_url(order_id, edit_id);

    let template = OrderEditTemplate {
        current_path: format!("/orders/{order_id}/edit"),
        order_id,
        adjustments: adjustment_views(&session, &base_url),
        dialog: session.discount_dialog_view(),
        base_url,
    };

    Ok(render(&template))
}

/// Open the "Add Discount" dialog (HTMX).
#[instrument(skip(state))]
pub async fn open_discount_dialog(
    State(state): State<AppState>,
    Path((order_id, edit_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let (order_id, edit_id, session) = find_session(&state, &order_id, &edit_id).await?;
    let options = discount_options(&state).await?;

    let dialog = lock_live(&session)
        .await?
        .open_discount_dialog(options)
        .ok_or_else(|| AppError::Internal("freshly opened dialog did not render".to_string()))?;
    tracing::debug!(%order_id, %edit_id, draft_id = %dialog.draft_id, "Discount dialog opened");

    Ok(DiscountDialogPartial {
        base_url: session_url(order_id, edit_id),
        dialog,
    }
    .into_response())
}

/// Apply a discount selection in the dialog (HTMX).
#[instrument(skip(state))]
pub async fn change_discount_dialog(
    State(state): State<AppState>,
    Path((order_id, edit_id)): Path<(String, String)>,
    Form(input): Form<DiscountSelectionInput>,
) -> Result<Response, AppError> {
    let (order_id, edit_id, session) = find_session(&state, &order_id, &edit_id).await?;

    let dialog = lock_live(&session)
        .await?
        .change_discount(&input.discount)
        .ok_or_else(|| AppError::NotFound("discount dialog".to_string()))?;

    Ok(DiscountDialogPartial {
        base_url: session_url(order_id, edit_id),
        dialog,
    }
    .into_response())
}

/// Add the dialog's draft to the order (HTMX).
///
/// Responds with the refreshed adjustment list and an `adjustment-added`
/// trigger so the page can drop the dialog.
#[instrument(skip(state))]
pub async fn submit_discount_dialog(
    State(state): State<AppState>,
    Path((order_id, edit_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let (order_id, edit_id, session) = find_session(&state, &order_id, &edit_id).await?;
    let mut session = lock_live(&session).await?;

    if !session.submit_discount() {
        return Err(AppError::NotFound("discount dialog".to_string()));
    }
    tracing::info!(
        %order_id,
        %edit_id,
        adjustments = session.adjustments().len(),
        "Discount adjustment added"
    );

    let base_url = session_url(order_id, edit_id);
    Ok((
        AppendHeaders([("HX-Trigger", "adjustment-added")]),
        AdjustmentsPartial {
            adjustments: adjustment_views(&session, &base_url),
            base_url,
        },
    )
        .into_response())
}

/// Dismiss the dialog, discarding the draft (HTMX).
#[instrument(skip(state))]
pub async fn close_discount_dialog(
    State(state): State<AppState>,
    Path((order_id, edit_id)): Path<(String, String)>,
) -> Result<Html<&'static str>, AppError> {
    let (_, _, session) = find_session(&state, &order_id, &edit_id).await?;
    lock_live(&session).await?.close_discount_dialog();
    Ok(Html(""))
}

/// Remove an adjustment from the session (HTMX).
#[instrument(skip(state))]
pub async fn remove_adjustment(
    State(state): State<AppState>,
    Path((order_id, edit_id, adjustment_id)): Path<(String, String, String)>,
) -> Result<Response, AppError> {
    let (order_id, edit_id, session) = find_session(&state, &order_id, &edit_id).await?;
    let not_found = || AppError::NotFound(format!("adjustment {adjustment_id}"));
    let id = Uuid::parse_str(&adjustment_id)
        .map(AdjustmentId::from_uuid)
        .map_err(|_| not_found())?;

    let mut session = lock_live(&session).await?;
    session.remove_adjustment(id).ok_or_else(not_found)?;
    tracing::info!(%order_id, %edit_id, adjustment_id = %id, "Adjustment removed");

    let base_url = session_url(order_id, edit_id);
    Ok((
        AppendHeaders([("HX-Trigger", "adjustment-removed")]),
        AdjustmentsPartial {
            adjustments: adjustment_views(&session, &base_url),
            base_url,
        },
    )
        .into_response())
}

/// Persist the session's adjustments and end the session.
#[instrument(skip(state))]
pub async fn commit(
    State(state): State<AppState>,
    Path((order_id, edit_id)): Path<(String, String)>,
) -> Result<Redirect, AppError> {
    let (order_id, edit_id, session) = find_session(&state, &order_id, &edit_id).await?;

    let mut session = lock_live(&session).await?;
    OrderAdjustmentRepository::new(state.pool())
        .replace_for_order(order_id, session.adjustments().as_slice())
        .await?;
    session.mark_committed();
    state.order_edits().end(edit_id).await;
    tracing::info!(
        %order_id,
        %edit_id,
        adjustments = session.adjustments().len(),
        "Order edit committed"
    );

    Ok(Redirect::to(&format!("/orders/{order_id}/edit")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use crate::components::DiscountOption;
    use crate::routes::test_support::{test_app_with, test_state};

    const ORDER: OrderId = OrderId::new(31);

    fn options() -> Vec<DiscountOption> {
        vec![DiscountOption {
            value: "6".to_string(),
            code: "LOYAL15".to_string(),
            label: "LOYAL15 (15%)".to_string(),
        }]
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, String) {
        let response = test_app_with(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let trigger = response
            .headers()
            .get("HX-Trigger")
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let mut body = String::from_utf8(bytes.to_vec()).unwrap();
        if let Some(trigger) = trigger {
            body.push_str(&format!("\n<!-- HX-Trigger: {trigger} -->"));
        }
        (status, body)
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let state = test_state();
        let missing = Uuid::new_v4();

        for uri in [
            format!("/orders/31/edit/{missing}"),
            "/orders/31/edit/not-a-uuid".to_string(),
            format!("/orders/abc/edit/{missing}"),
        ] {
            let (status, _) = send(&state, get(&uri)).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_session_of_another_order_is_not_found() {
        let state = test_state();
        let edit_id = state.order_edits().begin(ORDER, Vec::new()).await;

        let (status, _) = send(&state, get(&format!("/orders/32/edit/{edit_id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&state, get(&format!("/orders/31/edit/{edit_id}"))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dialog_change_submit_round() {
        let state = test_state();
        let edit_id = state.order_edits().begin(ORDER, Vec::new()).await;
        let base = format!("/orders/31/edit/{edit_id}");
        let session = state.order_edits().get(edit_id).await.unwrap();
        session.lock().await.open_discount_dialog(options());

        let (status, body) = send(&state, post(&format!("{base}/discount-dialog/change"), "discount=6")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("LOYAL15"));

        let (status, body) = send(&state, post(&format!("{base}/discount-dialog"), "")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("HX-Trigger: adjustment-added"));
        assert!(body.contains("LOYAL15"));

        let session = session.lock().await;
        assert_eq!(session.adjustments().len(), 1);
        assert!(!session.is_discount_dialog_open());
    }

    #[tokio::test]
    async fn test_committed_session_rejects_waiting_requests() {
        let state = test_state();
        let edit_id = state.order_edits().begin(ORDER, Vec::new()).await;
        let base = format!("/orders/31/edit/{edit_id}");
        let session = state.order_edits().get(edit_id).await.unwrap();
        session.lock().await.open_discount_dialog(options());
        send(&state, post(&format!("{base}/discount-dialog/change"), "discount=6")).await;

        // A commit finishing while another request holds the handle.
        let held = session.clone();
        held.lock().await.mark_committed();

        let (status, body) = send(&state, post(&format!("{base}/discount-dialog"), "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.contains("adjustment-added"));

        for request in [
            get(&base),
            get(&format!("{base}/discount-dialog")),
            post(&format!("{base}/discount-dialog/change"), "discount=6"),
            post(&format!("{base}/commit"), ""),
        ] {
            let (status, _) = send(&state, request).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }

        assert!(session.lock().await.adjustments().is_empty());
    }

    #[tokio::test]
    async fn test_dialog_endpoints_need_open_dialog() {
        let state = test_state();
        let edit_id = state.order_edits().begin(ORDER, Vec::new()).await;
        let base = format!("/orders/31/edit/{edit_id}");

        let (status, _) = send(&state, post(&format!("{base}/discount-dialog"), "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&state, post(&format!("{base}/discount-dialog/change"), "discount=6")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&state, post(&format!("{base}/discount-dialog/close"), "")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_remove_adjustment() {
        let state = test_state();
        let existing = OrderAdjustment::new_discount(ORDER);
        let edit_id = state
            .order_edits()
            .begin(ORDER, vec![existing.clone()])
            .await;
        let base = format!("/orders/31/edit/{edit_id}");

        let uri = format!("{base}/adjustments/{}/remove", existing.id);
        let (status, body) = send(&state, post(&uri, "")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("HX-Trigger: adjustment-removed"));

        let (status, _) = send(&state, post(&uri, "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
