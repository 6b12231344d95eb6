//! Discount management route handlers.
//!
//! The edit page is addressed by `?discount=<id>`; a missing, malformed or
//! unknown identifier ends in the generic fatal error page before anything
//! else is rendered.

use askama::Template;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use copper_kettle_core::{
    CurrencyCode, Discount, DiscountCodeError, DiscountId, DiscountScope, DiscountStatus,
    DiscountType, ProductCondition, ProductId, validate_discount_code,
};

use crate::{
    components::RenderedSlots,
    db::{DiscountFields, DiscountRepository, Product, ProductRepository, RepositoryError},
    error::AppError,
    state::AppState,
};

use super::render;

/// Value of the hidden `action` field on the edit form.
pub const EDIT_ACTION: &str = "edit_discount";

// =============================================================================
// View Types
// =============================================================================

/// Discount row on the listing page.
#[derive(Debug, Clone)]
pub struct DiscountListItem {
    pub id: DiscountId,
    pub name: String,
    pub code: String,
    pub discount_type: String,
    pub amount: String,
    pub usage: String,
    pub status: String,
    pub status_class: String,
    pub edit_url: String,
}

impl DiscountListItem {
    fn new(discount: &Discount, currency: CurrencyCode) -> Self {
        let status_class = match discount.status {
            DiscountStatus::Active => "bg-green-100 text-green-700",
            DiscountStatus::Inactive => "bg-gray-100 text-gray-700",
        };
        let discount_type = match discount.discount_type {
            DiscountType::Percent => "Percentage",
            DiscountType::Flat => "Flat amount",
        };

        Self {
            id: discount.id,
            name: discount.name.clone(),
            code: discount.code.clone(),
            discount_type: discount_type.to_string(),
            amount: discount.display_amount(currency),
            usage: discount.usage_label(),
            status: discount.status.to_string(),
            status_class: status_class.to_string(),
            edit_url: edit_url(discount.id),
        }
    }
}

/// Field values of the edit form, as the browser will show them.
///
/// Built either from a stored discount or from a rejected submission, so the
/// admin sees what they typed next to the error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountEditView {
    pub id: DiscountId,
    pub name: String,
    pub code: String,
    pub discount_type: String,
    /// Plain decimal, without currency symbol or percent sign.
    pub amount: String,
    /// Formatted amount for the summary line.
    pub amount_display: String,
    pub product_reqs: Vec<String>,
    pub excluded_products: Vec<String>,
    pub product_condition: String,
    pub scope: String,
    pub start_date: String,
    pub end_date: String,
    pub max_uses: String,
    pub min_cart_price: String,
    pub status: String,
    pub once_per_customer: bool,
    pub redirect_to: String,
    pub flat_amount_visible: bool,
    pub percent_amount_visible: bool,
    pub product_condition_visible: bool,
}

impl DiscountEditView {
    /// Pre-fill the form from a stored discount.
    #[must_use]
    pub fn from_discount(discount: &Discount, currency: CurrencyCode) -> Self {
        let ids = |list: &[ProductId]| list.iter().map(ToString::to_string).collect::<Vec<_>>();

        Self {
            id: discount.id,
            name: discount.name.clone(),
            code: discount.code.clone(),
            discount_type: discount.discount_type.to_string(),
            amount: discount.amount.normalize().to_string(),
            amount_display: discount.display_amount(currency),
            product_reqs: ids(&discount.product_reqs),
            excluded_products: ids(&discount.excluded_products),
            product_condition: discount.product_condition.to_string(),
            scope: discount.scope.to_string(),
            start_date: format_date(discount.start_date),
            end_date: format_date(discount.end_date),
            max_uses: discount.max_uses.map(|n| n.to_string()).unwrap_or_default(),
            min_cart_price: discount
                .min_cart_price
                .map(|p| p.to_string())
                .unwrap_or_default(),
            status: discount.status.to_string(),
            once_per_customer: discount.once_per_customer,
            redirect_to: edit_url(discount.id),
            flat_amount_visible: discount.discount_type == DiscountType::Flat,
            percent_amount_visible: discount.discount_type == DiscountType::Percent,
            product_condition_visible: !discount.applies_to_any_product(),
        }
    }

    /// Echo a rejected submission back into the form.
    #[must_use]
    pub fn from_input(id: DiscountId, input: &DiscountFormInput) -> Self {
        let product_reqs: Vec<String> = input
            .product_reqs
            .iter()
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .collect();

        Self {
            id,
            name: input.name.clone(),
            code: input.code.clone(),
            discount_type: input.discount_type.clone(),
            amount: input.amount.clone(),
            amount_display: String::new(),
            product_condition_visible: !product_reqs.is_empty(),
            product_reqs,
            excluded_products: input.excluded_products.clone(),
            product_condition: input.product_condition.clone(),
            scope: input.scope.clone(),
            start_date: input.start_date.clone(),
            end_date: input.end_date.clone(),
            max_uses: input.max_uses.clone(),
            min_cart_price: input.min_cart_price.clone(),
            status: input.status.clone(),
            once_per_customer: input.once_per_customer,
            redirect_to: input
                .redirect_to
                .clone()
                .unwrap_or_else(|| edit_url(id)),
            flat_amount_visible: input.discount_type == DiscountType::Flat.as_str(),
            percent_amount_visible: input.discount_type == DiscountType::Percent.as_str(),
        }
    }
}

/// Product entry in the requirement and exclusion pickers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductOptionView {
    pub id: ProductId,
    pub name: String,
    pub required: bool,
    pub excluded: bool,
}

fn product_options(products: &[Product], view: &DiscountEditView) -> Vec<ProductOptionView> {
    products
        .iter()
        .map(|p| {
            let id = p.id.to_string();
            ProductOptionView {
                id: p.id,
                name: p.name.clone(),
                required: view.product_reqs.contains(&id),
                excluded: view.excluded_products.contains(&id),
            }
        })
        .collect()
}

fn format_date(date: Option<NaiveDateTime>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn edit_url(id: DiscountId) -> String {
    format!("/discounts/edit?discount={id}")
}

// =============================================================================
// Templates
// =============================================================================

/// Discounts list page template.
#[derive(Template)]
#[template(path = "discounts/index.html")]
pub struct DiscountsIndexTemplate {
    pub current_path: String,
    pub discounts: Vec<DiscountListItem>,
}

/// Discount edit form template.
#[derive(Template)]
#[template(path = "discounts/edit.html")]
pub struct DiscountEditTemplate {
    pub current_path: String,
    pub action: &'static str,
    pub discount: DiscountEditView,
    pub products: Vec<ProductOptionView>,
    pub slots: RenderedSlots,
    pub error: Option<String>,
    pub updated: bool,
}

impl DiscountEditTemplate {
    fn new(
        discount: DiscountEditView,
        products: &[Product],
        slots: RenderedSlots,
        error: Option<String>,
        updated: bool,
    ) -> Self {
        Self {
            current_path: "/discounts".to_string(),
            action: EDIT_ACTION,
            products: product_options(products, &discount),
            discount,
            slots,
            error,
            updated,
        }
    }
}

// =============================================================================
// Input Types
// =============================================================================

/// Query parameters for the edit page.
#[derive(Debug, Deserialize)]
pub struct EditQuery {
    pub discount: Option<String>,
    pub updated: Option<String>,
}

/// Reasons a discount form submission is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscountFormError {
    #[error("Name is required.")]
    MissingName,
    #[error("Invalid code: {0}.")]
    InvalidCode(#[from] DiscountCodeError),
    #[error("Discount type must be percent or flat.")]
    InvalidType,
    #[error("Amount must be a non-negative number below 10,000,000,000 with at most 2 decimal places.")]
    InvalidAmount,
    #[error("Percentage discounts cannot exceed 100%.")]
    PercentOverHundred,
    #[error("Invalid product selection: {0}.")]
    InvalidProduct(String),
    #[error("Product condition must be all or any.")]
    InvalidProductCondition,
    #[error("Scope must be global or not_global.")]
    InvalidScope,
    #[error("Invalid {field}: {value}. Use YYYY-MM-DD or MM/DD/YYYY.")]
    InvalidDate { field: &'static str, value: String },
    #[error("Expiration date cannot be before the start date.")]
    EndBeforeStart,
    #[error("Max uses must be a non-negative whole number.")]
    InvalidMaxUses,
    #[error("Minimum cart amount must be a non-negative number below 10,000,000,000 with at most 2 decimal places.")]
    InvalidMinCartPrice,
    #[error("Status must be active or inactive.")]
    InvalidStatus,
}

/// Discount edit form submission.
///
/// Parsed from raw key/value pairs so the repeated `product_reqs[]` and
/// `excluded_products[]` keys collect into lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscountFormInput {
    pub action: String,
    pub discount_id: Option<String>,
    pub redirect_to: Option<String>,
    pub name: String,
    pub code: String,
    pub discount_type: String,
    pub amount: String,
    pub product_reqs: Vec<String>,
    pub excluded_products: Vec<String>,
    pub product_condition: String,
    pub scope: String,
    pub start_date: String,
    pub end_date: String,
    pub max_uses: String,
    pub min_cart_price: String,
    pub status: String,
    pub once_per_customer: bool,
}

impl DiscountFormInput {
    /// Collect form pairs. Unknown keys are ignored.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut input = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "action" => input.action = value,
                "discount_id" => input.discount_id = Some(value),
                "redirect_to" => input.redirect_to = Some(value),
                "name" => input.name = value,
                "code" => input.code = value,
                "type" => input.discount_type = value,
                "amount" => input.amount = value,
                "product_reqs[]" | "product_reqs" => input.product_reqs.push(value),
                "excluded_products[]" | "excluded_products" => {
                    input.excluded_products.push(value);
                }
                "product_condition" => input.product_condition = value,
                "scope" => input.scope = value,
                "start_date" => input.start_date = value,
                "end_date" => input.end_date = value,
                "max_uses" => input.max_uses = value,
                "min_cart_price" => input.min_cart_price = value,
                "status" => input.status = value,
                "once_per_customer" => input.once_per_customer = true,
                _ => {}
            }
        }
        input
    }

    /// Validate the submission into storable fields.
    ///
    /// # Errors
    ///
    /// Returns the first `DiscountFormError` found, in form order.
    pub fn validate(&self) -> Result<DiscountFields, DiscountFormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DiscountFormError::MissingName);
        }

        let code = self.code.trim();
        validate_discount_code(code)?;

        let discount_type = self
            .discount_type
            .trim()
            .parse::<DiscountType>()
            .map_err(|_| DiscountFormError::InvalidType)?;

        let amount = parse_money(&self.amount)
            .ok_or(DiscountFormError::InvalidAmount)?;
        if discount_type == DiscountType::Percent && amount > Decimal::ONE_HUNDRED {
            return Err(DiscountFormError::PercentOverHundred);
        }

        let product_reqs = parse_product_ids(&self.product_reqs)?;
        let excluded_products = parse_product_ids(&self.excluded_products)?;

        let product_condition = parse_or_default::<ProductCondition>(&self.product_condition)
            .map_err(|()| DiscountFormError::InvalidProductCondition)?;
        let scope = parse_or_default::<DiscountScope>(&self.scope)
            .map_err(|()| DiscountFormError::InvalidScope)?;

        let start = parse_form_date("start date", &self.start_date)?;
        let end = parse_form_date("expiration date", &self.end_date)?;
        if let (Some(start), Some(end)) = (start, end)
            && end < start
        {
            return Err(DiscountFormError::EndBeforeStart);
        }

        let max_uses = match self.max_uses.trim() {
            "" => None,
            raw => Some(
                raw.parse::<i32>()
                    .ok()
                    .filter(|n| *n >= 0)
                    .ok_or(DiscountFormError::InvalidMaxUses)?,
            ),
        };

        let min_cart_price = match self.min_cart_price.trim() {
            "" => None,
            raw => Some(
                parse_money(raw).ok_or(DiscountFormError::InvalidMinCartPrice)?,
            ),
        };

        let status = self
            .status
            .trim()
            .parse::<DiscountStatus>()
            .map_err(|_| DiscountFormError::InvalidStatus)?;

        Ok(DiscountFields {
            name: name.to_string(),
            code: code.to_string(),
            discount_type,
            amount,
            product_reqs,
            excluded_products,
            product_condition,
            scope,
            start_date: start.map(|d| d.and_time(NaiveTime::MIN)),
            end_date: end.and_then(|d| d.and_hms_opt(23, 59, 59)),
            max_uses,
            min_cart_price,
            status,
            once_per_customer: self.once_per_customer,
        })
    }
}

/// Amounts are stored as `NUMERIC(12, 2)`.
const MONEY_SCALE: u32 = 2;
/// 10^10, the first value with more than ten integer digits.
const MONEY_LIMIT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

fn parse_money(raw: &str) -> Option<Decimal> {
    raw.trim()
        .parse::<Decimal>()
        .ok()
        .filter(|d| !d.is_sign_negative() || d.is_zero())
        .filter(|d| d.normalize().scale() <= MONEY_SCALE && *d < MONEY_LIMIT)
}

fn parse_product_ids(raw: &[String]) -> Result<Vec<ProductId>, DiscountFormError> {
    raw.iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| ProductId::parse_positive(v).ok_or_else(|| DiscountFormError::InvalidProduct(v.to_string())))
        .collect()
}

/// Blank selects fall back to the first option.
fn parse_or_default<T>(raw: &str) -> Result<T, ()>
where
    T: std::str::FromStr + Default,
{
    match raw.trim() {
        "" => Ok(T::default()),
        value => value.parse().map_err(|_| ()),
    }
}

fn parse_form_date(field: &'static str, raw: &str) -> Result<Option<NaiveDate>, DiscountFormError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .map(Some)
        .map_err(|_| DiscountFormError::InvalidDate {
            field,
            value: raw.to_string(),
        })
}

// =============================================================================
// Request Checks
// =============================================================================

/// Parse the discount identifier from a request parameter.
///
/// # Errors
///
/// Returns `AppError::Fatal` if the parameter is missing or not a positive
/// integer.
pub fn parse_discount_param(raw: Option<&str>) -> Result<DiscountId, AppError> {
    let raw = raw.ok_or_else(|| AppError::Fatal("missing discount parameter".to_string()))?;
    DiscountId::parse_positive(raw)
        .ok_or_else(|| AppError::Fatal(format!("invalid discount parameter: {raw:?}")))
}

/// Require that the looked-up discount exists.
///
/// # Errors
///
/// Returns `AppError::Fatal` if `found` is `None`.
pub fn require_discount(id: DiscountId, found: Option<Discount>) -> Result<Discount, AppError> {
    found.ok_or_else(|| AppError::Fatal(format!("discount {id} not found")))
}

/// Where to send the admin after a successful update.
///
/// Only local paths from the form are honored; anything else falls back to
/// the edit page.
fn success_redirect(redirect_to: Option<&str>, id: DiscountId) -> String {
    let target = redirect_to
        .map(str::trim)
        .filter(|t| is_local_path(t))
        .map_or_else(|| edit_url(id), str::to_string);
    let (path, fragment) = target
        .split_once('#')
        .map_or((target.as_str(), None), |(p, f)| (p, Some(f)));
    let separator = if path.contains('?') { '&' } else { '?' };
    match fragment {
        Some(fragment) => format!("{path}{separator}updated=1#{fragment}"),
        None => format!("{path}{separator}updated=1"),
    }
}

fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}

// =============================================================================
// Handlers
// =============================================================================

/// Discounts list page handler.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let discounts = DiscountRepository::new(state.pool()).list_all().await?;
    let currency = state.config().currency;

    let template = DiscountsIndexTemplate {
        current_path: "/discounts".to_string(),
        discounts: discounts
            .iter()
            .map(|d| DiscountListItem::new(d, currency))
            .collect(),
    };

    Ok(render(&template))
}

/// Edit discount form handler.
#[instrument(skip(state))]
pub async fn edit(
    State(state): State<AppState>,
    Query(query): Query<EditQuery>,
) -> Result<Html<String>, AppError> {
    let id = parse_discount_param(query.discount.as_deref())?;
    let found = DiscountRepository::new(state.pool()).get_by_id(id).await?;
    let discount = require_discount(id, found)?;
    let products = ProductRepository::new(state.pool()).list_all().await?;

    let template = DiscountEditTemplate::new(
        DiscountEditView::from_discount(&discount, state.config().currency),
        &products,
        state.form_slots().render_all(&discount),
        None,
        query.updated.is_some(),
    );

    Ok(render(&template))
}

/// Update discount handler.
#[instrument(skip(state, pairs))]
pub async fn update(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let input = DiscountFormInput::from_pairs(pairs);
    let id = parse_discount_param(input.discount_id.as_deref())?;
    if !input.action.is_empty() && input.action != EDIT_ACTION {
        return Err(AppError::BadRequest(format!(
            "unsupported action: {}",
            input.action
        )));
    }

    let repo = DiscountRepository::new(state.pool());
    let discount = require_discount(id, repo.get_by_id(id).await?)?;

    let error = match input.validate() {
        Ok(fields) => match repo.update(id, &fields).await {
            Ok(updated) => {
                tracing::info!(discount_id = %id, code = %updated.code, "Discount updated");
                let target = success_redirect(input.redirect_to.as_deref(), id);
                return Ok(Redirect::to(&target).into_response());
            }
            Err(RepositoryError::Conflict(_)) => {
                "Another discount already uses this code.".to_string()
            }
            Err(RepositoryError::NotFound) => {
                return Err(AppError::Fatal(format!("discount {id} deleted during update")));
            }
            Err(e) => return Err(e.into()),
        },
        Err(e) => e.to_string(),
    };

    tracing::info!(discount_id = %id, error = %error, "Discount form rejected");

    let products = ProductRepository::new(state.pool()).list_all().await?;
    let template = DiscountEditTemplate::new(
        DiscountEditView::from_input(id, &input),
        &products,
        state.form_slots().render_all(&discount),
        Some(error),
        false,
    );

    Ok((StatusCode::UNPROCESSABLE_ENTITY, render(&template)).into_response())
}
