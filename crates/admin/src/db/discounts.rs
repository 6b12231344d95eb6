//! Discount repository for database operations.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::PgPool;

use copper_kettle_core::{
    Discount, DiscountId, DiscountScope, DiscountStatus, DiscountType, ProductCondition, ProductId,
};

use super::{RepositoryError, map_unique_violation};

const DISCOUNT_COLUMNS: &str = r"
    id, name, code, discount_type, amount, product_reqs, excluded_products,
    product_condition, scope, start_date, end_date, max_uses, use_count,
    min_cart_price, status, once_per_customer
";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` discount queries.
#[derive(Debug, sqlx::FromRow)]
struct DiscountRow {
    id: i32,
    name: String,
    code: String,
    discount_type: String,
    amount: Decimal,
    product_reqs: Vec<i32>,
    excluded_products: Vec<i32>,
    product_condition: String,
    scope: String,
    start_date: Option<NaiveDateTime>,
    end_date: Option<NaiveDateTime>,
    max_uses: Option<i32>,
    use_count: i32,
    min_cart_price: Option<Decimal>,
    status: String,
    once_per_customer: bool,
}

impl TryFrom<DiscountRow> for Discount {
    type Error = RepositoryError;

    fn try_from(row: DiscountRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |e: String| RepositoryError::DataCorruption(format!("discount {id}: {e}"));

        Ok(Self {
            id: DiscountId::new(id),
            discount_type: row.discount_type.parse::<DiscountType>().map_err(corrupt)?,
            product_condition: row
                .product_condition
                .parse::<ProductCondition>()
                .map_err(corrupt)?,
            scope: row.scope.parse::<DiscountScope>().map_err(corrupt)?,
            status: row.status.parse::<DiscountStatus>().map_err(corrupt)?,
            name: row.name,
            code: row.code,
            amount: row.amount,
            product_reqs: row.product_reqs.into_iter().map(ProductId::new).collect(),
            excluded_products: row
                .excluded_products
                .into_iter()
                .map(ProductId::new)
                .collect(),
            start_date: row.start_date,
            end_date: row.end_date,
            max_uses: row.max_uses,
            use_count: row.use_count,
            min_cart_price: row.min_cart_price,
            once_per_customer: row.once_per_customer,
        })
    }
}

/// Editable discount fields, used for both inserts and updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountFields {
    pub name: String,
    pub code: String,
    pub discount_type: DiscountType,
    pub amount: Decimal,
    pub product_reqs: Vec<ProductId>,
    pub excluded_products: Vec<ProductId>,
    pub product_condition: ProductCondition,
    pub scope: DiscountScope,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub max_uses: Option<i32>,
    pub min_cart_price: Option<Decimal>,
    pub status: DiscountStatus,
    pub once_per_customer: bool,
}

impl From<&Discount> for DiscountFields {
    fn from(d: &Discount) -> Self {
        Self {
            name: d.name.clone(),
            code: d.code.clone(),
            discount_type: d.discount_type,
            amount: d.amount,
            product_reqs: d.product_reqs.clone(),
            excluded_products: d.excluded_products.clone(),
            product_condition: d.product_condition,
            scope: d.scope,
            start_date: d.start_date,
            end_date: d.end_date,
            max_uses: d.max_uses,
            min_cart_price: d.min_cart_price,
            status: d.status,
            once_per_customer: d.once_per_customer,
        }
    }
}

fn raw_ids(ids: &[ProductId]) -> Vec<i32> {
    ids.iter().map(ProductId::as_i32).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for discount database operations.
pub struct DiscountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DiscountRepository<'a> {
    /// Create a new discount repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all discounts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row holds invalid enum text.
    pub async fn list_all(&self) -> Result<Vec<Discount>, RepositoryError> {
        let rows = sqlx::query_as::<_, DiscountRow>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts ORDER BY id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List active discounts ordered by code, for pickers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row holds invalid enum text.
    pub async fn list_active(&self) -> Result<Vec<Discount>, RepositoryError> {
        let rows = sqlx::query_as::<_, DiscountRow>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE status = 'active' ORDER BY code"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a discount by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the row holds invalid enum text.
    pub async fn get_by_id(&self, id: DiscountId) -> Result<Option<Discount>, RepositoryError> {
        let row = sqlx::query_as::<_, DiscountRow>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert a new discount.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is already taken.
    /// Returns `RepositoryError::Database` if the insert fails otherwise.
    pub async fn create(&self, fields: &DiscountFields) -> Result<Discount, RepositoryError> {
        let row = sqlx::query_as::<_, DiscountRow>(&format!(
            r"
            INSERT INTO discounts (
                name, code, discount_type, amount, product_reqs, excluded_products,
                product_condition, scope, start_date, end_date, max_uses,
                min_cart_price, status, once_per_customer
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {DISCOUNT_COLUMNS}
            "
        ))
        .bind(&fields.name)
        .bind(&fields.code)
        .bind(fields.discount_type.as_str())
        .bind(fields.amount)
        .bind(raw_ids(&fields.product_reqs))
        .bind(raw_ids(&fields.excluded_products))
        .bind(fields.product_condition.as_str())
        .bind(fields.scope.as_str())
        .bind(fields.start_date)
        .bind(fields.end_date)
        .bind(fields.max_uses)
        .bind(fields.min_cart_price)
        .bind(fields.status.as_str())
        .bind(fields.once_per_customer)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "discount code"))?;

        row.try_into()
    }

    /// Overwrite the editable fields of an existing discount.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no discount has this ID.
    /// Returns `RepositoryError::Conflict` if the new code is already taken.
    /// Returns `RepositoryError::Database` if the update fails otherwise.
    pub async fn update(
        &self,
        id: DiscountId,
        fields: &DiscountFields,
    ) -> Result<Discount, RepositoryError> {
        let row = sqlx::query_as::<_, DiscountRow>(&format!(
            r"
            UPDATE discounts SET
                name = $2, code = $3, discount_type = $4, amount = $5,
                product_reqs = $6, excluded_products = $7, product_condition = $8,
                scope = $9, start_date = $10, end_date = $11, max_uses = $12,
                min_cart_price = $13, status = $14, once_per_customer = $15,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {DISCOUNT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.code)
        .bind(fields.discount_type.as_str())
        .bind(fields.amount)
        .bind(raw_ids(&fields.product_reqs))
        .bind(raw_ids(&fields.excluded_products))
        .bind(fields.product_condition.as_str())
        .bind(fields.scope.as_str())
        .bind(fields.start_date)
        .bind(fields.end_date)
        .bind(fields.max_uses)
        .bind(fields.min_cart_price)
        .bind(fields.status.as_str())
        .bind(fields.once_per_customer)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "discount code"))?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }
}
