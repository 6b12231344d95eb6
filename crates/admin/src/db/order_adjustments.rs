//! Persistence for committed order adjustments.

use sqlx::PgPool;
use uuid::Uuid;

use copper_kettle_core::{AdjustmentId, AdjustmentKind, DiscountId, OrderAdjustment, OrderId};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct OrderAdjustmentRow {
    id: Uuid,
    order_id: i32,
    kind: String,
    type_id: Option<i32>,
    description: String,
}

impl TryFrom<OrderAdjustmentRow> for OrderAdjustment {
    type Error = RepositoryError;

    fn try_from(row: OrderAdjustmentRow) -> Result<Self, Self::Error> {
        let kind = row.kind.parse::<AdjustmentKind>().map_err(|e| {
            RepositoryError::DataCorruption(format!("order adjustment {}: {e}", row.id))
        })?;

        Ok(Self {
            id: AdjustmentId::from_uuid(row.id),
            order_id: OrderId::new(row.order_id),
            kind,
            type_id: row.type_id.map(DiscountId::new),
            description: row.description,
        })
    }
}

/// Repository for order adjustment database operations.
pub struct OrderAdjustmentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderAdjustmentRepository<'a> {
    /// Create a new order adjustment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the adjustments committed for an order, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a row holds an unknown kind.
    pub async fn list_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderAdjustment>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderAdjustmentRow>(
            r"
            SELECT id, order_id, kind, type_id, description
            FROM order_adjustments
            WHERE order_id = $1
            ORDER BY position
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Replace every adjustment of an order with `adjustments`, atomically.
    ///
    /// Adjustments are stored with their position so the order survives a
    /// reload. Duplicated identifiers within `adjustments` are kept once, at
    /// their last position.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// transaction is rolled back in that case.
    pub async fn replace_for_order(
        &self,
        order_id: OrderId,
        adjustments: &[OrderAdjustment],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM order_adjustments WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        for (position, adjustment) in (0_i32..).zip(adjustments) {
            sqlx::query(
                r"
                INSERT INTO order_adjustments (id, order_id, kind, type_id, description, position)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (id) DO UPDATE
                SET type_id = EXCLUDED.type_id,
                    description = EXCLUDED.description,
                    position = EXCLUDED.position
                ",
            )
            .bind(adjustment.id.as_uuid())
            .bind(order_id)
            .bind(adjustment.kind.as_str())
            .bind(adjustment.type_id)
            .bind(&adjustment.description)
            .bind(position)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
