use sea_orm::ActiveEnum;
use uuid::Uuid;

use crate::{db::DbPool, entity::inventory_logs::InventoryReason, error::AppResult};

/// Append a stock-movement record. The table is write-only: rows are never
/// updated or deleted, and a failed insert must not fail the request that
/// triggered it (callers warn and continue).
pub async fn log_stock_change(
    pool: &DbPool,
    product_id: Uuid,
    quantity_change: i32,
    reason: InventoryReason,
) -> AppResult<()> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO inventory_logs (id, product_id, quantity_change, reason)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(id)
    .bind(product_id)
    .bind(quantity_change)
    .bind(reason.to_value())
    .execute(pool)
    .await?;

    Ok(())
}
