//! Postgres-backed inventory store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Duplicate category name or plate number, concurrent id allocation |
//! | Database (foreign key violation) | `23503` | `NotFound` | Referenced item or category does not exist |
//! | Database (check constraint violation) | `23514` | `Invalid` | Negative quantity |
//! | Database (other) | Any other | `Backend` | Other database errors |
//! | PoolClosed / other | N/A | `Backend` | Network errors, connection failures, etc. |
//!
//! ## Atomic deduction
//!
//! `commit_deduction` locks the planned batch rows with `SELECT ... FOR UPDATE`
//! (in id order, so concurrent deductions cannot deadlock), compares each
//! against the plan and only then writes. Any mismatch rolls the transaction
//! back and reports `Conflict`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use fleetstock_core::{BatchId, BusId, CategoryId, EmployeeId, ItemId, PrefixedId, RequestId};
use fleetstock_inventory::{
    Batch, BusRecord, Category, DeductionPlan, EmployeeRequest, ExternalSource, IntakeRequest,
    InventoryItem, ItemStatus, NewBus, NewItem, NewRequest, RequestFilter, RequestStatus, StockPolicy,
};

use super::r#trait::{InventoryStore, StoreError};

const SCHEMA: &str = include_str!("../../migrations/0001_inventory.sql");

const ITEM_COLUMNS: &str = "id, name, unit, reorder_level, category_id, status, manual_override, \
                            stock_policy, deleted, created_at, updated_at";
const BATCH_COLUMNS: &str = "id, item_id, usable_quantity, defective_quantity, missing_quantity, \
                             expiration_date, created_at, deleted";
const REQUEST_COLUMNS: &str = "id, requester, item_id, request_type, quantity, purpose, status, \
                               expected_return_date, actual_return_date, created_at, deleted";

/// Postgres-backed inventory store.
///
/// `Send + Sync`; all operations go through the SQLx connection pool.
#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: Arc<PgPool>,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Create missing tables and indexes. Safe to run on every start.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'_, Postgres>, StoreError> {
        self.pool.begin().await.map_err(|e| map_sqlx_error("begin_transaction", e))
    }
}

/// Largest allocated suffix in `table`, serialising concurrent allocators.
async fn max_seq(tx: &mut Transaction<'_, Postgres>, table: &'static str) -> Result<Option<u64>, StoreError> {
    sqlx::query(&format!("LOCK TABLE {table} IN SHARE ROW EXCLUSIVE MODE"))
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("lock_table", e))?;

    let max: Option<i64> = sqlx::query_scalar(&format!("SELECT MAX(seq) FROM {table}"))
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("max_seq", e))?;

    max.map(|m| u64::try_from(m).map_err(|_| corrupt(table, "negative seq")))
        .transpose()
}

async fn insert_request_tx(
    tx: &mut Transaction<'_, Postgres>,
    new: &NewRequest,
    now: DateTime<Utc>,
) -> Result<EmployeeRequest, StoreError> {
    let id = RequestId::next_after(max_seq(tx, "inventory_requests").await?);
    let request = EmployeeRequest::open(id, new.clone(), now);

    sqlx::query(
        r#"
        INSERT INTO inventory_requests (
            id, seq, requester, item_id, request_type, quantity, purpose, status,
            expected_return_date, actual_return_date, created_at, deleted
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, FALSE)
        "#,
    )
    .bind(request.id.to_string())
    .bind(seq_i64(request.id.seq()))
    .bind(request.requester.as_str())
    .bind(request.item_id.to_string())
    .bind(request.request_type.as_str())
    .bind(i64::from(request.quantity))
    .bind(&request.purpose)
    .bind(request.status.as_str())
    .bind(request.expected_return_date)
    .bind(request.actual_return_date)
    .bind(request.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_request", e))?;

    Ok(request)
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn find_item(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1"))
            .bind(id.to_string())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_item", e))?;
        row.as_ref().map(item_from_row).transpose()
    }

    async fn list_items(&self, include_deleted: bool) -> Result<Vec<InventoryItem>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE ($1 OR NOT deleted) ORDER BY seq"
        ))
        .bind(include_deleted)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_items", e))?;
        rows.iter().map(item_from_row).collect()
    }

    #[instrument(skip(self, new), err)]
    async fn insert_item(&self, new: &NewItem, now: DateTime<Utc>) -> Result<InventoryItem, StoreError> {
        let mut tx = self.begin().await?;
        let id = ItemId::next_after(max_seq(&mut tx, "inventory_items").await?);
        let item = InventoryItem::create(id, new.clone(), now)?;

        sqlx::query(
            r#"
            INSERT INTO inventory_items (
                id, seq, name, unit, reorder_level, category_id, status, manual_override,
                stock_policy, deleted, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, NULL, $8, FALSE, $9, $9)
            "#,
        )
        .bind(item.id.to_string())
        .bind(seq_i64(item.id.seq()))
        .bind(&item.name)
        .bind(&item.unit)
        .bind(i64::from(item.reorder_level))
        .bind(item.category_id.to_string())
        .bind(item.status.as_str())
        .bind(encode_policy(item.stock_policy))
        .bind(item.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_item", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(item)
    }

    async fn update_item(&self, item: &InventoryItem) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_items
            SET name = $2, unit = $3, reorder_level = $4, category_id = $5,
                manual_override = $6, stock_policy = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(item.id.to_string())
        .bind(&item.name)
        .bind(&item.unit)
        .bind(i64::from(item.reorder_level))
        .bind(item.category_id.to_string())
        .bind(item.manual_override.map(|s| s.as_str()))
        .bind(encode_policy(item.stock_policy))
        .bind(item.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_item", e))?;
        expect_one(result.rows_affected(), || format!("item {}", item.id))
    }

    async fn update_item_status(&self, id: ItemId, status: ItemStatus) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE inventory_items SET status = $2 WHERE id = $1")
            .bind(id.to_string())
            .bind(status.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_item_status", e))?;
        expect_one(result.rows_affected(), || format!("item {id}"))
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn soft_delete_item(&self, id: ItemId, now: DateTime<Utc>) -> Result<(), StoreError> {
        let mut tx = self.begin().await?;
        let result = sqlx::query("UPDATE inventory_items SET deleted = TRUE, updated_at = $2 WHERE id = $1")
            .bind(id.to_string())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("soft_delete_item", e))?;
        expect_one(result.rows_affected(), || format!("item {id}"))?;

        sqlx::query("UPDATE inventory_batches SET deleted = TRUE WHERE item_id = $1")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("soft_delete_item_batches", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))
    }

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query("SELECT id, name FROM inventory_categories WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_category", e))?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query("SELECT id, name FROM inventory_categories ORDER BY seq")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_categories", e))?;
        rows.iter().map(category_from_row).collect()
    }

    async fn insert_category(&self, name: &str) -> Result<Category, StoreError> {
        let mut tx = self.begin().await?;
        let id = CategoryId::next_after(max_seq(&mut tx, "inventory_categories").await?);
        let category = Category::new(id, name)?;

        sqlx::query("INSERT INTO inventory_categories (id, seq, name) VALUES ($1, $2, $3)")
            .bind(category.id.to_string())
            .bind(seq_i64(category.id.seq()))
            .bind(&category.name)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_category", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(category)
    }

    async fn find_batch(&self, id: BatchId) -> Result<Option<Batch>, StoreError> {
        let row = sqlx::query(&format!("SELECT {BATCH_COLUMNS} FROM inventory_batches WHERE id = $1"))
            .bind(id.to_string())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_batch", e))?;
        row.as_ref().map(batch_from_row).transpose()
    }

    async fn list_batches(&self, item_id: ItemId, include_deleted: bool) -> Result<Vec<Batch>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {BATCH_COLUMNS} FROM inventory_batches \
             WHERE item_id = $1 AND ($2 OR NOT deleted) ORDER BY seq"
        ))
        .bind(item_id.to_string())
        .bind(include_deleted)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_batches", e))?;
        rows.iter().map(batch_from_row).collect()
    }

    #[instrument(skip(self, intake), fields(item_id = %intake.item_id), err)]
    async fn create_batch(&self, intake: &IntakeRequest, now: DateTime<Utc>) -> Result<Batch, StoreError> {
        let mut tx = self.begin().await?;

        let live: Option<bool> = sqlx::query_scalar("SELECT NOT deleted FROM inventory_items WHERE id = $1 FOR SHARE")
            .bind(intake.item_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("create_batch_item", e))?;
        if live != Some(true) {
            return Err(StoreError::NotFound(format!("item {}", intake.item_id)));
        }

        let id = BatchId::next_after(max_seq(&mut tx, "inventory_batches").await?);
        let batch = Batch::from_intake(id, intake, now)?;

        sqlx::query(
            r#"
            INSERT INTO inventory_batches (
                id, seq, item_id, usable_quantity, defective_quantity, missing_quantity,
                expiration_date, created_at, deleted
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE)
            "#,
        )
        .bind(batch.id.to_string())
        .bind(seq_i64(batch.id.seq()))
        .bind(batch.item_id.to_string())
        .bind(i64::from(batch.usable_quantity))
        .bind(i64::from(batch.defective_quantity))
        .bind(i64::from(batch.missing_quantity))
        .bind(batch.expiration_date)
        .bind(batch.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_batch", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(batch)
    }

    async fn update_batch_usable(&self, id: BatchId, new_usable: u32) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE inventory_batches SET usable_quantity = $2 WHERE id = $1 AND usable_quantity >= $2",
        )
        .bind(id.to_string())
        .bind(i64::from(new_usable))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_batch_usable", e))?;

        if result.rows_affected() == 1 {
            return Ok(());
        }
        match self.find_batch(id).await? {
            None => Err(StoreError::NotFound(format!("batch {id}"))),
            Some(batch) => Err(StoreError::Invalid(format!(
                "usable quantity of batch {id} cannot rise from {} to {new_usable}",
                batch.usable_quantity
            ))),
        }
    }

    #[instrument(
        skip(self, plan, attach),
        fields(item_id = %plan.item_id, requested = plan.requested, batches = plan.deductions.len()),
        err
    )]
    async fn commit_deduction(
        &self,
        plan: &DeductionPlan,
        attach: Option<&NewRequest>,
        now: DateTime<Utc>,
    ) -> Result<Option<EmployeeRequest>, StoreError> {
        let mut tx = self.begin().await?;

        let ids: Vec<String> = plan.deductions.iter().map(|d| d.batch_id.to_string()).collect();
        let rows = sqlx::query(
            r#"
            SELECT id, item_id, usable_quantity, deleted
            FROM inventory_batches
            WHERE id = ANY($1)
            ORDER BY seq
            FOR UPDATE
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_batches", e))?;

        for d in &plan.deductions {
            let key = d.batch_id.to_string();
            let row = rows
                .iter()
                .find(|r| r.try_get::<String, _>("id").is_ok_and(|id| id == key))
                .ok_or_else(|| StoreError::NotFound(format!("batch {}", d.batch_id)))?;

            let item_id: String = row.try_get("item_id").map_err(|e| decode("inventory_batches", e))?;
            let deleted: bool = row.try_get("deleted").map_err(|e| decode("inventory_batches", e))?;
            let usable = to_u32(row.try_get("usable_quantity").map_err(|e| decode("inventory_batches", e))?)?;

            if deleted || item_id != plan.item_id.to_string() || usable != d.expected_usable {
                tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(StoreError::Conflict(format!(
                    "batch {} holds {usable} usable, plan expected {}",
                    d.batch_id, d.expected_usable
                )));
            }
            if d.new_usable > d.expected_usable {
                tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(StoreError::Invalid(format!(
                    "deduction would raise batch {} from {} to {}",
                    d.batch_id, d.expected_usable, d.new_usable
                )));
            }
        }

        for d in &plan.deductions {
            sqlx::query("UPDATE inventory_batches SET usable_quantity = $2 WHERE id = $1")
                .bind(d.batch_id.to_string())
                .bind(i64::from(d.new_usable))
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("apply_deduction", e))?;
        }

        let request = match attach {
            Some(new) => Some(insert_request_tx(&mut tx, new, now).await?),
            None => None,
        };

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(request)
    }

    async fn soft_delete_batch(&self, id: BatchId) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE inventory_batches SET deleted = TRUE WHERE id = $1")
            .bind(id.to_string())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("soft_delete_batch", e))?;
        expect_one(result.rows_affected(), || format!("batch {id}"))
    }

    async fn find_request(&self, id: RequestId) -> Result<Option<EmployeeRequest>, StoreError> {
        let row = sqlx::query(&format!("SELECT {REQUEST_COLUMNS} FROM inventory_requests WHERE id = $1"))
            .bind(id.to_string())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_request", e))?;
        row.as_ref().map(request_from_row).transpose()
    }

    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<EmployeeRequest>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM inventory_requests
            WHERE NOT deleted
              AND ($1::TEXT IS NULL OR item_id = $1)
              AND ($2::TEXT IS NULL OR requester = $2)
              AND ($3::TEXT IS NULL OR status = $3)
              AND ($4::TEXT IS NULL OR request_type = $4)
            ORDER BY seq
            "#
        ))
        .bind(filter.item_id.map(|id| id.to_string()))
        .bind(filter.requester.as_ref().map(|r| r.as_str().to_string()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.request_type.map(|t| t.as_str()))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_requests", e))?;
        rows.iter().map(request_from_row).collect()
    }

    async fn update_request_status(
        &self,
        id: RequestId,
        from: RequestStatus,
        to: RequestStatus,
        actual_return: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE inventory_requests SET status = $3, actual_return_date = $4 WHERE id = $1 AND status = $2",
        )
        .bind(id.to_string())
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(actual_return)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_request_status", e))?;

        if result.rows_affected() == 1 {
            return Ok(());
        }
        match self.find_request(id).await? {
            None => Err(StoreError::NotFound(format!("request {id}"))),
            Some(current) => Err(StoreError::Conflict(format!(
                "request {id} is {}, expected {}",
                current.status.as_str(),
                from.as_str()
            ))),
        }
    }

    async fn soft_delete_request(&self, id: RequestId) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE inventory_requests SET deleted = TRUE WHERE id = $1")
            .bind(id.to_string())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("soft_delete_request", e))?;
        expect_one(result.rows_affected(), || format!("request {id}"))
    }

    async fn insert_bus(&self, new: &NewBus) -> Result<BusRecord, StoreError> {
        let mut tx = self.begin().await?;
        let id = BusId::next_after(max_seq(&mut tx, "fleet_buses").await?);
        let bus = BusRecord::register(id, new.clone())?;

        sqlx::query(
            "INSERT INTO fleet_buses (id, seq, plate_number, item_id, condition, deleted) \
             VALUES ($1, $2, $3, $4, $5, FALSE)",
        )
        .bind(bus.id.to_string())
        .bind(seq_i64(bus.id.seq()))
        .bind(&bus.plate_number)
        .bind(bus.item_id.map(|id| id.to_string()))
        .bind(bus.condition.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_bus", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(bus)
    }

    async fn list_buses(&self) -> Result<Vec<BusRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, plate_number, item_id, condition, deleted FROM fleet_buses WHERE NOT deleted ORDER BY seq",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_buses", e))?;
        rows.iter().map(bus_from_row).collect()
    }

    async fn count_linked_buses(&self, item_id: ItemId) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM fleet_buses WHERE item_id = $1 AND NOT deleted")
            .bind(item_id.to_string())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_linked_buses", e))?;
        u64::try_from(count).map_err(|_| corrupt("fleet_buses", "negative count"))
    }
}

fn expect_one(rows_affected: u64, what: impl FnOnce() -> String) -> Result<(), StoreError> {
    if rows_affected == 0 {
        return Err(StoreError::NotFound(what()));
    }
    Ok(())
}

fn seq_i64(seq: u64) -> i64 {
    i64::try_from(seq).unwrap_or(i64::MAX)
}

fn to_u32(value: i64) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Backend(format!("quantity {value} out of range")))
}

fn corrupt(table: &str, detail: impl core::fmt::Display) -> StoreError {
    StoreError::Backend(format!("corrupt row in {table}: {detail}"))
}

fn decode(table: &str, err: sqlx::Error) -> StoreError {
    corrupt(table, err)
}

fn parse_col<T>(row: &PgRow, table: &str, column: &str) -> Result<T, StoreError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    let raw: String = row.try_get(column).map_err(|e| decode(table, e))?;
    raw.parse::<T>().map_err(|e| corrupt(table, format!("{column}: {e}")))
}

fn encode_policy(policy: StockPolicy) -> &'static str {
    match policy {
        StockPolicy::BatchSum => "batch_sum",
        StockPolicy::ExternalCount(ExternalSource::FleetBuses) => "external_count:fleet_buses",
    }
}

fn decode_policy(raw: &str) -> Result<StockPolicy, StoreError> {
    match raw {
        "batch_sum" => Ok(StockPolicy::BatchSum),
        "external_count:fleet_buses" => Ok(StockPolicy::ExternalCount(ExternalSource::FleetBuses)),
        other => Err(corrupt("inventory_items", format!("unknown stock policy '{other}'"))),
    }
}

fn item_from_row(row: &PgRow) -> Result<InventoryItem, StoreError> {
    const TABLE: &str = "inventory_items";
    let manual_override: Option<String> = row.try_get("manual_override").map_err(|e| decode(TABLE, e))?;
    let policy: String = row.try_get("stock_policy").map_err(|e| decode(TABLE, e))?;
    Ok(InventoryItem {
        id: parse_col(row, TABLE, "id")?,
        name: row.try_get("name").map_err(|e| decode(TABLE, e))?,
        unit: row.try_get("unit").map_err(|e| decode(TABLE, e))?,
        reorder_level: to_u32(row.try_get("reorder_level").map_err(|e| decode(TABLE, e))?)?,
        category_id: parse_col(row, TABLE, "category_id")?,
        status: parse_col(row, TABLE, "status")?,
        manual_override: manual_override
            .map(|s| s.parse::<ItemStatus>().map_err(|e| corrupt(TABLE, e)))
            .transpose()?,
        stock_policy: decode_policy(&policy)?,
        deleted: row.try_get("deleted").map_err(|e| decode(TABLE, e))?,
        created_at: row.try_get("created_at").map_err(|e| decode(TABLE, e))?,
        updated_at: row.try_get("updated_at").map_err(|e| decode(TABLE, e))?,
    })
}

fn category_from_row(row: &PgRow) -> Result<Category, StoreError> {
    const TABLE: &str = "inventory_categories";
    Ok(Category {
        id: parse_col(row, TABLE, "id")?,
        name: row.try_get("name").map_err(|e| decode(TABLE, e))?,
    })
}

fn batch_from_row(row: &PgRow) -> Result<Batch, StoreError> {
    const TABLE: &str = "inventory_batches";
    let expiration_date: Option<NaiveDate> = row.try_get("expiration_date").map_err(|e| decode(TABLE, e))?;
    Ok(Batch {
        id: parse_col(row, TABLE, "id")?,
        item_id: parse_col(row, TABLE, "item_id")?,
        usable_quantity: to_u32(row.try_get("usable_quantity").map_err(|e| decode(TABLE, e))?)?,
        defective_quantity: to_u32(row.try_get("defective_quantity").map_err(|e| decode(TABLE, e))?)?,
        missing_quantity: to_u32(row.try_get("missing_quantity").map_err(|e| decode(TABLE, e))?)?,
        expiration_date,
        created_at: row.try_get("created_at").map_err(|e| decode(TABLE, e))?,
        deleted: row.try_get("deleted").map_err(|e| decode(TABLE, e))?,
    })
}

fn request_from_row(row: &PgRow) -> Result<EmployeeRequest, StoreError> {
    const TABLE: &str = "inventory_requests";
    let requester: String = row.try_get("requester").map_err(|e| decode(TABLE, e))?;
    Ok(EmployeeRequest {
        id: parse_col(row, TABLE, "id")?,
        requester: EmployeeId::parse(requester).map_err(|e| corrupt(TABLE, e))?,
        item_id: parse_col(row, TABLE, "item_id")?,
        request_type: parse_col(row, TABLE, "request_type")?,
        quantity: to_u32(row.try_get("quantity").map_err(|e| decode(TABLE, e))?)?,
        purpose: row.try_get("purpose").map_err(|e| decode(TABLE, e))?,
        status: parse_col(row, TABLE, "status")?,
        expected_return_date: row.try_get("expected_return_date").map_err(|e| decode(TABLE, e))?,
        actual_return_date: row.try_get("actual_return_date").map_err(|e| decode(TABLE, e))?,
        created_at: row.try_get("created_at").map_err(|e| decode(TABLE, e))?,
        deleted: row.try_get("deleted").map_err(|e| decode(TABLE, e))?,
    })
}

fn bus_from_row(row: &PgRow) -> Result<BusRecord, StoreError> {
    const TABLE: &str = "fleet_buses";
    let item_id: Option<String> = row.try_get("item_id").map_err(|e| decode(TABLE, e))?;
    Ok(BusRecord {
        id: parse_col(row, TABLE, "id")?,
        plate_number: row.try_get("plate_number").map_err(|e| decode(TABLE, e))?,
        item_id: item_id
            .map(|s| s.parse::<ItemId>().map_err(|e| corrupt(TABLE, e)))
            .transpose()?,
        condition: parse_col(row, TABLE, "condition")?,
        deleted: row.try_get("deleted").map_err(|e| decode(TABLE, e))?,
    })
}

/// Map SQLx errors to `StoreError` (see the module docs for the table).
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") => StoreError::NotFound(msg),
                Some("23514") => StoreError::Invalid(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {operation}")),
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}
