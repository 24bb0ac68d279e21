//! Postgres-backed store.
//!
//! ## Error Mapping
//!
//! | SQLx error | PostgreSQL code | `StoreError` |
//! |------------|-----------------|--------------|
//! | Database (foreign key violation) | `23503` | `Domain(NotFound)` |
//! | Database (check constraint violation) | `23514` | `Domain(Validation)` |
//! | Database (numeric value out of range) | `22003` | `Domain(Validation)` |
//! | Database (other) | any other | `Query` |
//! | PoolTimedOut / PoolClosed / Io / Tls | n/a | `Unavailable` |
//! | Other | n/a | `Query` |
//!
//! ## Ledger serialization
//!
//! `apply_change` takes `pg_advisory_xact_lock(product_id)` before reading the
//! snapshot, so two changes for the same product queue up even when no
//! snapshot row exists yet to lock with `FOR UPDATE`. The advisory lock is
//! released when the transaction ends.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row, Transaction};
use tracing::{instrument, Span};

use async_trait::async_trait;

use shopledger_core::{DomainError, MovementId, ProductId, SaleId};
use shopledger_inventory::{next_stock, ChangeType, InventoryChange, InventoryRecord, InventoryStatus};
use shopledger_products::{NewProduct, Product};
use shopledger_sales::{NewSale, Period, RevenueSummaryItem, SaleItem, SalesFilter, SalesPredicate};

use super::{CatalogStore, LedgerStore, SalesStore, StoreError, StoreResult};

const SALE_ITEM_COLUMNS: &str = r#"
    SELECT
        s.id AS sale_id,
        p.id AS product_id,
        p.name AS product_name,
        p.category,
        s.quantity,
        s.sale_date,
        p.price AS price_per_unit,
        s.quantity * p.price AS total_price
    FROM sales s
    JOIN products p ON s.product_id = p.id
    WHERE TRUE"#;

/// Postgres store over an injected pool.
///
/// `PgPool` is internally reference counted; cloning the store shares it.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin(&self) -> StoreResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }
}

/// Roll back, then surface the business rejection that caused it.
async fn reject<T>(tx: Transaction<'_, Postgres>, err: DomainError) -> StoreResult<T> {
    tx.rollback()
        .await
        .map_err(|e| map_sqlx_error("rollback", e))?;
    Err(err.into())
}

async fn insert_product_tx(
    tx: &mut Transaction<'_, Postgres>,
    product: &NewProduct,
) -> StoreResult<ProductId> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO products (name, category, price, stock)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(&product.name)
    .bind(&product.category)
    .bind(product.price)
    .bind(product.stock)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_product", e))?;

    Ok(ProductId::new(id))
}

/// Append one `AND <column> <op> $n` per present filter field.
fn push_sales_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &SalesFilter) {
    for predicate in filter.predicates() {
        match predicate {
            SalesPredicate::SaleDateFrom(d) => {
                qb.push(" AND s.sale_date >= ").push_bind(d);
            }
            SalesPredicate::SaleDateTo(d) => {
                qb.push(" AND s.sale_date <= ").push_bind(d);
            }
            SalesPredicate::Product(id) => {
                qb.push(" AND p.id = ").push_bind(id.get());
            }
            SalesPredicate::Category(c) => {
                qb.push(" AND p.category = ").push_bind(c.to_owned());
            }
        }
    }
}

/// Bucket key expression; must render the same keys as `Period::bucket_key`.
fn bucket_expr(period: Period) -> &'static str {
    match period {
        Period::Daily => "to_char(s.sale_date, 'YYYY-MM-DD')",
        Period::Weekly => r#"to_char(s.sale_date, 'IYYY-"W"IW')"#,
        Period::Monthly => "to_char(s.sale_date, 'YYYY-MM')",
        Period::Annual => "to_char(s.sale_date, 'YYYY')",
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    #[instrument(skip(self, product), fields(operation = "insert_product", name = %product.name, product_id = tracing::field::Empty), err)]
    async fn insert_product(&self, product: NewProduct) -> StoreResult<ProductId> {
        let mut tx = self.begin().await?;
        let id = insert_product_tx(&mut tx, &product).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Span::current().record("product_id", id.get());
        Ok(id)
    }

    #[instrument(
        skip(self, sale),
        fields(operation = "record_sale", product_id = %sale.product_id, quantity = sale.quantity),
        err
    )]
    async fn record_sale(&self, sale: NewSale) -> StoreResult<SaleId> {
        let mut tx = self.begin().await?;

        // Locks the product row for the rest of the transaction.
        let updated = sqlx::query("UPDATE products SET stock = stock - $1 WHERE id = $2")
            .bind(sale.quantity)
            .bind(sale.product_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("decrement_product_stock", e))?
            .rows_affected();

        if updated == 0 {
            return reject(
                tx,
                DomainError::not_found(format!("product {} not found", sale.product_id)),
            )
            .await;
        }

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sales (product_id, quantity, sale_date)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(sale.product_id.get())
        .bind(sale.quantity)
        .bind(sale.sale_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_sale", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(SaleId::new(id))
    }

    #[instrument(skip(self, products), fields(operation = "replace_products", count = products.len()), err)]
    async fn replace_products(&self, products: Vec<NewProduct>) -> StoreResult<Vec<ProductId>> {
        let mut tx = self.begin().await?;

        sqlx::query("DELETE FROM products")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_products", e))?;

        let mut ids = Vec::with_capacity(products.len());
        for product in &products {
            ids.push(insert_product_tx(&mut tx, product).await?);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(ids)
    }
}

#[async_trait]
impl LedgerStore for PostgresStore {
    #[instrument(skip(self), fields(operation = "list_products", product_count = tracing::field::Empty), err)]
    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query("SELECT id, name, category, price, stock FROM products ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;

        let products = rows
            .iter()
            .map(|row| ProductRow::from_row(row).map(Product::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("decode_product", e))?;

        Span::current().record("product_count", products.len());
        Ok(products)
    }

    #[instrument(skip(self), fields(operation = "snapshot", product_id = %product_id), err)]
    async fn snapshot(&self, product_id: ProductId) -> StoreResult<Option<InventoryStatus>> {
        let row = sqlx::query(
            r#"
            SELECT product_id, stock, change_date
            FROM inventory
            WHERE product_id = $1 AND change_type IS NULL
            "#,
        )
        .bind(product_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("snapshot", e))?;

        row.map(|r| StatusRow::from_row(&r).map(InventoryStatus::from))
            .transpose()
            .map_err(|e| map_sqlx_error("decode_snapshot", e))
    }

    #[instrument(skip(self), fields(operation = "low_stock"), err)]
    async fn low_stock(&self, threshold: i64) -> StoreResult<Vec<InventoryStatus>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, stock, change_date
            FROM inventory
            WHERE change_type IS NULL AND stock < $1
            ORDER BY product_id
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("low_stock", e))?;

        rows.iter()
            .map(|row| StatusRow::from_row(row).map(InventoryStatus::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("decode_snapshot", e))
    }

    /// One transaction: advisory lock, snapshot read (`FOR UPDATE`), stock
    /// rule, movement insert, snapshot upsert.
    #[instrument(
        skip(self, change),
        fields(
            operation = "apply_change",
            product_id = %change.product_id,
            change_type = %change.change_type,
            quantity = change.quantity,
            new_stock = tracing::field::Empty
        ),
        err
    )]
    async fn apply_change(&self, change: InventoryChange) -> StoreResult<i64> {
        let mut tx = self.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(change.product_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("advisory_lock", e))?;

        let current: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT stock
            FROM inventory
            WHERE product_id = $1 AND change_type IS NULL
            FOR UPDATE
            "#,
        )
        .bind(change.product_id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("read_snapshot", e))?;

        let new_stock = match next_stock(current.unwrap_or(0), &change) {
            Ok(n) => n,
            Err(err) => return reject(tx, err).await,
        };

        sqlx::query(
            r#"
            INSERT INTO inventory (product_id, change_type, quantity, stock, change_date, reference)
            VALUES ($1, $2, $3, $4, NOW(), $5)
            "#,
        )
        .bind(change.product_id.get())
        .bind(change.change_type.as_str())
        .bind(change.quantity)
        .bind(new_stock)
        .bind(change.reference.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_movement", e))?;

        sqlx::query(
            r#"
            INSERT INTO inventory (product_id, change_type, quantity, stock, change_date)
            VALUES ($1, NULL, 0, $2, NOW())
            ON CONFLICT (product_id) WHERE change_type IS NULL
            DO UPDATE SET
                stock = EXCLUDED.stock,
                change_date = EXCLUDED.change_date
            "#,
        )
        .bind(change.product_id.get())
        .bind(new_stock)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("upsert_snapshot", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Span::current().record("new_stock", new_stock);
        Ok(new_stock)
    }

    #[instrument(skip(self), fields(operation = "movements", product_id = %product_id), err)]
    async fn movements(&self, product_id: ProductId) -> StoreResult<Vec<InventoryRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, change_type, quantity, stock, change_date, reference
            FROM inventory
            WHERE product_id = $1 AND change_type IS NOT NULL
            ORDER BY id ASC
            "#,
        )
        .bind(product_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("movements", e))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let raw = LedgerRow::from_row(row).map_err(|e| map_sqlx_error("decode_movement", e))?;
            records.push(InventoryRecord::try_from(raw)?);
        }
        Ok(records)
    }
}

#[async_trait]
impl SalesStore for PostgresStore {
    #[instrument(skip(self, filter), fields(operation = "list_sales"), err)]
    async fn list_sales(&self, filter: &SalesFilter, limit: usize) -> StoreResult<Vec<SaleItem>> {
        let mut qb = QueryBuilder::<Postgres>::new(SALE_ITEM_COLUMNS);
        push_sales_filter(&mut qb, filter);
        qb.push(" ORDER BY s.sale_date DESC, s.id DESC LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_sales", e))?;

        rows.iter()
            .map(|row| SaleItemRow::from_row(row).map(SaleItem::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("decode_sale_item", e))
    }

    #[instrument(skip(self, filter), fields(operation = "revenue_by_period", period = period.as_str()), err)]
    async fn revenue_by_period(
        &self,
        filter: &SalesFilter,
        period: Period,
    ) -> StoreResult<Vec<RevenueSummaryItem>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(bucket_expr(period)).push(
            r#" AS period, SUM(s.quantity * p.price) AS revenue
            FROM sales s
            JOIN products p ON s.product_id = p.id
            WHERE TRUE"#,
        );
        push_sales_filter(&mut qb, filter);
        qb.push(" GROUP BY 1 ORDER BY 1");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("revenue_by_period", e))?;

        rows.iter()
            .map(|row| -> Result<RevenueSummaryItem, sqlx::Error> {
                Ok(RevenueSummaryItem {
                    period: row.try_get("period")?,
                    revenue: row.try_get("revenue")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("decode_revenue", e))
    }

    #[instrument(skip(self, filter), fields(operation = "total_revenue"), err)]
    async fn total_revenue(&self, filter: &SalesFilter) -> StoreResult<Decimal> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT COALESCE(SUM(s.quantity * p.price), 0) AS revenue
            FROM sales s
            JOIN products p ON s.product_id = p.id
            WHERE TRUE"#,
        );
        push_sales_filter(&mut qb, filter);

        let row = qb
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("total_revenue", e))?;

        row.try_get("revenue")
            .map_err(|e| map_sqlx_error("decode_revenue", e))
    }
}

/// Map SQLx errors to `StoreError`.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            map_sqlstate(db_err.code().as_deref(), msg)
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool timed out in {}", operation))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("i/o error in {}: {}", operation, e)),
        sqlx::Error::Tls(e) => StoreError::Unavailable(format!("tls error in {}: {}", operation, e)),
        _ => StoreError::Query(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn map_sqlstate(code: Option<&str>, msg: String) -> StoreError {
    match code {
        Some("23503") => StoreError::Domain(DomainError::not_found(msg)),
        // check_violation, numeric_value_out_of_range
        Some("23514") | Some("22003") => StoreError::Domain(DomainError::validation(msg)),
        _ => StoreError::Query(msg),
    }
}

// SQLx row types

#[derive(Debug)]
struct ProductRow {
    id: i64,
    name: String,
    category: String,
    price: Decimal,
    stock: i64,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            category: row.try_get("category")?,
            price: row.try_get("price")?,
            stock: row.try_get("stock")?,
        })
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: ProductId::new(row.id),
            name: row.name,
            category: row.category,
            price: row.price,
            stock: row.stock,
        }
    }
}

#[derive(Debug)]
struct StatusRow {
    product_id: i64,
    stock: i64,
    change_date: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for StatusRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(StatusRow {
            product_id: row.try_get("product_id")?,
            stock: row.try_get("stock")?,
            change_date: row.try_get("change_date")?,
        })
    }
}

impl From<StatusRow> for InventoryStatus {
    fn from(row: StatusRow) -> Self {
        InventoryStatus {
            product_id: ProductId::new(row.product_id),
            stock: row.stock,
            last_updated: row.change_date,
        }
    }
}

#[derive(Debug)]
struct LedgerRow {
    id: i64,
    product_id: i64,
    change_type: Option<String>,
    quantity: i64,
    stock: i64,
    change_date: DateTime<Utc>,
    reference: Option<String>,
}

impl<'r> FromRow<'r, PgRow> for LedgerRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(LedgerRow {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            change_type: row.try_get("change_type")?,
            quantity: row.try_get("quantity")?,
            stock: row.try_get("stock")?,
            change_date: row.try_get("change_date")?,
            reference: row.try_get("reference")?,
        })
    }
}

impl TryFrom<LedgerRow> for InventoryRecord {
    type Error = StoreError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        let change_type = row
            .change_type
            .as_deref()
            .map(str::parse::<ChangeType>)
            .transpose()
            .map_err(|e| StoreError::Query(format!("ledger row {}: {}", row.id, e)))?;

        Ok(InventoryRecord {
            id: MovementId::new(row.id),
            product_id: ProductId::new(row.product_id),
            change_type,
            quantity: row.quantity,
            stock: row.stock,
            change_date: row.change_date,
            reference: row.reference,
        })
    }
}

#[derive(Debug)]
struct SaleItemRow {
    sale_id: i64,
    product_id: i64,
    product_name: String,
    category: String,
    quantity: i64,
    sale_date: NaiveDate,
    price_per_unit: Decimal,
    total_price: Decimal,
}

impl<'r> FromRow<'r, PgRow> for SaleItemRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(SaleItemRow {
            sale_id: row.try_get("sale_id")?,
            product_id: row.try_get("product_id")?,
            product_name: row.try_get("product_name")?,
            category: row.try_get("category")?,
            quantity: row.try_get("quantity")?,
            sale_date: row.try_get("sale_date")?,
            price_per_unit: row.try_get("price_per_unit")?,
            total_price: row.try_get("total_price")?,
        })
    }
}

impl From<SaleItemRow> for SaleItem {
    fn from(row: SaleItemRow) -> Self {
        SaleItem {
            sale_id: SaleId::new(row.sale_id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            category: row.category,
            quantity: row.quantity,
            sale_date: row.sale_date,
            price_per_unit: row.price_per_unit,
            total_price: row.total_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn filter_predicates_become_bound_parameters() {
        let filter = SalesFilter {
            start_date: Some(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            end_date: None,
            product_id: Some(ProductId::new(3)),
            category: Some("x' OR '1'='1".to_string()),
        };
        let mut qb = QueryBuilder::<Postgres>::new(SALE_ITEM_COLUMNS);
        push_sales_filter(&mut qb, &filter);

        let sql = qb.sql();
        assert!(sql.contains("AND s.sale_date >= $1"));
        assert!(sql.contains("AND p.id = $2"));
        assert!(sql.contains("AND p.category = $3"));
        assert!(!sql.contains("OR '1'='1"));
    }

    #[test]
    fn empty_filter_adds_no_conditions() {
        let mut qb = QueryBuilder::<Postgres>::new(SALE_ITEM_COLUMNS);
        push_sales_filter(&mut qb, &SalesFilter::default());
        assert_eq!(qb.sql(), SALE_ITEM_COLUMNS);
    }

    #[test]
    fn bucket_expressions_cover_every_period() {
        assert!(bucket_expr(Period::Weekly).contains("IYYY"));
        assert!(bucket_expr(Period::Weekly).contains("IW"));
        assert!(bucket_expr(Period::Daily).contains("YYYY-MM-DD"));
    }

    #[test]
    fn unknown_change_type_in_row_is_a_query_error() {
        let row = LedgerRow {
            id: 1,
            product_id: 1,
            change_type: Some("TRANSFER".to_string()),
            quantity: 1,
            stock: 1,
            change_date: Utc::now(),
            reference: None,
        };
        assert!(matches!(InventoryRecord::try_from(row), Err(StoreError::Query(_))));
    }

    #[test]
    fn sqlstates_map_to_domain_errors() {
        let msg = || "boom".to_string();
        assert!(matches!(
            map_sqlstate(Some("23503"), msg()),
            StoreError::Domain(DomainError::NotFound(_))
        ));
        assert!(matches!(
            map_sqlstate(Some("23514"), msg()),
            StoreError::Domain(DomainError::Validation(_))
        ));
        assert!(matches!(
            map_sqlstate(Some("22003"), msg()),
            StoreError::Domain(DomainError::Validation(_))
        ));
        assert!(matches!(map_sqlstate(Some("40001"), msg()), StoreError::Query(_)));
        assert!(matches!(map_sqlstate(None, msg()), StoreError::Query(_)));
    }

    #[test]
    fn pool_errors_are_unavailable() {
        assert!(matches!(
            map_sqlx_error("op", sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            map_sqlx_error("op", sqlx::Error::RowNotFound),
            StoreError::Query(_)
        ));
    }
}
