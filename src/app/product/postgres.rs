//! Postgres 存储实现

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{postgres::PgPool, Postgres, QueryBuilder};

use super::model::{Product, ProductDraft, ProductStatistics, StatisticsReport, MAX_TOTAL_VALUE};
use super::query::{self, ProductFilter};
use super::repository::{ProductRepository, RepositoryError};

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, stock, created_date, is_active, version";

#[derive(Debug, sqlx::FromRow)]
struct StatisticsRow {
    total_products: i64,
    total_value: Option<Decimal>,
    total_value_fits: bool,
    average_price: Option<Decimal>,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    total_stock: Option<i64>,
}

impl StatisticsRow {
    fn into_report(self) -> Result<StatisticsReport, RepositoryError> {
        if !self.total_value_fits {
            return Err(RepositoryError::Overflow("totalValue"));
        }

        let report = match (self.average_price, self.min_price, self.max_price) {
            (Some(average_price), Some(min_price), Some(max_price)) if self.total_products > 0 => {
                StatisticsReport::Available(ProductStatistics {
                    total_products: self.total_products,
                    total_value: self.total_value.unwrap_or_default(),
                    average_price,
                    min_price,
                    max_price,
                    total_stock: self.total_stock.unwrap_or_default(),
                })
            }
            _ => StatisticsReport::Empty,
        };
        Ok(report)
    }
}

#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: i32) -> Result<bool, RepositoryError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists.0)
    }
}

/// 按过滤条件拼接列表查询
fn build_list_query(filter: &ProductFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM products WHERE TRUE", PRODUCT_COLUMNS));

    if let Some(term) = filter.search_term() {
        let pattern = query::like_pattern(term);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(min_price) = filter.min_price {
        builder.push(" AND price >= ").push_bind(min_price);
    }

    if let Some(max_price) = filter.max_price {
        builder.push(" AND price <= ").push_bind(max_price);
    }

    if let Some(is_active) = filter.is_active {
        builder.push(" AND is_active = ").push_bind(is_active);
    }

    // 字节序，与内存存储一致
    builder.push(" ORDER BY name COLLATE \"C\" ASC, id ASC");
    builder
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let mut builder = build_list_query(filter);
        let products = builder
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn find(&self, id: i32) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn insert(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (name, description, price, stock, created_date, is_active) \
             VALUES ($1, $2, $3, $4, COALESCE($5, NOW()), $6) \
             RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.stock)
        .bind(draft.created_date)
        .bind(draft.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(product)
    }

    async fn replace(
        &self,
        id: i32,
        draft: &ProductDraft,
        expected_version: i64,
    ) -> Result<Product, RepositoryError> {
        let updated = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET name = $1, description = $2, price = $3, stock = $4, \
             created_date = COALESCE($5, created_date), is_active = $6, version = version + 1 \
             WHERE id = $7 AND version = $8 \
             RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.stock)
        .bind(draft.created_date)
        .bind(draft.is_active)
        .bind(id)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(product) = updated {
            return Ok(product);
        }

        // 没有命中：记录已删除或版本已变化
        if self.exists(id).await? {
            Err(RepositoryError::Conflict {
                id,
                expected_version,
            })
        } else {
            Err(RepositoryError::NotFound(id))
        }
    }

    async fn delete(&self, id: i32) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn price_range(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products \
             WHERE price >= $1 AND price <= $2 AND is_active \
             ORDER BY price ASC, id ASC",
            PRODUCT_COLUMNS
        ))
        .bind(min)
        .bind(max)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn low_stock(&self, threshold: i32) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products \
             WHERE stock <= $1 AND is_active \
             ORDER BY stock ASC, id ASC",
            PRODUCT_COLUMNS
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn statistics(&self) -> Result<StatisticsReport, RepositoryError> {
        let row = sqlx::query_as::<_, StatisticsRow>(
            r#"
            SELECT
                COUNT(*) AS total_products,
                CASE WHEN SUM(price * stock) <= $1 THEN SUM(price * stock) END AS total_value,
                COALESCE(SUM(price * stock) <= $1, TRUE) AS total_value_fits,
                ROUND(AVG(price), 2) AS average_price,
                MIN(price) AS min_price,
                MAX(price) AS max_price,
                SUM(stock)::BIGINT AS total_stock
            FROM products
            WHERE is_active
            "#,
        )
        .bind(MAX_TOTAL_VALUE)
        .fetch_one(&self.pool)
        .await?;
        row.into_report()
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "postgres"
    }
}
