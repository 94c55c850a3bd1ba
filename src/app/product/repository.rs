//! 产品存储抽象

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::model::{Product, ProductDraft, StatisticsReport};
use super::query::ProductFilter;
use crate::core::error::CoreError;

/// 存储层错误
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("product {0} not found")]
    NotFound(i32),
    #[error("product {id} was modified concurrently (expected version {expected_version})")]
    Conflict { id: i32, expected_version: i64 },
    #[error("statistics overflow in {0}")]
    Overflow(&'static str),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<RepositoryError> for CoreError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => CoreError::NotFound(format!("Product {} not found", id)),
            RepositoryError::Conflict { id, .. } => CoreError::Conflict(format!(
                "Product {} was modified by another request, reload and retry",
                id
            )),
            RepositoryError::Overflow(field) => {
                CoreError::InternalServerError(format!("statistics overflow in {}", field))
            }
            RepositoryError::Database(e) => CoreError::InternalServerError(e.to_string()),
        }
    }
}

/// 产品持久化接口
///
/// 每个操作都是单条记录或单次查询，由实现保证原子性。
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// 按条件查询，名称升序
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError>;

    async fn find(&self, id: i32) -> Result<Option<Product>, RepositoryError>;

    /// 插入新记录，id 与版本号由存储分配
    async fn insert(&self, draft: &ProductDraft) -> Result<Product, RepositoryError>;

    /// 仅当当前版本等于 `expected_version` 时覆盖记录
    async fn replace(
        &self,
        id: i32,
        draft: &ProductDraft,
        expected_version: i64,
    ) -> Result<Product, RepositoryError>;

    /// 返回是否删除了记录
    async fn delete(&self, id: i32) -> Result<bool, RepositoryError>;

    /// 活跃产品中价格在区间内的，价格升序
    async fn price_range(&self, min: Decimal, max: Decimal)
        -> Result<Vec<Product>, RepositoryError>;

    /// 活跃产品中库存不高于阈值的，库存升序
    async fn low_stock(&self, threshold: i32) -> Result<Vec<Product>, RepositoryError>;

    async fn statistics(&self) -> Result<StatisticsReport, RepositoryError>;

    async fn count(&self) -> Result<i64, RepositoryError>;

    /// 存储连通性检查
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// 存储类型名称，用于健康检查
    fn kind(&self) -> &'static str;
}
