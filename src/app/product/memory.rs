//! 内存存储实现
//!
//! 未配置数据库时使用，也用于测试。

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::model::{Product, ProductDraft, StatisticsReport};
use super::query::{self, ProductFilter};
use super::repository::{ProductRepository, RepositoryError};

#[derive(Debug)]
struct MemoryState {
    /// 已分配 id 不回收
    next_id: i32,
    products: BTreeMap<i32, Product>,
}

#[derive(Debug)]
pub struct InMemoryProductRepository {
    state: RwLock<MemoryState>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                next_id: 1,
                products: BTreeMap::new(),
            }),
        }
    }

    async fn select<F, C>(&self, predicate: F, order: C) -> Vec<Product>
    where
        F: Fn(&Product) -> bool,
        C: Fn(&Product, &Product) -> std::cmp::Ordering,
    {
        let state = self.state.read().await;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| predicate(p))
            .cloned()
            .collect();
        products.sort_by(order);
        products
    }
}

impl Default for InMemoryProductRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.select(|p| filter.matches(p), query::by_name).await)
    }

    async fn find(&self, id: i32) -> Result<Option<Product>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.products.get(&id).cloned())
    }

    async fn insert(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let mut state = self.state.write().await;
        let id = state.next_id;
        state.next_id += 1;

        let product = draft.to_product(id, 1, chrono::Utc::now());
        state.products.insert(id, product.clone());
        Ok(product)
    }

    async fn replace(
        &self,
        id: i32,
        draft: &ProductDraft,
        expected_version: i64,
    ) -> Result<Product, RepositoryError> {
        let mut state = self.state.write().await;
        let current = state
            .products
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound(id))?;

        if current.version != expected_version {
            return Err(RepositoryError::Conflict {
                id,
                expected_version,
            });
        }

        let replaced = draft.to_product(id, current.version + 1, current.created_date);
        *current = replaced.clone();
        Ok(replaced)
    }

    async fn delete(&self, id: i32) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        Ok(state.products.remove(&id).is_some())
    }

    async fn price_range(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .select(|p| query::in_price_range(p, min, max), query::by_price)
            .await)
    }

    async fn low_stock(&self, threshold: i32) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .select(|p| query::is_low_stock(p, threshold), query::by_stock)
            .await)
    }

    async fn statistics(&self) -> Result<StatisticsReport, RepositoryError> {
        let state = self.state.read().await;
        let report = query::active_statistics(state.products.values())?;
        Ok(report)
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.products.len() as i64)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "in-memory"
    }
}
