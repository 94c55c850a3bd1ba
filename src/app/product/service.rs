//! 产品业务服务

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

use super::model::{Product, ProductPayload, StatisticsReport, DEFAULT_LOW_STOCK_THRESHOLD};
use super::query::ProductFilter;
use super::repository::{ProductRepository, RepositoryError};
use crate::core::error::CoreError;

#[derive(Clone)]
pub struct ProductService {
    repository: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<dyn ProductRepository> {
        &self.repository
    }

    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, CoreError> {
        let products = self.repository.list(filter).await?;
        Ok(products)
    }

    pub async fn get_product(&self, id: i32) -> Result<Product, CoreError> {
        self.repository.find(id).await?.ok_or_else(|| {
            warn!("Product {} not found", id);
            CoreError::NotFound(format!("Product {} not found", id))
        })
    }

    /// 创建产品，忽略请求中的 id 与版本号
    pub async fn create_product(&self, payload: ProductPayload) -> Result<Product, CoreError> {
        let draft = payload.into_draft()?;
        let product = self.repository.insert(&draft).await?;

        info!("Created product: {} ({})", product.name, product.id);
        Ok(product)
    }

    /// 整体替换产品
    pub async fn replace_product(&self, id: i32, payload: ProductPayload) -> Result<(), CoreError> {
        if payload.id != Some(id) {
            return Err(CoreError::BadRequest(format!(
                "Product id in body ({}) does not match id in path ({})",
                payload
                    .id
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "missing".to_string()),
                id
            )));
        }

        let expected_version = payload.version;
        let draft = payload.into_draft()?;

        let current = self.get_product(id).await?;
        let expected_version = expected_version.unwrap_or(current.version);

        match self.repository.replace(id, &draft, expected_version).await {
            Ok(product) => {
                info!(
                    "Replaced product: {} ({}) version {}",
                    product.name, product.id, product.version
                );
                Ok(())
            }
            Err(err @ RepositoryError::Conflict { .. }) => {
                warn!("Concurrent modification of product {}: {}", id, err);
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn delete_product(&self, id: i32) -> Result<(), CoreError> {
        if !self.repository.delete(id).await? {
            warn!("Product {} not found for deletion", id);
            return Err(CoreError::NotFound(format!("Product {} not found", id)));
        }

        info!("Deleted product: {}", id);
        Ok(())
    }

    /// 不校验 `min <= max`，区间为空时结果为空
    pub async fn search_by_price_range(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<Product>, CoreError> {
        let products = self.repository.price_range(min, max).await?;
        Ok(products)
    }

    pub async fn low_stock(&self, threshold: Option<i32>) -> Result<Vec<Product>, CoreError> {
        let threshold = threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
        let products = self.repository.low_stock(threshold).await?;
        Ok(products)
    }

    pub async fn statistics(&self) -> Result<StatisticsReport, CoreError> {
        let report = self.repository.statistics().await?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::product::memory::InMemoryProductRepository;
    use crate::app::product::model::ProductStatistics;
    use rust_decimal_macros::dec;

    fn service() -> ProductService {
        ProductService::new(Arc::new(InMemoryProductRepository::new()))
    }

    fn payload(name: &str, price: Decimal, stock: i32) -> ProductPayload {
        ProductPayload {
            name: name.to_string(),
            price,
            stock,
            ..Default::default()
        }
    }

    async fn seeded() -> (ProductService, Vec<Product>) {
        let service = service();
        let mut created = Vec::new();
        for (name, price, stock) in [
            ("Ten", dec!(10.00), 1),
            ("Twenty", dec!(20.00), 2),
            ("Thirty", dec!(30.00), 3),
        ] {
            created.push(
                service
                    .create_product(payload(name, price, stock))
                    .await
                    .unwrap(),
            );
        }
        (service, created)
    }

    #[tokio::test]
    async fn test_create_ignores_supplied_id() {
        let service = service();
        let mut p = payload("Widget", dec!(5.00), 4);
        p.id = Some(500);
        p.version = Some(42);

        let created = service.create_product(p).await.unwrap();
        assert_ne!(created.id, 500);
        assert_eq!(created.version, 1);
        assert!(created.is_active);

        let fetched = service.get_product(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid() {
        let service = service();
        let result = service.create_product(payload("", dec!(1.00), 1)).await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
        assert!(service.list_products(&ProductFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let (service, created) = seeded().await;
        let id = created[0].id;

        service.delete_product(id).await.unwrap();
        assert!(matches!(
            service.get_product(id).await,
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_product(id).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_replace_id_mismatch_is_bad_request() {
        let (service, created) = seeded().await;
        let existing = created[0].id;

        let mut p = payload("Changed", dec!(1.00), 1);
        p.id = Some(existing + 100);
        assert!(matches!(
            service.replace_product(existing, p.clone()).await,
            Err(CoreError::BadRequest(_))
        ));

        // 路径 id 不存在时同样是 BadRequest
        assert!(matches!(
            service.replace_product(9999, p).await,
            Err(CoreError::BadRequest(_))
        ));

        let missing_id = payload("Changed", dec!(1.00), 1);
        assert!(matches!(
            service.replace_product(existing, missing_id).await,
            Err(CoreError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_replace_overwrites_fields() {
        let (service, created) = seeded().await;
        let original = &created[1];

        let mut p = payload("Twenty Renamed", dec!(25.00), 7);
        p.id = Some(original.id);
        p.description = Some("updated".to_string());
        p.is_active = Some(false);
        service.replace_product(original.id, p).await.unwrap();

        let fetched = service.get_product(original.id).await.unwrap();
        assert_eq!(fetched.name, "Twenty Renamed");
        assert_eq!(fetched.price, dec!(25.00));
        assert_eq!(fetched.stock, 7);
        assert_eq!(fetched.description.as_deref(), Some("updated"));
        assert!(!fetched.is_active);
        assert_eq!(fetched.created_date, original.created_date);
        assert_eq!(fetched.version, original.version + 1);
    }

    #[tokio::test]
    async fn test_replace_missing_and_stale() {
        let (service, created) = seeded().await;

        let mut missing = payload("Ghost", dec!(1.00), 1);
        missing.id = Some(9999);
        assert!(matches!(
            service.replace_product(9999, missing).await,
            Err(CoreError::NotFound(_))
        ));

        let target = &created[2];
        let mut first = payload("First", dec!(1.00), 1);
        first.id = Some(target.id);
        first.version = Some(target.version);
        service.replace_product(target.id, first).await.unwrap();

        let mut stale = payload("Stale", dec!(2.00), 2);
        stale.id = Some(target.id);
        stale.version = Some(target.version);
        assert!(matches!(
            service.replace_product(target.id, stale).await,
            Err(CoreError::Conflict(_))
        ));
        assert_eq!(service.get_product(target.id).await.unwrap().name, "First");
    }

    #[tokio::test]
    async fn test_replace_validates_payload() {
        let (service, created) = seeded().await;
        let mut p = payload("Bad", dec!(-1.00), 1);
        p.id = Some(created[0].id);
        assert!(matches!(
            service.replace_product(created[0].id, p).await,
            Err(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_statistics_and_searches() {
        let (service, _) = seeded().await;

        assert_eq!(
            service.statistics().await.unwrap(),
            StatisticsReport::Available(ProductStatistics {
                total_products: 3,
                total_value: dec!(140.00),
                average_price: dec!(20.00),
                min_price: dec!(10.00),
                max_price: dec!(30.00),
                total_stock: 6,
            })
        );

        let exact = service
            .search_by_price_range(dec!(20.00), dec!(20.00))
            .await
            .unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].price, dec!(20.00));

        let inverted = service
            .search_by_price_range(dec!(30.00), dec!(10.00))
            .await
            .unwrap();
        assert!(inverted.is_empty());

        let low = service.low_stock(Some(2)).await.unwrap();
        let stocks: Vec<i32> = low.iter().map(|p| p.stock).collect();
        assert_eq!(stocks, vec![1, 2]);

        let default_threshold = service.low_stock(None).await.unwrap();
        assert_eq!(default_threshold.len(), 3);
    }

    #[tokio::test]
    async fn test_statistics_without_active_products() {
        let service = service();
        assert_eq!(service.statistics().await.unwrap(), StatisticsReport::Empty);

        let mut inactive = payload("Hidden", dec!(3.00), 3);
        inactive.is_active = Some(false);
        service.create_product(inactive).await.unwrap();
        assert_eq!(service.statistics().await.unwrap(), StatisticsReport::Empty);
    }

    #[tokio::test]
    async fn test_statistics_overflow_is_internal_error() {
        let service = service();
        for i in 0..4000 {
            service
                .create_product(payload(
                    &format!("Bulk {}", i),
                    dec!(9999999999999999.99),
                    i32::MAX,
                ))
                .await
                .unwrap();
        }

        assert!(matches!(
            service.statistics().await,
            Err(CoreError::InternalServerError(_))
        ));
    }

    #[tokio::test]
    async fn test_list_sorted_by_name() {
        let (service, _) = seeded().await;
        let products = service
            .list_products(&ProductFilter::default())
            .await
            .unwrap();
        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Ten", "Thirty", "Twenty"]);

        let none = service
            .list_products(&ProductFilter {
                search: Some("nothing matches".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
