//! 产品查询语义：过滤条件、排序规则与统计聚合
//!
//! 内存存储直接使用这些函数；Postgres 存储用 SQL 表达同样的语义。

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use std::cmp::Ordering;

use super::model::{Product, ProductStatistics, StatisticsReport, MAX_TOTAL_VALUE, PRICE_SCALE};
use super::repository::RepositoryError;

/// 列表查询条件，各条件之间为"且"关系
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    /// 名称或描述包含该子串（不区分大小写）
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl ProductFilter {
    /// 空字符串视为未提供
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(term) = self.search_term() {
            let needle = term.to_lowercase();
            let in_name = product.name.to_lowercase().contains(&needle);
            let in_description = product
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !in_name && !in_description {
                return false;
            }
        }

        if let Some(min_price) = self.min_price {
            if product.price < min_price {
                return false;
            }
        }

        if let Some(max_price) = self.max_price {
            if product.price > max_price {
                return false;
            }
        }

        if let Some(is_active) = self.is_active {
            if product.is_active != is_active {
                return false;
            }
        }

        true
    }
}

/// 按名称字节序升序（大写字母排在小写之前），名称相同按 id
pub fn by_name(a: &Product, b: &Product) -> Ordering {
    a.name.cmp(&b.name).then(a.id.cmp(&b.id))
}

/// 按价格升序，价格相同按 id
pub fn by_price(a: &Product, b: &Product) -> Ordering {
    a.price.cmp(&b.price).then(a.id.cmp(&b.id))
}

/// 按库存升序，库存相同按 id
pub fn by_stock(a: &Product, b: &Product) -> Ordering {
    a.stock.cmp(&b.stock).then(a.id.cmp(&b.id))
}

/// 活跃且 `min <= price <= max`
pub fn in_price_range(product: &Product, min: Decimal, max: Decimal) -> bool {
    product.is_active && product.price >= min && product.price <= max
}

/// 活跃且 `stock <= threshold`
pub fn is_low_stock(product: &Product, threshold: i32) -> bool {
    product.is_active && product.stock <= threshold
}

/// 平均价格保留两位小数，中点远离零（与 SQL ROUND 一致）
pub fn round_price(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// 单次遍历计算统计值
#[derive(Debug, Default)]
pub struct StatisticsAccumulator {
    count: i64,
    total_value: Decimal,
    price_sum: Decimal,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    total_stock: i64,
}

impl StatisticsAccumulator {
    /// 累加一条记录；合计超过 [`MAX_TOTAL_VALUE`] 时返回 `Overflow`
    pub fn push(&mut self, product: &Product) -> Result<(), RepositoryError> {
        self.total_value = product
            .price
            .checked_mul(Decimal::from(product.stock))
            .and_then(|value| self.total_value.checked_add(value))
            .filter(|total| *total <= MAX_TOTAL_VALUE)
            .ok_or(RepositoryError::Overflow("totalValue"))?;
        self.price_sum = self
            .price_sum
            .checked_add(product.price)
            .ok_or(RepositoryError::Overflow("averagePrice"))?;
        self.total_stock = self
            .total_stock
            .checked_add(i64::from(product.stock))
            .ok_or(RepositoryError::Overflow("totalStock"))?;
        self.count += 1;
        self.min_price = Some(match self.min_price {
            Some(current) => current.min(product.price),
            None => product.price,
        });
        self.max_price = Some(match self.max_price {
            Some(current) => current.max(product.price),
            None => product.price,
        });
        Ok(())
    }

    pub fn finish(self) -> StatisticsReport {
        match (self.min_price, self.max_price) {
            (Some(min_price), Some(max_price)) if self.count > 0 => {
                StatisticsReport::Available(ProductStatistics {
                    total_products: self.count,
                    total_value: self.total_value,
                    average_price: round_price(self.price_sum / Decimal::from(self.count)),
                    min_price,
                    max_price,
                    total_stock: self.total_stock,
                })
            }
            _ => StatisticsReport::Empty,
        }
    }
}

/// 统计所有活跃产品
pub fn active_statistics<'a, I>(products: I) -> Result<StatisticsReport, RepositoryError>
where
    I: IntoIterator<Item = &'a Product>,
{
    let mut acc = StatisticsAccumulator::default();
    for product in products.into_iter().filter(|p| p.is_active) {
        acc.push(product)?;
    }
    Ok(acc.finish())
}

/// 转义 LIKE 模式中的通配符，使搜索词按字面匹配
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn product(id: i32, name: &str, price: Decimal, stock: i32, is_active: bool) -> Product {
        Product {
            id,
            name: name.to_string(),
            description: None,
            price,
            stock,
            created_date: Utc::now(),
            is_active,
            version: 1,
        }
    }

    fn fixture() -> Vec<Product> {
        vec![
            product(1, "Gamma", dec!(30.00), 3, true),
            product(2, "Alpha", dec!(10.00), 1, true),
            product(3, "Beta", dec!(20.00), 2, true),
        ]
    }

    #[test]
    fn test_statistics_known_set() {
        let report = active_statistics(&fixture()).unwrap();
        assert_eq!(
            report,
            StatisticsReport::Available(ProductStatistics {
                total_products: 3,
                total_value: dec!(140.00),
                average_price: dec!(20.00),
                min_price: dec!(10.00),
                max_price: dec!(30.00),
                total_stock: 6,
            })
        );
    }

    #[test]
    fn test_statistics_ignores_inactive() {
        let mut products = fixture();
        products.push(product(4, "Delta", dec!(1000.00), 100, false));
        match active_statistics(&products).unwrap() {
            StatisticsReport::Available(stats) => {
                assert_eq!(stats.total_products, 3);
                assert_eq!(stats.max_price, dec!(30.00));
                assert_eq!(stats.total_stock, 6);
            }
            StatisticsReport::Empty => panic!("expected statistics"),
        }
    }

    #[test]
    fn test_statistics_empty() {
        let none: Vec<Product> = Vec::new();
        assert_eq!(active_statistics(&none).unwrap(), StatisticsReport::Empty);

        let inactive = vec![product(1, "Off", dec!(5.00), 1, false)];
        assert_eq!(active_statistics(&inactive).unwrap(), StatisticsReport::Empty);
    }

    #[test]
    fn test_statistics_total_value_overflow() {
        let max_price = dec!(9999999999999999.99);
        let products: Vec<Product> = (1..=4000)
            .map(|id| product(id, "Bulk", max_price, i32::MAX, true))
            .collect();

        assert!(matches!(
            active_statistics(&products),
            Err(RepositoryError::Overflow("totalValue"))
        ));

        // 非活跃记录不参与累加
        let inactive: Vec<Product> = (1..=4000)
            .map(|id| product(id, "Bulk", max_price, i32::MAX, false))
            .collect();
        assert_eq!(active_statistics(&inactive).unwrap(), StatisticsReport::Empty);
    }

    #[test]
    fn test_average_rounding() {
        let products = vec![
            product(1, "A", dec!(0.01), 1, true),
            product(2, "B", dec!(0.02), 1, true),
        ];
        match active_statistics(&products).unwrap() {
            StatisticsReport::Available(stats) => assert_eq!(stats.average_price, dec!(0.02)),
            StatisticsReport::Empty => panic!("expected statistics"),
        }
    }

    #[test]
    fn test_filter_conjunction() {
        let products = fixture();
        let filter = ProductFilter {
            min_price: Some(dec!(15.00)),
            max_price: Some(dec!(30.00)),
            is_active: Some(true),
            ..Default::default()
        };
        let ids: Vec<i32> = products
            .iter()
            .filter(|p| filter.matches(p))
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_search_name_or_description_case_insensitive() {
        let mut lamp = product(1, "Desk Lamp", dec!(20.00), 5, true);
        lamp.description = Some("Warm LED light".to_string());
        let chair = product(2, "Chair", dec!(50.00), 5, true);

        let by_name = ProductFilter {
            search: Some("lamp".to_string()),
            ..Default::default()
        };
        assert!(by_name.matches(&lamp));
        assert!(!by_name.matches(&chair));

        let by_description = ProductFilter {
            search: Some("led".to_string()),
            ..Default::default()
        };
        assert!(by_description.matches(&lamp));
        assert!(!by_description.matches(&chair));
    }

    #[test]
    fn test_empty_search_is_ignored() {
        let filter = ProductFilter {
            search: Some(String::new()),
            ..Default::default()
        };
        assert!(filter.search_term().is_none());
        assert!(fixture().iter().all(|p| filter.matches(p)));
    }

    #[test]
    fn test_orderings() {
        let mut products = fixture();

        products.sort_by(by_name);
        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);

        products.sort_by(by_stock);
        let stocks: Vec<i32> = products.iter().map(|p| p.stock).collect();
        assert_eq!(stocks, vec![1, 2, 3]);

        products.sort_by(by_price);
        let prices: Vec<Decimal> = products.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![dec!(10.00), dec!(20.00), dec!(30.00)]);
    }

    #[test]
    fn test_name_order_is_bytewise() {
        let mut products = vec![
            product(1, "apple", dec!(1.00), 1, true),
            product(2, "Zebra", dec!(1.00), 1, true),
            product(3, "Apple", dec!(1.00), 1, true),
            product(4, "Zebra", dec!(1.00), 1, true),
        ];
        products.sort_by(by_name);
        let ids: Vec<i32> = products.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 2, 4, 1]);
    }

    #[test]
    fn test_price_range_and_low_stock_predicates() {
        let products = fixture();
        let exact: Vec<i32> = products
            .iter()
            .filter(|p| in_price_range(p, dec!(20.00), dec!(20.00)))
            .map(|p| p.id)
            .collect();
        assert_eq!(exact, vec![3]);

        assert!(!products
            .iter()
            .any(|p| in_price_range(p, dec!(30.00), dec!(10.00))));

        let low: Vec<i32> = products
            .iter()
            .filter(|p| is_low_stock(p, 2))
            .map(|p| p.id)
            .collect();
        assert_eq!(low, vec![2, 3]);
    }

    #[test]
    fn test_like_pattern_escaping() {
        assert_eq!(like_pattern("lamp"), "%lamp%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
