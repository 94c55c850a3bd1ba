//! 产品数据模型与输入校验

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use crate::core::error::CoreError;

/// 价格列为 NUMERIC(18,2)
pub const PRICE_SCALE: u32 = 2;

/// 保留两位小数时 `Decimal` 能表示的最大合计值
pub const MAX_TOTAL_VALUE: Decimal = Decimal::from_parts(u32::MAX, u32::MAX, u32::MAX, false, PRICE_SCALE);

/// 低库存默认阈值
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

/// 已持久化的产品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub created_date: DateTime<Utc>,
    pub is_active: bool,
    pub version: i64,
}

/// 创建/替换请求体
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    /// 创建时忽略；替换时必须与路径 id 一致
    #[serde(default)]
    pub id: Option<i32>,

    #[validate(
        length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    #[serde(default)]
    pub description: Option<String>,

    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,

    #[validate(range(min = 0, message = "Stock must not be negative"))]
    pub stock: i32,

    #[serde(default)]
    pub is_active: Option<bool>,

    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,

    /// 乐观并发令牌，仅替换时使用
    #[serde(default)]
    pub version: Option<i64>,
}

/// 通过校验、可以交给存储层的产品数据
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub is_active: bool,
    pub created_date: Option<DateTime<Utc>>,
}

impl ProductPayload {
    /// 校验并转换为 [`ProductDraft`]
    pub fn into_draft(self) -> Result<ProductDraft, CoreError> {
        self.validate()?;

        Ok(ProductDraft {
            name: self.name.trim().to_string(),
            description: self.description,
            price: self.price,
            stock: self.stock,
            is_active: self.is_active.unwrap_or(true),
            created_date: self.created_date,
        })
    }
}

impl ProductDraft {
    /// 按草稿生成完整记录，`created_date` 缺省时取 `now`
    pub fn to_product(&self, id: i32, version: i64, now: DateTime<Utc>) -> Product {
        Product {
            id,
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            stock: self.stock,
            created_date: self.created_date.unwrap_or(now),
            is_active: self.is_active,
            version,
        }
    }
}

fn violation(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn validate_not_blank(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(violation("blank", "Name must not be blank"));
    }
    Ok(())
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(violation("range", "Price must not be negative"));
    }
    if price.normalize().scale() > PRICE_SCALE {
        return Err(violation("scale", "Price must have at most 2 decimal places"));
    }
    // NUMERIC(18,2) 的整数部分最多 16 位
    if price.trunc() >= Decimal::from(10_000_000_000_000_000_i64) {
        return Err(violation("range", "Price is too large"));
    }
    Ok(())
}

/// 活跃产品的聚合统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStatistics {
    pub total_products: i64,
    pub total_value: Decimal,
    pub average_price: Decimal,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub total_stock: i64,
}

/// 统计结果；没有活跃产品时为 `Empty`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatisticsReport {
    Empty,
    Available(ProductStatistics),
}
