//! # 产品目录服务
//!
//! 基于 axum 的产品目录 REST API：
//! - 产品的增删改查，替换时使用版本号做乐观并发控制
//! - 按名称/描述搜索、价格区间、低库存查询
//! - 活跃产品的聚合统计
//! - Postgres 存储，未配置数据库时使用内存存储

pub mod app;
pub mod config;
pub mod core;
pub mod infrastructure;

pub use app::{create_routes, AppState};
pub use config::{load_config, AppConfig};
