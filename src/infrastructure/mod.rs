//! 基础设施：数据库连接与日志

pub mod database;
pub mod logger;

pub use database::{seed_sample_products, DatabaseManager};
pub use logger::Logger;
