//! 产品目录：模型、查询语义、存储与 HTTP 处理器

pub mod handler;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod query;
pub mod repository;
pub mod service;

pub use memory::InMemoryProductRepository;
pub use model::{Product, ProductPayload, ProductStatistics, StatisticsReport};
pub use postgres::PgProductRepository;
pub use query::ProductFilter;
pub use repository::{ProductRepository, RepositoryError};
pub use service::ProductService;
