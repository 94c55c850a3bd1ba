use std::{sync::Arc, time::Duration};

use product_catalog::{
    app::{
        create_routes,
        product::{InMemoryProductRepository, PgProductRepository, ProductRepository},
        AppState,
    },
    config::{find_config_file, load_config},
    infrastructure::{seed_sample_products, DatabaseManager, Logger},
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_file = find_config_file();
    let config = load_config(config_file)?;
    Logger::init(&config.logging)?;

    match config_file {
        Some(path) => info!("Loaded configuration from {}", path),
        None => info!("No configuration file found, using defaults"),
    }

    info!("Starting product catalog server...");

    // 有连接串时使用 Postgres，否则退回内存存储
    let repository: Arc<dyn ProductRepository> = match config.database.url.as_deref() {
        Some(url) => {
            let db = DatabaseManager::new(url, &config.database)
                .await
                .map_err(|e| {
                    error!("Failed to initialize database: {}", e);
                    e
                })?;
            db.create_tables().await?;
            Arc::new(PgProductRepository::new(db.get_pool().clone()))
        }
        None => {
            warn!("No database configured, products are kept in memory only");
            Arc::new(InMemoryProductRepository::new())
        }
    };

    if config.database.seed {
        seed_sample_products(repository.as_ref()).await?;
    }

    let state = AppState::new(repository);
    let app = create_routes(state, Duration::from_secs(config.server.timeout_seconds));

    let listener = TcpListener::bind(config.listen_address()).await?;
    let addr = listener.local_addr()?;

    info!("🚀 Product catalog server running on http://{}", addr);
    info!("📊 Available endpoints:");
    info!("   GET    /health                                - Health check");
    info!("   GET    /api/products                          - List products (supports ?search=&minPrice=&maxPrice=&isActive=)");
    info!("   POST   /api/products                          - Create product");
    info!("   GET    /api/products/:id                      - Get product by ID");
    info!("   PUT    /api/products/:id                      - Replace product");
    info!("   DELETE /api/products/:id                      - Delete product");
    info!("   GET    /api/products/search-by-price-range    - Products within ?minPrice=&maxPrice=");
    info!("   GET    /api/products/low-stock                - Active products with stock <= ?threshold= (default 10)");
    info!("   GET    /api/products/statistics               - Aggregates over active products");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received, draining connections...");
}
