//! Booklist - 书籍列表读模型投影服务

use std::sync::Arc;

use booklist::application::{SeedBooks, SeedBooksHandler};
use booklist::config::{load_config, print_config, LogConfig};
use booklist::domain::seed::four_books;
use booklist::infrastructure::http::{AppState, HttpServer, ListingLimits, ServerConfig};
use booklist::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteBookRepository,
};

fn init_tracing(log: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log.filter_directive()));

    if log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);

    tracing::info!("Booklist - 书籍列表投影服务");
    print_config(&config);

    // 确保数据目录存在
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;

    let book_repo = Arc::new(SqliteBookRepository::new(pool));

    if config.seed.enabled {
        let books = four_books().map_err(|e| anyhow::anyhow!("Invalid seed data: {}", e))?;
        let seeded = SeedBooksHandler::new(book_repo.clone())
            .handle(SeedBooks { books })
            .await?;
        tracing::info!(inserted = seeded.inserted, existing = seeded.existing, "Seed finished");
    }

    let listing = ListingLimits {
        default_page_size: config.listing.default_page_size,
        max_page_size: config.listing.max_page_size,
    };
    let state = AppState::new(book_repo, listing);
    let server = HttpServer::new(
        ServerConfig::new(&config.server.host, config.server.port),
        state,
    );

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
