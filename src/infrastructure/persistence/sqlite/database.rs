//! SQLite Database - 数据库连接和表结构

use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;

/// 数据库配置
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// 数据库连接 URL
    pub database_url: String,
    /// 最大连接数
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./data/booklist.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            database_url: format!("sqlite:{}?mode=rwc", path.as_ref().display()),
            max_connections: 5,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

/// 数据库连接池
pub type DbPool = Pool<Sqlite>;

/// 创建数据库连接池
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    // 启用 WAL 模式，允许并发读写
    sqlx::query("PRAGMA journal_mode=WAL")
        .execute(&pool)
        .await?;

    // 遇到锁时等待而不是立即失败
    sqlx::query("PRAGMA busy_timeout=5000")
        .execute(&pool)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        "SQLite pool created with WAL mode and busy_timeout=5000ms"
    );

    Ok(pool)
}

/// 创建表结构（幂等）
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS books (
            book_id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            publisher TEXT,
            price_cents INTEGER NOT NULL,
            published_on TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS authors (
            author_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // rowid 记录插入顺序，用于相同 author_order 时的稳定排序
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS book_authors (
            book_id INTEGER NOT NULL,
            author_id INTEGER NOT NULL,
            author_order INTEGER NOT NULL,
            PRIMARY KEY (book_id, author_id),
            FOREIGN KEY (book_id) REFERENCES books(book_id) ON DELETE CASCADE,
            FOREIGN KEY (author_id) REFERENCES authors(author_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            review_id INTEGER PRIMARY KEY AUTOINCREMENT,
            book_id INTEGER NOT NULL,
            voter_name TEXT NOT NULL,
            num_stars INTEGER NOT NULL CHECK (num_stars BETWEEN 1 AND 5),
            comment TEXT,
            FOREIGN KEY (book_id) REFERENCES books(book_id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // new_price_cents 允许为 NULL，读取时由投影报告 InvalidPromotion
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS price_offers (
            price_offer_id INTEGER PRIMARY KEY AUTOINCREMENT,
            book_id INTEGER NOT NULL UNIQUE,
            new_price_cents INTEGER,
            promotional_text TEXT NOT NULL,
            FOREIGN KEY (book_id) REFERENCES books(book_id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_reviews_book_id
        ON reviews(book_id)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_book_authors_book_id
        ON book_authors(book_id)
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_in_memory_db() {
        let config = DatabaseConfig::in_memory();
        let pool = create_pool(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();
        // 重复执行不报错
        run_migrations(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_reviews_reject_out_of_range_stars() {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        sqlx::query(
            "INSERT INTO books (book_id, title, price_cents, published_on) \
             VALUES (1, 'Refactoring', 4000, '1999-07-08T00:00:00+00:00')",
        )
        .execute(&pool)
        .await
        .unwrap();

        for stars in [0, 9] {
            let result = sqlx::query(
                "INSERT INTO reviews (book_id, voter_name, num_stars) VALUES (1, 'voter', ?)",
            )
            .bind(stars)
            .execute(&pool)
            .await;
            assert!(result.is_err(), "stars {}", stars);
        }

        sqlx::query("INSERT INTO reviews (book_id, voter_name, num_stars) VALUES (1, 'voter', 5)")
            .execute(&pool)
            .await
            .unwrap();
    }

    #[test]
    fn test_database_url_from_path() {
        let config = DatabaseConfig::new("/tmp/books.db");
        assert_eq!(config.database_url, "sqlite:/tmp/books.db?mode=rwc");
    }
}
