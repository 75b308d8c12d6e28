//! Repository Ports - 出站端口
//!
//! 定义书籍聚合检索的抽象接口
//! 具体实现在 infrastructure 层（SQLite、内存）

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::TryStreamExt;
use thiserror::Error;

use crate::application::projection::{BookListDisplay, ProjectionError, ProjectionPlan};
use crate::domain::book::{Book, BookId, BookIncludes};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

/// Book Repository Port
#[async_trait]
pub trait BookRepositoryPort: Send + Sync {
    /// 保存完整聚合（仅写入已加载的关联）
    async fn save(&self, book: &Book) -> Result<(), RepositoryError>;

    /// 书籍总数
    async fn count(&self) -> Result<u64, RepositoryError>;

    /// 根据 ID 查找，按 `includes` 加载关联
    async fn find_by_id(
        &self,
        id: BookId,
        includes: BookIncludes,
    ) -> Result<Option<Book>, RepositoryError>;

    /// 按 ID 升序惰性读取全部聚合
    fn stream_books(&self, includes: BookIncludes) -> BoxStream<'_, Result<Book, RepositoryError>>;

    /// 原始 SQL 逃生口
    ///
    /// `sql` 必须返回 books 表的行，结果保持 SQL 给出的顺序
    async fn find_by_raw_sql(
        &self,
        sql: &str,
        includes: BookIncludes,
    ) -> Result<Vec<Book>, RepositoryError>;

    /// 执行投影计划
    ///
    /// 默认在进程内执行；能把映射翻译为原生查询的实现应覆盖此方法
    async fn project_list(
        &self,
        plan: &ProjectionPlan,
    ) -> Result<Vec<BookListDisplay>, RepositoryError> {
        let books: Vec<Book> = self.stream_books(BookIncludes::all()).try_collect().await?;
        plan.apply(books)
            .collect::<Result<Vec<_>, _>>()
            .map_err(RepositoryError::from)
    }
}
