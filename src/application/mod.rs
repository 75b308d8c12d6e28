//! 应用层 - 用例编排
//!
//! 包含：
//! - projection: 书籍列表投影引擎
//! - commands: CQRS 命令及处理器（种子数据）
//! - ports: 六边形架构端口定义（BookRepository）
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod projection;
pub mod queries;

// Re-exports
pub use error::ApplicationError;

pub use commands::{
    handlers::{SeedBooksHandler, SeedBooksResponse},
    SeedBooks,
};

pub use ports::{BookRepositoryPort, RepositoryError};

pub use projection::{
    project_many, project_one, project_stream, AverageRating, BookFilter, BookListDisplay,
    BookOrder, Page, ProjectionError, ProjectionPlan,
};

pub use queries::{
    GetBookListItem,
    ListBooks,
    ListBooksByRawSql,
    TOP_RATED_SQL,
    // Handlers
    handlers::{GetBookListItemHandler, ListBooksByRawSqlHandler, ListBooksHandler},
};
