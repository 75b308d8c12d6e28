//! Infrastructure Layer - 基础设施层
//!
//! 提供 BookRepositoryPort 的 SQLite 与内存实现，以及 HTTP 入口

pub mod http;
pub mod memory;
pub mod persistence;

pub use memory::InMemoryBookRepository;
pub use persistence::sqlite::SqliteBookRepository;
