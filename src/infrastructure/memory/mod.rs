//! Memory Layer - 内存实现
//!
//! 基于 DashMap 的书籍仓储，用于测试和无数据库运行

mod book_repository;

pub use book_repository::InMemoryBookRepository;
