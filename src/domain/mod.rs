//! Domain Layer - 领域层
//!
//! 包含:
//! - Book Context: 书籍聚合
//! - 示例数据集

pub mod book;
pub mod seed;
