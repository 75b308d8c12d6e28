//! Booklist - 书籍列表读模型投影服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Book 聚合：书籍、作者链接、促销、书评
//! - 种子数据：四本示例书
//!
//! 应用层 (application/):
//! - Projection: Book → BookListDisplay 投影引擎与投影计划
//! - Ports: BookRepositoryPort
//! - Commands / Queries: CQRS 处理器
//!
//! 基础设施层 (infrastructure/):
//! - Persistence: SQLite 仓储（投影下推、原始 SQL）
//! - Memory: 内存仓储
//! - HTTP: 只读 RESTful API

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
