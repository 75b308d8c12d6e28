//! Persistence Layer - 数据持久化

pub mod sqlite;
