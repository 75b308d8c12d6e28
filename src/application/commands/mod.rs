//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：目前只有种子数据写入

mod book_commands;

pub mod handlers;

pub use book_commands::*;
