//! Book Commands

use crate::domain::book::Book;

/// 种子数据命令：仓储为空时写入给定书籍
#[derive(Debug, Clone)]
pub struct SeedBooks {
    pub books: Vec<Book>,
}
