//! Book Queries

use crate::application::projection::{BookFilter, BookOrder, Page};
use crate::domain::book::BookId;

/// 按平均评分倒序列出书籍的原始 SQL
///
/// 平均值由数据库计算，无评论的书（AVG 为 NULL）排在最后
pub const TOP_RATED_SQL: &str = "SELECT * FROM books AS a \
     ORDER BY (SELECT AVG(b.num_stars) FROM reviews AS b WHERE b.book_id = a.book_id) DESC, a.book_id";

/// 获取单本书的列表展示
#[derive(Debug, Clone)]
pub struct GetBookListItem {
    pub book_id: BookId,
}

/// 列出书籍（可排序、过滤、分页）
#[derive(Debug, Clone)]
pub struct ListBooks {
    pub order: Option<BookOrder>,
    pub filter: Option<BookFilter>,
    pub page: Option<Page>,
}

/// 通过原始 SQL 选出书籍后投影
#[derive(Debug, Clone)]
pub struct ListBooksByRawSql {
    pub sql: String,
}

impl ListBooksByRawSql {
    pub fn top_rated() -> Self {
        Self {
            sql: TOP_RATED_SQL.to_string(),
        }
    }
}
