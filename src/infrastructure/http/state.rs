//! Application State
//!
//! 包含所有 Query Handlers 和列表分页设置

use std::sync::Arc;

use crate::application::{
    BookRepositoryPort, GetBookListItemHandler, ListBooksByRawSqlHandler, ListBooksHandler,
};

/// 列表分页设置
#[derive(Debug, Clone, Copy)]
pub struct ListingLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for ListingLimits {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// 应用状态
pub struct AppState {
    pub listing: ListingLimits,

    // ========== Query Handlers ==========
    pub get_book_handler: GetBookListItemHandler,
    pub list_books_handler: ListBooksHandler,
    pub list_books_by_raw_sql_handler: ListBooksByRawSqlHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>, listing: ListingLimits) -> Self {
        Self {
            listing,
            get_book_handler: GetBookListItemHandler::new(book_repo.clone()),
            list_books_handler: ListBooksHandler::new(book_repo.clone()),
            list_books_by_raw_sql_handler: ListBooksByRawSqlHandler::new(book_repo),
        }
    }
}
