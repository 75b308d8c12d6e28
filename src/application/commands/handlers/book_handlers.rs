//! Book Command Handlers

use std::sync::Arc;

use crate::application::commands::SeedBooks;
use crate::application::error::ApplicationError;
use crate::application::ports::BookRepositoryPort;

/// 种子数据结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedBooksResponse {
    /// 本次写入的书籍数
    pub inserted: usize,
    /// 写入前仓储中已有的书籍数
    pub existing: u64,
}

/// SeedBooks Handler
///
/// 仓储非空时不做任何写入
pub struct SeedBooksHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
}

impl SeedBooksHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>) -> Self {
        Self { book_repo }
    }

    pub async fn handle(&self, command: SeedBooks) -> Result<SeedBooksResponse, ApplicationError> {
        let existing = self.book_repo.count().await?;
        if existing > 0 {
            tracing::info!(existing = existing, "Book store not empty, skipping seed");
            return Ok(SeedBooksResponse {
                inserted: 0,
                existing,
            });
        }

        for book in &command.books {
            self.book_repo.save(book).await?;
        }

        tracing::info!(inserted = command.books.len(), "Seed books inserted");

        Ok(SeedBooksResponse {
            inserted: command.books.len(),
            existing,
        })
    }
}
