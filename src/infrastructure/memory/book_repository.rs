//! In-Memory Book Repository Implementation

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::stream::{self, BoxStream, StreamExt};

use crate::application::ports::{BookRepositoryPort, RepositoryError};
use crate::domain::book::{Book, BookId, BookIncludes};

/// 内存书籍仓储
///
/// 保存完整聚合，读取时按 includes 裁剪关联；投影走进程内默认实现
pub struct InMemoryBookRepository {
    books: DashMap<BookId, Book>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self {
            books: DashMap::new(),
        }
    }

    pub fn with_books(books: impl IntoIterator<Item = Book>) -> Self {
        let repo = Self::new();
        for book in books {
            repo.books.insert(book.id(), book);
        }
        repo
    }

    /// ID 升序快照
    fn snapshot(&self, includes: BookIncludes) -> Vec<Book> {
        let mut books: Vec<Book> = self
            .books
            .iter()
            .map(|entry| entry.value().clone().restricted_to(includes))
            .collect();
        books.sort_by_key(Book::id);
        books
    }
}

impl Default for InMemoryBookRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookRepositoryPort for InMemoryBookRepository {
    async fn save(&self, book: &Book) -> Result<(), RepositoryError> {
        self.books.insert(book.id(), book.clone());
        tracing::debug!(book_id = %book.id(), "Book stored in memory");
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.books.len() as u64)
    }

    async fn find_by_id(
        &self,
        id: BookId,
        includes: BookIncludes,
    ) -> Result<Option<Book>, RepositoryError> {
        Ok(self
            .books
            .get(&id)
            .map(|entry| entry.value().clone().restricted_to(includes)))
    }

    fn stream_books(&self, includes: BookIncludes) -> BoxStream<'_, Result<Book, RepositoryError>> {
        stream::iter(self.snapshot(includes).into_iter().map(Ok)).boxed()
    }

    async fn find_by_raw_sql(
        &self,
        _sql: &str,
        _includes: BookIncludes,
    ) -> Result<Vec<Book>, RepositoryError> {
        Err(RepositoryError::Unsupported(
            "raw SQL is not available for the in-memory repository".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::projection::{project_stream, ProjectionPlan};
    use crate::domain::seed::four_books;
    use futures_util::TryStreamExt;

    #[tokio::test]
    async fn test_find_by_id_respects_includes() {
        let repo = InMemoryBookRepository::with_books(four_books().unwrap());
        let book = repo
            .find_by_id(BookId::new(4), BookIncludes::none())
            .await
            .unwrap()
            .unwrap();
        assert!(!book.reviews().is_loaded());
        assert!(repo
            .find_by_id(BookId::new(5), BookIncludes::all())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_stream_is_ordered_by_id() {
        let repo = InMemoryBookRepository::new();
        for book in four_books().unwrap().into_iter().rev() {
            repo.save(&book).await.unwrap();
        }
        assert_eq!(repo.count().await.unwrap(), 4);

        let displays: Vec<_> = project_stream(repo.stream_books(BookIncludes::all()))
            .try_collect()
            .await
            .unwrap();
        let ids: Vec<_> = displays.iter().map(|d| d.book_id.value()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_default_project_list_runs_in_process() {
        let repo = InMemoryBookRepository::with_books(four_books().unwrap());
        let displays = repo.project_list(&ProjectionPlan::book_list()).await.unwrap();
        assert_eq!(displays.len(), 4);
        assert_eq!(displays[3].actual_price.to_string(), "219.00");
    }
}
