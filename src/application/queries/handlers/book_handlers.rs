//! Book Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::BookRepositoryPort;
use crate::application::projection::{project_many, project_one, BookListDisplay, ProjectionPlan};
use crate::application::queries::{GetBookListItem, ListBooks, ListBooksByRawSql};
use crate::domain::book::BookIncludes;

/// GetBookListItem Handler
pub struct GetBookListItemHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
}

impl GetBookListItemHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>) -> Self {
        Self { book_repo }
    }

    pub async fn handle(&self, query: GetBookListItem) -> Result<BookListDisplay, ApplicationError> {
        let book = self
            .book_repo
            .find_by_id(query.book_id, BookIncludes::all())
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", query.book_id.value()))?;

        Ok(project_one(&book)?)
    }
}

/// ListBooks Handler
pub struct ListBooksHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
}

impl ListBooksHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>) -> Self {
        Self { book_repo }
    }

    pub async fn handle(&self, query: ListBooks) -> Result<Vec<BookListDisplay>, ApplicationError> {
        let mut plan = ProjectionPlan::book_list();
        if let Some(order) = query.order {
            plan = plan.with_order(order);
        }
        if let Some(filter) = query.filter {
            plan = plan.with_filter(filter);
        }
        if let Some(page) = query.page {
            plan = plan.with_page(page);
        }

        let books = self.book_repo.project_list(&plan).await?;

        tracing::debug!(
            order = ?query.order,
            filter = ?query.filter,
            page = ?query.page,
            count = books.len(),
            "Book list projected"
        );

        Ok(books)
    }
}

/// ListBooksByRawSql Handler
pub struct ListBooksByRawSqlHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
}

impl ListBooksByRawSqlHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>) -> Self {
        Self { book_repo }
    }

    pub async fn handle(
        &self,
        query: ListBooksByRawSql,
    ) -> Result<Vec<BookListDisplay>, ApplicationError> {
        if query.sql.trim().is_empty() {
            return Err(ApplicationError::validation("SQL must not be empty"));
        }

        let books = self
            .book_repo
            .find_by_raw_sql(&query.sql, BookIncludes::all())
            .await?;

        tracing::debug!(sql = %query.sql, count = books.len(), "Raw SQL books loaded");

        Ok(project_many(&books).collect::<Result<Vec<_>, _>>()?)
    }
}
