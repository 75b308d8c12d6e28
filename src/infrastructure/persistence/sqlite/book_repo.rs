//! SQLite Book Repository
//!
//! - 聚合读取：按 includes 批量加载关联
//! - 投影下推：把映射规则翻译为单条 SELECT
//! - 原始 SQL：执行字面 SQL 后按 includes 补全关联

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::collections::HashMap;

use super::DbPool;
use crate::application::ports::{BookRepositoryPort, RepositoryError};
use crate::application::projection::{
    AverageRating, BookFilter, BookListDisplay, BookOrder, DisplayField, FieldValue,
    ProjectionError, ProjectionPlan,
};
use crate::domain::book::{
    Author, AuthorId, AuthorLink, Book, BookError, BookId, BookIncludes, Money, Promotion,
    Relation, Review, StarRating, Title,
};

/// SQLite Book Repository
pub struct SqliteBookRepository {
    pool: DbPool,
}

impl SqliteBookRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(e.to_string())
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

// ============================================================================
// Rows
// ============================================================================

const SELECT_BOOK_COLUMNS: &str =
    "SELECT book_id, title, description, publisher, price_cents, published_on FROM books";

#[derive(FromRow)]
struct BookRow {
    book_id: i64,
    title: String,
    description: Option<String>,
    publisher: Option<String>,
    price_cents: i64,
    published_on: String,
}

impl TryFrom<BookRow> for Book {
    type Error = RepositoryError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let title =
            Title::new(row.title).map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        let mut book = Book::new(
            BookId::new(row.book_id),
            title,
            Money::from_cents(row.price_cents),
            parse_timestamp(&row.published_on)?,
        );
        if let Some(description) = row.description {
            book = book.with_description(description);
        }
        if let Some(publisher) = row.publisher {
            book = book.with_publisher(publisher);
        }
        Ok(book)
    }
}

#[derive(FromRow)]
struct PromotionRow {
    book_id: i64,
    new_price_cents: Option<i64>,
    promotional_text: String,
}

#[derive(FromRow)]
struct AuthorLinkRow {
    book_id: i64,
    author_id: i64,
    author_order: i64,
    name: String,
}

#[derive(FromRow)]
struct ReviewRow {
    book_id: i64,
    voter_name: String,
    num_stars: i64,
    comment: Option<String>,
}

// ============================================================================
// 投影下推
// ============================================================================

const ACTUAL_PRICE_SQL: &str =
    "CASE WHEN p.price_offer_id IS NULL THEN b.price_cents ELSE p.new_price_cents END";

// 分隔符与 AUTHOR_SEPARATOR 一致；相同顺序按插入顺序（rowid）
const AUTHORS_ORDERED_SQL: &str = "COALESCE((SELECT group_concat(a.name, ', ' ORDER BY ba.author_order, ba.rowid) \
     FROM book_authors AS ba JOIN authors AS a ON a.author_id = ba.author_id \
     WHERE ba.book_id = b.book_id), '')";

const REVIEWS_COUNT_SQL: &str = "(SELECT COUNT(*) FROM reviews AS r WHERE r.book_id = b.book_id)";

// 只下推总和与数量，平均值在进程内精确计算
const REVIEWS_TOTAL_SQL: &str =
    "(SELECT SUM(r.num_stars) FROM reviews AS r WHERE r.book_id = b.book_id)";

const REVIEWS_AVG_SQL: &str =
    "(SELECT AVG(r.num_stars) FROM reviews AS r WHERE r.book_id = b.book_id)";

/// 字段对应的 (SQL 表达式, 列别名)
fn field_columns(field: DisplayField) -> &'static [(&'static str, &'static str)] {
    match field {
        // book_id 总是单独选出
        DisplayField::BookId => &[],
        DisplayField::Title => &[("b.title", "title")],
        DisplayField::PublishedOn => &[("b.published_on", "published_on")],
        DisplayField::Price => &[("b.price_cents", "price_cents")],
        DisplayField::ActualPrice => &[(ACTUAL_PRICE_SQL, "actual_price_cents")],
        DisplayField::PromotionalText => &[("p.promotional_text", "promotional_text")],
        DisplayField::AuthorsOrdered => &[(AUTHORS_ORDERED_SQL, "authors_ordered")],
        DisplayField::ReviewsCount => &[(REVIEWS_COUNT_SQL, "reviews_count")],
        DisplayField::ReviewsAverageVotes => &[
            (REVIEWS_TOTAL_SQL, "reviews_total_stars"),
            (REVIEWS_COUNT_SQL, "reviews_vote_count"),
        ],
    }
}

fn filter_sql(filter: BookFilter) -> &'static str {
    match filter {
        // SUM - n * COUNT > 0 等价于 AVG > n，且没有评论时为 NULL
        BookFilter::AverageVotesAbove(_) => {
            "(SELECT SUM(r.num_stars) - ? * COUNT(*) FROM reviews AS r WHERE r.book_id = b.book_id) > 0"
        }
        BookFilter::PublishedInYear(_) => "CAST(strftime('%Y', b.published_on) AS INTEGER) = ?",
    }
}

fn order_sql(order: Option<BookOrder>) -> String {
    match order {
        None => "b.book_id".to_string(),
        Some(BookOrder::ByIdDescending) => "b.book_id DESC".to_string(),
        Some(BookOrder::ByVotes) => format!("{} DESC, b.book_id", REVIEWS_AVG_SQL),
        Some(BookOrder::ByPublicationDate) => "b.published_on DESC, b.book_id".to_string(),
        Some(BookOrder::ByPriceLowestFirst) => format!("{} ASC, b.book_id", ACTUAL_PRICE_SQL),
        Some(BookOrder::ByPriceHighestFirst) => format!("{} DESC, b.book_id", ACTUAL_PRICE_SQL),
    }
}

/// 把投影计划翻译为 SQL
fn projection_sql(plan: &ProjectionPlan) -> String {
    let mut columns = vec!["b.book_id AS book_id".to_string()];
    for rule in plan.rules() {
        for (expr, alias) in field_columns(rule.field) {
            columns.push(format!("{} AS {}", expr, alias));
        }
    }

    let mut sql = format!(
        "SELECT {} FROM books AS b LEFT JOIN price_offers AS p ON p.book_id = b.book_id",
        columns.join(", ")
    );
    if let Some(filter) = plan.filter() {
        sql.push_str(" WHERE ");
        sql.push_str(filter_sql(filter));
    }
    sql.push_str(" ORDER BY ");
    sql.push_str(&order_sql(plan.order()));
    if plan.page().is_some() {
        sql.push_str(" LIMIT ? OFFSET ?");
    }
    sql
}

fn decode_display(row: &SqliteRow, plan: &ProjectionPlan) -> Result<BookListDisplay, RepositoryError> {
    let book_id = BookId::new(row.try_get::<i64, _>("book_id").map_err(db_error)?);
    let to_u64 = |value: i64| {
        u64::try_from(value).map_err(|e| RepositoryError::SerializationError(e.to_string()))
    };

    let mut fields = Vec::with_capacity(plan.rules().len());
    for rule in plan.rules() {
        let value = match rule.field {
            DisplayField::BookId => FieldValue::Id(book_id),
            DisplayField::Title => FieldValue::Text(row.try_get("title").map_err(db_error)?),
            DisplayField::PublishedOn => {
                let raw: String = row.try_get("published_on").map_err(db_error)?;
                FieldValue::Timestamp(parse_timestamp(&raw)?)
            }
            DisplayField::Price => {
                FieldValue::Money(Money::from_cents(row.try_get("price_cents").map_err(db_error)?))
            }
            DisplayField::ActualPrice => {
                match row
                    .try_get::<Option<i64>, _>("actual_price_cents")
                    .map_err(db_error)?
                {
                    Some(cents) => FieldValue::Money(Money::from_cents(cents)),
                    None => return Err(ProjectionError::InvalidPromotion { book_id }.into()),
                }
            }
            DisplayField::PromotionalText => {
                FieldValue::OptionalText(row.try_get("promotional_text").map_err(db_error)?)
            }
            DisplayField::AuthorsOrdered => {
                FieldValue::Text(row.try_get("authors_ordered").map_err(db_error)?)
            }
            DisplayField::ReviewsCount => {
                let count: i64 = row.try_get("reviews_count").map_err(db_error)?;
                FieldValue::Count(
                    u32::try_from(count)
                        .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
                )
            }
            DisplayField::ReviewsAverageVotes => {
                let total: Option<i64> = row.try_get("reviews_total_stars").map_err(db_error)?;
                let count: i64 = row.try_get("reviews_vote_count").map_err(db_error)?;
                FieldValue::Average(AverageRating::from_total(
                    to_u64(total.unwrap_or(0))?,
                    to_u64(count)?,
                ))
            }
        };
        fields.push((rule.field, value));
    }

    Ok(BookListDisplay::from_fields(fields)?)
}

// ============================================================================
// 关联加载
// ============================================================================

impl SqliteBookRepository {
    async fn load_promotions(&self, ids: &[i64]) -> Result<HashMap<BookId, Promotion>, RepositoryError> {
        let sql = format!(
            "SELECT book_id, new_price_cents, promotional_text FROM price_offers WHERE book_id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, PromotionRow>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    BookId::new(row.book_id),
                    Promotion::from_parts(
                        row.new_price_cents.map(Money::from_cents),
                        row.promotional_text,
                    ),
                )
            })
            .collect())
    }

    async fn load_author_links(
        &self,
        ids: &[i64],
    ) -> Result<HashMap<BookId, Vec<AuthorLink>>, RepositoryError> {
        let sql = format!(
            "SELECT ba.book_id, ba.author_id, ba.author_order, a.name \
             FROM book_authors AS ba JOIN authors AS a ON a.author_id = ba.author_id \
             WHERE ba.book_id IN ({}) ORDER BY ba.rowid",
            placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, AuthorLinkRow>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(db_error)?;

        let mut links: HashMap<BookId, Vec<AuthorLink>> = HashMap::new();
        for row in rows {
            let order = u8::try_from(row.author_order).map_err(|_| {
                RepositoryError::SerializationError(
                    BookError::InvalidAuthorOrder(row.author_order).to_string(),
                )
            })?;
            let author = Author::new(AuthorId::new(row.author_id), row.name);
            links
                .entry(BookId::new(row.book_id))
                .or_default()
                .push(AuthorLink::new(order, author));
        }
        Ok(links)
    }

    async fn load_reviews(&self, ids: &[i64]) -> Result<HashMap<BookId, Vec<Review>>, RepositoryError> {
        let sql = format!(
            "SELECT book_id, voter_name, num_stars, comment FROM reviews WHERE book_id IN ({}) ORDER BY review_id",
            placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, ReviewRow>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(db_error)?;

        let mut reviews: HashMap<BookId, Vec<Review>> = HashMap::new();
        for row in rows {
            let stars = StarRating::try_from(row.num_stars)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
            reviews
                .entry(BookId::new(row.book_id))
                .or_default()
                .push(Review::new(row.voter_name, stars, row.comment));
        }
        Ok(reviews)
    }

    /// 为一批书籍加载关联，保持输入顺序
    async fn load_relations(
        &self,
        books: Vec<Book>,
        includes: BookIncludes,
    ) -> Result<Vec<Book>, RepositoryError> {
        if books.is_empty() {
            return Ok(books);
        }
        let ids: Vec<i64> = books.iter().map(|b| b.id().value()).collect();

        let promotions = if includes.promotion {
            Some(self.load_promotions(&ids).await?)
        } else {
            None
        };
        let links = if includes.author_links {
            Some(self.load_author_links(&ids).await?)
        } else {
            None
        };
        let reviews = if includes.reviews {
            Some(self.load_reviews(&ids).await?)
        } else {
            None
        };

        Ok(books
            .into_iter()
            .map(|mut book| {
                let id = book.id();
                if let Some(promotions) = &promotions {
                    book = book.with_promotion(promotions.get(&id).cloned());
                }
                if let Some(links) = &links {
                    book = book.with_author_links(links.get(&id).cloned().unwrap_or_default());
                }
                if let Some(reviews) = &reviews {
                    book = book.with_reviews(reviews.get(&id).cloned().unwrap_or_default());
                }
                book
            })
            .collect())
    }
}

#[async_trait]
impl BookRepositoryPort for SqliteBookRepository {
    async fn save(&self, book: &Book) -> Result<(), RepositoryError> {
        let book_id = book.id().value();
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query(
            r#"
            INSERT INTO books (book_id, title, description, publisher, price_cents, published_on)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(book_id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                publisher = excluded.publisher,
                price_cents = excluded.price_cents,
                published_on = excluded.published_on
            "#,
        )
        .bind(book_id)
        .bind(book.title().as_str())
        .bind(book.description())
        .bind(book.publisher())
        .bind(book.price().cents())
        .bind(book.published_on().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if let Relation::Loaded(promotion) = book.promotion() {
            sqlx::query("DELETE FROM price_offers WHERE book_id = ?")
                .bind(book_id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;

            if let Some(promotion) = promotion {
                sqlx::query(
                    "INSERT INTO price_offers (book_id, new_price_cents, promotional_text) VALUES (?, ?, ?)",
                )
                .bind(book_id)
                .bind(promotion.new_price().map(|p| p.cents()))
                .bind(promotion.promotional_text())
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
            }
        }

        if let Relation::Loaded(links) = book.author_links() {
            sqlx::query("DELETE FROM book_authors WHERE book_id = ?")
                .bind(book_id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;

            for link in links {
                if let Relation::Loaded(author) = link.author() {
                    sqlx::query(
                        r#"
                        INSERT INTO authors (author_id, name) VALUES (?, ?)
                        ON CONFLICT(author_id) DO UPDATE SET name = excluded.name
                        "#,
                    )
                    .bind(author.id().value())
                    .bind(author.name())
                    .execute(&mut *tx)
                    .await
                    .map_err(db_error)?;
                }

                sqlx::query(
                    "INSERT INTO book_authors (book_id, author_id, author_order) VALUES (?, ?, ?)",
                )
                .bind(book_id)
                .bind(link.author_id().value())
                .bind(i64::from(link.order()))
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
            }
        }

        if let Relation::Loaded(reviews) = book.reviews() {
            sqlx::query("DELETE FROM reviews WHERE book_id = ?")
                .bind(book_id)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;

            for review in reviews {
                sqlx::query(
                    "INSERT INTO reviews (book_id, voter_name, num_stars, comment) VALUES (?, ?, ?, ?)",
                )
                .bind(book_id)
                .bind(review.voter_name())
                .bind(i64::from(review.num_stars().value()))
                .bind(review.comment())
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
            }
        }

        tx.commit().await.map_err(db_error)?;

        tracing::debug!(book_id = book_id, "Book aggregate saved");
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        u64::try_from(count).map_err(|e| RepositoryError::SerializationError(e.to_string()))
    }

    async fn find_by_id(
        &self,
        id: BookId,
        includes: BookIncludes,
    ) -> Result<Option<Book>, RepositoryError> {
        let sql = format!("{} WHERE book_id = ?", SELECT_BOOK_COLUMNS);
        let row: Option<BookRow> = sqlx::query_as(&sql)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let book = Book::try_from(row)?;
        Ok(self.load_relations(vec![book], includes).await?.pop())
    }

    /// 先取 ID 列表，再逐本加载，不会同时占用两个连接
    fn stream_books(&self, includes: BookIncludes) -> BoxStream<'_, Result<Book, RepositoryError>> {
        let ids = async move {
            sqlx::query_scalar::<_, i64>("SELECT book_id FROM books ORDER BY book_id")
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)
        };

        stream::once(ids)
            .map_ok(|ids| stream::iter(ids.into_iter().map(Ok::<i64, RepositoryError>)))
            .try_flatten()
            .and_then(move |id| async move {
                self.find_by_id(BookId::new(id), includes)
                    .await?
                    .ok_or_else(|| RepositoryError::NotFound(format!("book {}", id)))
            })
            .boxed()
    }

    async fn find_by_raw_sql(
        &self,
        sql: &str,
        includes: BookIncludes,
    ) -> Result<Vec<Book>, RepositoryError> {
        tracing::debug!(sql = %sql, "Executing raw SQL");

        let rows: Vec<BookRow> = sqlx::query_as(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        let books = rows
            .into_iter()
            .map(Book::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        self.load_relations(books, includes).await
    }

    async fn project_list(
        &self,
        plan: &ProjectionPlan,
    ) -> Result<Vec<BookListDisplay>, RepositoryError> {
        // 无效促销不论是否落在过滤结果或当前页内都要报告
        if plan
            .rules()
            .iter()
            .any(|rule| rule.field == DisplayField::ActualPrice)
        {
            let broken: Option<i64> = sqlx::query_scalar(
                "SELECT p.book_id FROM price_offers AS p \
                 WHERE p.new_price_cents IS NULL ORDER BY p.book_id LIMIT 1",
            )
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

            if let Some(book_id) = broken {
                return Err(ProjectionError::InvalidPromotion {
                    book_id: BookId::new(book_id),
                }
                .into());
            }
        }

        let sql = projection_sql(plan);
        tracing::debug!(sql = %sql, "Executing projection push-down");

        let mut query = sqlx::query(&sql);
        match plan.filter() {
            Some(BookFilter::AverageVotesAbove(stars)) => query = query.bind(i64::from(stars)),
            Some(BookFilter::PublishedInYear(year)) => query = query.bind(i64::from(year)),
            None => {}
        }
        if let Some(page) = plan.page() {
            query = query
                .bind(i64::from(page.size()))
                .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
        }

        let rows = query.fetch_all(&self.pool).await.map_err(db_error)?;
        rows.iter().map(|row| decode_display(row, plan)).collect()
    }
}
