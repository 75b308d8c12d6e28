//! 投影引擎
//!
//! 纯函数：Book 聚合 -> BookListDisplay，不修改输入、无缓存、无 I/O

use futures_util::{Stream, StreamExt};
use std::borrow::Borrow;

use super::{AverageRating, BookListDisplay, ProjectionError};
use crate::domain::book::{Author, AuthorLink, Book, Money, Promotion, RelationKind, Review};

/// 作者名分隔符
pub const AUTHOR_SEPARATOR: &str = ", ";

fn promotion(book: &Book) -> Result<Option<&Promotion>, ProjectionError> {
    book.promotion()
        .loaded()
        .map(Option::as_ref)
        .ok_or_else(|| ProjectionError::incomplete(book.id(), RelationKind::Promotion))
}

fn reviews(book: &Book) -> Result<&[Review], ProjectionError> {
    book.reviews()
        .loaded()
        .map(Vec::as_slice)
        .ok_or_else(|| ProjectionError::incomplete(book.id(), RelationKind::Reviews))
}

/// 实际价格：有促销取促销价，否则取原价
pub fn actual_price(book: &Book) -> Result<Money, ProjectionError> {
    match promotion(book)? {
        Some(promo) => promo
            .new_price()
            .ok_or(ProjectionError::InvalidPromotion { book_id: book.id() }),
        None => Ok(book.price()),
    }
}

/// 促销文案，仅在有促销时存在
pub fn promotional_text(book: &Book) -> Result<Option<String>, ProjectionError> {
    Ok(promotion(book)?.map(|promo| promo.promotional_text().to_string()))
}

/// 按 order 升序（稳定排序）连接作者名
pub fn authors_ordered(book: &Book) -> Result<String, ProjectionError> {
    let links = book
        .author_links()
        .loaded()
        .ok_or_else(|| ProjectionError::incomplete(book.id(), RelationKind::AuthorLinks))?;

    let mut ordered: Vec<&AuthorLink> = links.iter().collect();
    ordered.sort_by_key(|link| link.order());

    let names = ordered
        .into_iter()
        .map(|link| {
            link.author()
                .loaded()
                .map(Author::name)
                .ok_or_else(|| ProjectionError::incomplete(book.id(), RelationKind::Author))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(names.join(AUTHOR_SEPARATOR))
}

pub fn reviews_count(book: &Book) -> Result<u32, ProjectionError> {
    let count = reviews(book)?.len();
    Ok(u32::try_from(count).unwrap_or(u32::MAX))
}

pub fn reviews_average_votes(book: &Book) -> Result<Option<AverageRating>, ProjectionError> {
    Ok(AverageRating::from_ratings(
        reviews(book)?.iter().map(Review::num_stars),
    ))
}

/// 投影单个已完整加载的聚合
pub fn project_one(book: &Book) -> Result<BookListDisplay, ProjectionError> {
    Ok(BookListDisplay {
        book_id: book.id(),
        title: book.title().as_str().to_string(),
        published_on: book.published_on(),
        price: book.price(),
        actual_price: actual_price(book)?,
        promotional_text: promotional_text(book)?,
        authors_ordered: authors_ordered(book)?,
        reviews_count: reviews_count(book)?,
        reviews_average_votes: reviews_average_votes(book)?,
    })
}

/// 惰性投影一组聚合，保持源顺序
pub fn project_many<I, B>(books: I) -> impl Iterator<Item = Result<BookListDisplay, ProjectionError>>
where
    I: IntoIterator<Item = B>,
    B: Borrow<Book>,
{
    books.into_iter().map(|book| project_one(book.borrow()))
}

/// 惰性投影异步聚合流
///
/// 调用方停止拉取时，上游流也不再被消费
pub fn project_stream<S, E>(books: S) -> impl Stream<Item = Result<BookListDisplay, E>>
where
    S: Stream<Item = Result<Book, E>>,
    E: From<ProjectionError>,
{
    books.map(|item| item.and_then(|book| project_one(&book).map_err(E::from)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use futures_util::stream;

    use crate::domain::book::{AuthorId, BookId, StarRating, Title};

    fn base_book(title: &str, price: i64) -> Book {
        Book::new(
            BookId::new(7),
            Title::new(title).unwrap(),
            Money::from_units(price),
            Utc.with_ymd_and_hms(2057, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    fn author(id: i64, name: &str) -> Author {
        Author::new(AuthorId::new(id), name)
    }

    fn reviews_of(stars: &[u8]) -> Vec<Review> {
        stars
            .iter()
            .map(|s| Review::new("voter", StarRating::new(*s).unwrap(), None))
            .collect()
    }

    fn quantum_networking() -> Book {
        base_book("Quantum Networking", 220)
            .with_promotion(None)
            .with_reviews(reviews_of(&[5, 5, 4, 5]))
            .with_author_links(vec![
                AuthorLink::new(0, author(1, "Jack")),
                AuthorLink::new(1, author(2, "Jill")),
            ])
    }

    #[test]
    fn test_quantum_networking_scenario() {
        let display = project_one(&quantum_networking()).unwrap();

        assert_eq!(display.title, "Quantum Networking");
        assert_eq!(display.price, Money::from_units(220));
        assert_eq!(display.actual_price, Money::from_units(220));
        assert_eq!(display.promotional_text, None);
        assert_eq!(display.authors_ordered, "Jack, Jill");
        assert_eq!(display.reviews_count, 4);
        assert_eq!(
            display.reviews_average_votes,
            AverageRating::from_total(19, 4)
        );
        assert_eq!(
            display.reviews_average_votes.map(|a| a.to_decimal_string(2)),
            Some("4.75".to_string())
        );
    }

    #[test]
    fn test_promotion_overrides_price() {
        let book = base_book("Quantum Networking", 220)
            .with_promotion(Some(Promotion::new(Money::from_units(219), "Save $1")))
            .with_reviews(Vec::new())
            .with_author_links(Vec::new());

        let display = project_one(&book).unwrap();
        assert_eq!(display.price, Money::from_units(220));
        assert_eq!(display.actual_price, Money::from_units(219));
        assert_eq!(display.promotional_text.as_deref(), Some("Save $1"));
    }

    #[test]
    fn test_promotion_without_price_is_invalid() {
        let book = quantum_networking()
            .with_promotion(Some(Promotion::from_parts(None, "Free?")));

        assert_eq!(
            project_one(&book),
            Err(ProjectionError::InvalidPromotion {
                book_id: BookId::new(7)
            })
        );
    }

    #[test]
    fn test_not_loaded_relations_fail_loudly() {
        let cases = [
            (
                base_book("A", 1)
                    .with_reviews(Vec::new())
                    .with_author_links(Vec::new()),
                RelationKind::Promotion,
            ),
            (
                base_book("B", 1)
                    .with_promotion(None)
                    .with_reviews(Vec::new()),
                RelationKind::AuthorLinks,
            ),
            (
                base_book("C", 1)
                    .with_promotion(None)
                    .with_author_links(Vec::new()),
                RelationKind::Reviews,
            ),
            (
                base_book("D", 1)
                    .with_promotion(None)
                    .with_reviews(Vec::new())
                    .with_author_links(vec![AuthorLink::unresolved(0, AuthorId::new(9))]),
                RelationKind::Author,
            ),
        ];

        for (book, relation) in cases {
            assert_eq!(
                project_one(&book),
                Err(ProjectionError::IncompleteAggregate {
                    book_id: BookId::new(7),
                    relation,
                })
            );
        }
    }

    #[test]
    fn test_empty_collections_are_not_errors() {
        let book = base_book("Refactoring", 40)
            .with_promotion(None)
            .with_reviews(Vec::new())
            .with_author_links(Vec::new());

        let display = project_one(&book).unwrap();
        assert_eq!(display.authors_ordered, "");
        assert_eq!(display.reviews_count, 0);
        assert_eq!(display.reviews_average_votes, None);
        assert_eq!(display.actual_price, display.price);
    }

    #[test]
    fn test_author_order_is_stable_for_ties() {
        let book = base_book("Ties", 10)
            .with_promotion(None)
            .with_reviews(Vec::new())
            .with_author_links(vec![
                AuthorLink::new(2, author(1, "Carol")),
                AuthorLink::new(1, author(2, "Bob")),
                AuthorLink::new(1, author(3, "Alice")),
                AuthorLink::new(0, author(4, "Zed")),
            ]);

        assert_eq!(authors_ordered(&book).unwrap(), "Zed, Bob, Alice, Carol");
    }

    #[test]
    fn test_projection_is_idempotent_and_pure() {
        let book = quantum_networking();
        let before = book.clone();

        let first = project_one(&book).unwrap();
        let second = project_one(&book).unwrap();

        assert_eq!(first, second);
        assert_eq!(book, before);
    }

    #[test]
    fn test_project_many_is_lazy_and_ordered() {
        let books = vec![
            quantum_networking(),
            base_book("Broken", 1), // 关联未加载
            base_book("Refactoring", 40)
                .with_promotion(None)
                .with_reviews(Vec::new())
                .with_author_links(Vec::new()),
        ];

        let mut iter = project_many(&books);
        assert_eq!(iter.next().unwrap().unwrap().title, "Quantum Networking");
        assert!(iter.next().unwrap().is_err());
        assert_eq!(iter.next().unwrap().unwrap().title, "Refactoring");
        assert!(iter.next().is_none());

        let owned: Vec<_> = project_many(vec![quantum_networking()]).collect();
        assert_eq!(owned.len(), 1);
    }

    #[tokio::test]
    async fn test_project_stream_maps_each_item() {
        #[derive(Debug, PartialEq)]
        enum TestError {
            Source,
            Projection(ProjectionError),
        }

        impl From<ProjectionError> for TestError {
            fn from(err: ProjectionError) -> Self {
                TestError::Projection(err)
            }
        }

        let source = stream::iter(vec![
            Ok(quantum_networking()),
            Err(TestError::Source),
            Ok(base_book("Broken", 1)),
        ]);

        let results: Vec<_> = project_stream(source).collect().await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().authors_ordered, "Jack, Jill");
        assert_eq!(results[1], Err(TestError::Source));
        assert!(matches!(
            results[2],
            Err(TestError::Projection(ProjectionError::IncompleteAggregate { .. }))
        ));
    }
}
