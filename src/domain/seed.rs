//! 示例数据
//!
//! 经典的四本书数据集，由调用方构造并按值传递

use chrono::{DateTime, NaiveDate, Utc};

use super::book::{
    Author, AuthorId, AuthorLink, Book, BookError, BookId, Money, Promotion, Review, StarRating,
    Title,
};

/// 四本书：三本无评论无促销，Quantum Networking 带促销和两条 5 星评论
pub fn four_books() -> Result<Vec<Book>, BookError> {
    let martin_fowler = Author::new(AuthorId::new(1), "Martin Fowler");
    let eric_evans = Author::new(AuthorId::new(2), "Eric Evans");
    let future_person = Author::new(AuthorId::new(3), "Future Person");

    let refactoring = Book::new(
        BookId::new(1),
        Title::new("Refactoring")?,
        Money::from_units(40),
        date(1999, 7, 8)?,
    )
    .with_description("Improving the design of existing code")
    .with_promotion(None)
    .with_author_links(vec![AuthorLink::new(0, martin_fowler.clone())])
    .with_reviews(Vec::new());

    let poeaa = Book::new(
        BookId::new(2),
        Title::new("Patterns of Enterprise Application Architecture")?,
        Money::from_units(53),
        date(2002, 11, 15)?,
    )
    .with_description("Written in direct response to the stiff challenges")
    .with_promotion(None)
    .with_author_links(vec![AuthorLink::new(0, martin_fowler)])
    .with_reviews(Vec::new());

    let ddd = Book::new(
        BookId::new(3),
        Title::new("Domain-Driven Design")?,
        Money::from_units(56),
        date(2003, 8, 30)?,
    )
    .with_description("Linking business needs to software design")
    .with_promotion(None)
    .with_author_links(vec![AuthorLink::new(0, eric_evans)])
    .with_reviews(Vec::new());

    let quantum = Book::new(
        BookId::new(4),
        Title::new("Quantum Networking")?,
        Money::from_units(220),
        date(2057, 1, 1)?,
    )
    .with_description("Entangled quantum networking")
    .with_publisher("Future Publishing")
    .with_promotion(Some(Promotion::new(
        Money::from_units(219),
        "Save $1 if you order 40 years ahead!",
    )))
    .with_author_links(vec![AuthorLink::new(0, future_person)])
    .with_reviews(vec![
        Review::new(
            "Jon P Smith",
            StarRating::new(5)?,
            Some("I look forward to reading this book, if I am still alive!".to_string()),
        ),
        Review::new(
            "Albert Einstein",
            StarRating::new(5)?,
            Some("I write this book if I was still alive!".to_string()),
        ),
    ]);

    Ok(vec![refactoring, poeaa, ddd, quantum])
}

fn date(year: i32, month: u32, day: u32) -> Result<DateTime<Utc>, BookError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| BookError::InvalidDate(format!("{}-{}-{}", year, month, day)))
}
