//! Book Context - Aggregate Root

use chrono::{DateTime, Utc};

use super::{AuthorLink, BookId, BookIncludes, Money, Promotion, Relation, Review, Title};

/// Book 聚合根
///
/// 不变量:
/// - 促销最多一个
/// - 作者链接有序，评论无序
/// - 每个关联都显式标记是否已加载
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    id: BookId,
    title: Title,
    description: Option<String>,
    publisher: Option<String>,
    price: Money,
    published_on: DateTime<Utc>,
    promotion: Relation<Option<Promotion>>,
    author_links: Relation<Vec<AuthorLink>>,
    reviews: Relation<Vec<Review>>,
}

impl Book {
    /// 创建书籍，所有关联均为未加载
    pub fn new(id: BookId, title: Title, price: Money, published_on: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            description: None,
            publisher: None,
            price,
            published_on,
            promotion: Relation::NotLoaded,
            author_links: Relation::NotLoaded,
            reviews: Relation::NotLoaded,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    /// 标记促销已加载（`None` 表示确实没有促销）
    pub fn with_promotion(mut self, promotion: Option<Promotion>) -> Self {
        self.promotion = Relation::Loaded(promotion);
        self
    }

    pub fn with_author_links(mut self, links: Vec<AuthorLink>) -> Self {
        self.author_links = Relation::Loaded(links);
        self
    }

    pub fn with_reviews(mut self, reviews: Vec<Review>) -> Self {
        self.reviews = Relation::Loaded(reviews);
        self
    }

    /// 只保留 `includes` 中列出的关联，其余重置为未加载
    pub fn restricted_to(mut self, includes: BookIncludes) -> Self {
        if !includes.promotion {
            self.promotion = Relation::NotLoaded;
        }
        if !includes.author_links {
            self.author_links = Relation::NotLoaded;
        }
        if !includes.reviews {
            self.reviews = Relation::NotLoaded;
        }
        self
    }

    // Getters
    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn title(&self) -> &Title {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn publisher(&self) -> Option<&str> {
        self.publisher.as_deref()
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn published_on(&self) -> DateTime<Utc> {
        self.published_on
    }

    pub fn promotion(&self) -> &Relation<Option<Promotion>> {
        &self.promotion
    }

    pub fn author_links(&self) -> &Relation<Vec<AuthorLink>> {
        &self.author_links
    }

    pub fn reviews(&self) -> &Relation<Vec<Review>> {
        &self.reviews
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::book::{Author, AuthorId, StarRating};

    fn sample() -> Book {
        Book::new(
            BookId::new(1),
            Title::new("Refactoring").unwrap(),
            Money::from_units(40),
            Utc::now(),
        )
    }

    #[test]
    fn test_new_book_has_nothing_loaded() {
        let book = sample();
        assert!(!book.promotion().is_loaded());
        assert!(!book.author_links().is_loaded());
        assert!(!book.reviews().is_loaded());
    }

    #[test]
    fn test_loaded_none_promotion_differs_from_not_loaded() {
        let book = sample().with_promotion(None);
        assert_eq!(book.promotion(), &Relation::Loaded(None));
        assert_ne!(book.promotion(), &Relation::NotLoaded);
    }

    #[test]
    fn test_restricted_to_resets_relations() {
        let book = sample()
            .with_promotion(None)
            .with_author_links(vec![AuthorLink::new(
                0,
                Author::new(AuthorId::new(1), "Martin Fowler"),
            )])
            .with_reviews(vec![Review::new("Jon", StarRating::new(5).unwrap(), None)]);

        let restricted = book.clone().restricted_to(BookIncludes {
            promotion: true,
            author_links: false,
            reviews: true,
        });

        assert!(restricted.promotion().is_loaded());
        assert!(!restricted.author_links().is_loaded());
        assert!(restricted.reviews().is_loaded());
        assert_eq!(book.restricted_to(BookIncludes::all()).author_links().loaded().map(Vec::len), Some(1));
    }
}
