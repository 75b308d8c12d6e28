//! 投影计划
//!
//! 把映射表达为数据：有序的 `字段 -> 提取函数` 规则列表，
//! 加上可选的过滤、排序与分页。存储适配器可以在进程内执行，
//! 也可以把每个字段翻译成原生查询。

use chrono::{DateTime, Datelike, Utc};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

use super::engine;
use super::{AverageRating, BookListDisplay, ProjectionError};
use crate::domain::book::{Book, BookId, Money};

/// 展示字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayField {
    BookId,
    Title,
    PublishedOn,
    Price,
    ActualPrice,
    PromotionalText,
    AuthorsOrdered,
    ReviewsCount,
    ReviewsAverageVotes,
}

impl DisplayField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayField::BookId => "book_id",
            DisplayField::Title => "title",
            DisplayField::PublishedOn => "published_on",
            DisplayField::Price => "price",
            DisplayField::ActualPrice => "actual_price",
            DisplayField::PromotionalText => "promotional_text",
            DisplayField::AuthorsOrdered => "authors_ordered",
            DisplayField::ReviewsCount => "reviews_count",
            DisplayField::ReviewsAverageVotes => "reviews_average_votes",
        }
    }
}

impl fmt::Display for DisplayField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 提取出的字段值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Id(BookId),
    Text(String),
    OptionalText(Option<String>),
    Timestamp(DateTime<Utc>),
    Money(Money),
    Count(u32),
    Average(Option<AverageRating>),
}

pub type FieldExtractor = fn(&Book) -> Result<FieldValue, ProjectionError>;

/// 单条映射规则
#[derive(Debug, Clone, Copy)]
pub struct MappingRule {
    pub field: DisplayField,
    pub extract: FieldExtractor,
}

impl MappingRule {
    pub fn new(field: DisplayField, extract: FieldExtractor) -> Self {
        Self { field, extract }
    }
}

/// 排序选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookOrder {
    /// ID 倒序
    ByIdDescending,
    /// 平均评分从高到低，无评论的排最后
    ByVotes,
    /// 出版日期从新到旧
    ByPublicationDate,
    /// 实际价格从低到高
    ByPriceLowestFirst,
    /// 实际价格从高到低
    ByPriceHighestFirst,
}

impl BookOrder {
    /// 进程内比较，相等时由调用方的稳定排序保持源顺序
    pub fn compare(&self, a: &BookListDisplay, b: &BookListDisplay) -> Ordering {
        match self {
            BookOrder::ByIdDescending => b.book_id.cmp(&a.book_id),
            BookOrder::ByVotes => match (&a.reviews_average_votes, &b.reviews_average_votes) {
                (Some(x), Some(y)) => y.cmp(x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            BookOrder::ByPublicationDate => b.published_on.cmp(&a.published_on),
            BookOrder::ByPriceLowestFirst => a.actual_price.cmp(&b.actual_price),
            BookOrder::ByPriceHighestFirst => b.actual_price.cmp(&a.actual_price),
        }
    }
}

/// 过滤选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookFilter {
    /// 平均评分严格高于给定星数
    AverageVotesAbove(u8),
    /// 出版年份
    PublishedInYear(i32),
}

impl BookFilter {
    pub fn matches(&self, display: &BookListDisplay) -> bool {
        match self {
            BookFilter::AverageVotesAbove(stars) => display
                .reviews_average_votes
                .map(|avg| avg.numerator() > u64::from(*stars) * avg.denominator())
                .unwrap_or(false),
            BookFilter::PublishedInYear(year) => display.published_on.year() == *year,
        }
    }
}

/// 分页（页码从 1 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    number: u32,
    size: u32,
}

impl Page {
    /// 页码和页大小都至少为 1
    pub fn new(number: u32, size: u32) -> Self {
        Self {
            number: number.max(1),
            size: size.max(1),
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.number - 1) * u64::from(self.size)
    }
}

/// 投影计划
#[derive(Debug, Clone)]
pub struct ProjectionPlan {
    rules: Vec<MappingRule>,
    order: Option<BookOrder>,
    filter: Option<BookFilter>,
    page: Option<Page>,
}

impl ProjectionPlan {
    /// 标准书籍列表映射
    pub fn book_list() -> Self {
        let rules = vec![
            MappingRule::new(DisplayField::BookId, |b| Ok(FieldValue::Id(b.id()))),
            MappingRule::new(DisplayField::Title, |b| {
                Ok(FieldValue::Text(b.title().as_str().to_string()))
            }),
            MappingRule::new(DisplayField::PublishedOn, |b| {
                Ok(FieldValue::Timestamp(b.published_on()))
            }),
            MappingRule::new(DisplayField::Price, |b| Ok(FieldValue::Money(b.price()))),
            MappingRule::new(DisplayField::ActualPrice, |b| {
                engine::actual_price(b).map(FieldValue::Money)
            }),
            MappingRule::new(DisplayField::PromotionalText, |b| {
                engine::promotional_text(b).map(FieldValue::OptionalText)
            }),
            MappingRule::new(DisplayField::AuthorsOrdered, |b| {
                engine::authors_ordered(b).map(FieldValue::Text)
            }),
            MappingRule::new(DisplayField::ReviewsCount, |b| {
                engine::reviews_count(b).map(FieldValue::Count)
            }),
            MappingRule::new(DisplayField::ReviewsAverageVotes, |b| {
                engine::reviews_average_votes(b).map(FieldValue::Average)
            }),
        ];

        Self {
            rules,
            order: None,
            filter: None,
            page: None,
        }
    }

    pub fn with_order(mut self, order: BookOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_filter(mut self, filter: BookFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }

    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    pub fn order(&self) -> Option<BookOrder> {
        self.order
    }

    pub fn filter(&self) -> Option<BookFilter> {
        self.filter
    }

    pub fn page(&self) -> Option<Page> {
        self.page
    }

    /// 按规则顺序执行映射
    pub fn project(&self, book: &Book) -> Result<BookListDisplay, ProjectionError> {
        let fields = self
            .rules
            .iter()
            .map(|rule| (rule.extract)(book).map(|value| (rule.field, value)))
            .collect::<Result<Vec<_>, _>>()?;
        BookListDisplay::from_fields(fields)
    }

    /// 进程内执行整个计划
    ///
    /// 没有排序时保持惰性和源顺序，投影错误不论落在哪一页都会输出；
    /// 有排序时需要先缓冲全部结果，遇到第一个错误即返回该错误
    pub fn apply<'a, I, B>(
        &'a self,
        books: I,
    ) -> Box<dyn Iterator<Item = Result<BookListDisplay, ProjectionError>> + 'a>
    where
        I: IntoIterator<Item = B>,
        I::IntoIter: 'a,
        B: Borrow<Book> + 'a,
    {
        let filter = self.filter;
        let filtered = books
            .into_iter()
            .map(move |book| self.project(book.borrow()))
            .filter(move |result| match (result, filter) {
                (Ok(display), Some(filter)) => filter.matches(display),
                _ => true,
            });

        let (skip, take) = match self.page {
            Some(page) => (
                usize::try_from(page.offset()).unwrap_or(usize::MAX),
                page.size() as usize,
            ),
            None => (0, usize::MAX),
        };

        match self.order {
            // 只有成功的记录占用分页位置，错误总是原样输出
            None => {
                let mut position = 0_usize;
                Box::new(filtered.filter(move |result| match result {
                    Ok(_) => {
                        let in_page = position >= skip && position - skip < take;
                        position += 1;
                        in_page
                    }
                    Err(_) => true,
                }))
            }
            Some(order) => match filtered.collect::<Result<Vec<_>, _>>() {
                Ok(mut displays) => {
                    displays.sort_by(|a, b| order.compare(a, b));
                    Box::new(displays.into_iter().skip(skip).take(take).map(Ok))
                }
                Err(err) => Box::new(std::iter::once(Err(err))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::projection::project_one;
    use crate::domain::book::{BookIncludes, Promotion};
    use crate::domain::seed::four_books;

    #[test]
    fn test_book_list_plan_matches_project_one() {
        let plan = ProjectionPlan::book_list();
        for book in four_books().unwrap() {
            assert_eq!(plan.project(&book), project_one(&book));
        }
    }

    #[test]
    fn test_rules_are_ordered_and_complete() {
        let fields: Vec<_> = ProjectionPlan::book_list()
            .rules()
            .iter()
            .map(|r| r.field)
            .collect();
        assert_eq!(fields.len(), 9);
        assert_eq!(fields[0], DisplayField::BookId);
        assert_eq!(fields[8], DisplayField::ReviewsAverageVotes);
    }

    #[test]
    fn test_apply_without_order_keeps_source_order() {
        let books = four_books().unwrap();
        let plan = ProjectionPlan::book_list();
        let titles: Vec<_> = plan
            .apply(&books)
            .map(|r| r.unwrap().title)
            .collect();
        assert_eq!(
            titles,
            vec![
                "Refactoring",
                "Patterns of Enterprise Application Architecture",
                "Domain-Driven Design",
                "Quantum Networking"
            ]
        );
    }

    #[test]
    fn test_apply_orders_by_votes_with_missing_last() {
        let books = four_books().unwrap();
        let plan = ProjectionPlan::book_list().with_order(BookOrder::ByVotes);
        let ids: Vec<_> = plan
            .apply(books)
            .map(|r| r.unwrap().book_id.value())
            .collect();
        // 无评论的三本保持源顺序
        assert_eq!(ids, vec![4, 1, 2, 3]);
    }

    #[test]
    fn test_apply_orders_by_actual_price() {
        let books = four_books().unwrap();
        let plan = ProjectionPlan::book_list().with_order(BookOrder::ByPriceHighestFirst);
        let prices: Vec<_> = plan
            .apply(&books)
            .map(|r| r.unwrap().actual_price)
            .collect();
        assert_eq!(
            prices,
            vec![
                Money::from_units(219),
                Money::from_units(56),
                Money::from_units(53),
                Money::from_units(40)
            ]
        );
    }

    #[test]
    fn test_apply_filters_and_pages() {
        let books = four_books().unwrap();

        let voted = ProjectionPlan::book_list().with_filter(BookFilter::AverageVotesAbove(4));
        let titles: Vec<_> = voted.apply(&books).map(|r| r.unwrap().title).collect();
        assert_eq!(titles, vec!["Quantum Networking"]);

        let not_above_five = ProjectionPlan::book_list().with_filter(BookFilter::AverageVotesAbove(5));
        assert_eq!(not_above_five.apply(&books).count(), 0);

        let year = ProjectionPlan::book_list().with_filter(BookFilter::PublishedInYear(2002));
        let ids: Vec<_> = year.apply(&books).map(|r| r.unwrap().book_id.value()).collect();
        assert_eq!(ids, vec![2]);

        let paged = ProjectionPlan::book_list()
            .with_order(BookOrder::ByIdDescending)
            .with_page(Page::new(2, 3));
        let ids: Vec<_> = paged.apply(&books).map(|r| r.unwrap().book_id.value()).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_apply_with_order_surfaces_first_error() {
        let mut books = four_books().unwrap();
        books[1] = books[1].clone().restricted_to(BookIncludes::none());
        books[2] = books[2]
            .clone()
            .with_promotion(Some(Promotion::from_parts(None, "broken")));

        let plan = ProjectionPlan::book_list().with_order(BookOrder::ByVotes);
        let results: Vec<_> = plan.apply(&books).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(ProjectionError::IncompleteAggregate { .. })
        ));
    }

    #[test]
    fn test_apply_without_order_keeps_errors_outside_the_page() {
        let mut books = four_books().unwrap();
        books[0] = books[0]
            .clone()
            .with_promotion(Some(Promotion::from_parts(None, "broken")));

        let plan = ProjectionPlan::book_list().with_page(Page::new(2, 1));
        let results: Vec<_> = plan.apply(&books).collect();

        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0],
            Err(ProjectionError::InvalidPromotion {
                book_id: BookId::new(1)
            })
        );
        // 错误不占分页位置：第 2 页是第二本成功投影的书
        assert_eq!(results[1].as_ref().map(|d| d.book_id), Ok(BookId::new(3)));

        let collected = plan.apply(&books).collect::<Result<Vec<_>, _>>();
        assert!(collected.is_err());
    }

    #[test]
    fn test_page_normalizes_bounds() {
        let page = Page::new(0, 0);
        assert_eq!((page.number(), page.size(), page.offset()), (1, 1, 0));
        assert_eq!(Page::new(3, 10).offset(), 20);
    }
}
