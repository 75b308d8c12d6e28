//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::{BookFilter, BookListDisplay, BookOrder};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Book DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GetBookRequest {
    pub id: i64,
}

/// 排序选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderByOption {
    /// ID 倒序
    SimpleOrder,
    ByVotes,
    ByPublicationDate,
    ByPriceLowestFirst,
    ByPriceHighestFirst,
}

impl From<OrderByOption> for BookOrder {
    fn from(option: OrderByOption) -> Self {
        match option {
            OrderByOption::SimpleOrder => BookOrder::ByIdDescending,
            OrderByOption::ByVotes => BookOrder::ByVotes,
            OrderByOption::ByPublicationDate => BookOrder::ByPublicationDate,
            OrderByOption::ByPriceLowestFirst => BookOrder::ByPriceLowestFirst,
            OrderByOption::ByPriceHighestFirst => BookOrder::ByPriceHighestFirst,
        }
    }
}

/// 过滤选项，例如 `{"by_votes": 4}` 或 `{"by_publication_year": 2002}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterByOption {
    /// 平均评分严格高于该星数
    ByVotes(u8),
    ByPublicationYear(i32),
}

impl From<FilterByOption> for BookFilter {
    fn from(option: FilterByOption) -> Self {
        match option {
            FilterByOption::ByVotes(stars) => BookFilter::AverageVotesAbove(stars),
            FilterByOption::ByPublicationYear(year) => BookFilter::PublishedInYear(year),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListBooksRequest {
    #[serde(default)]
    pub order_by: Option<OrderByOption>,
    #[serde(default)]
    pub filter: Option<FilterByOption>,
    /// 页码，从 1 开始
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

/// 书籍列表条目，金额和平均分都保留两位小数
#[derive(Debug, Serialize)]
pub struct BookListItemResponse {
    pub book_id: i64,
    pub title: String,
    pub published_on: String,
    pub price: String,
    pub actual_price: String,
    pub promotional_text: Option<String>,
    pub authors_ordered: String,
    pub reviews_count: u32,
    pub reviews_average_votes: Option<String>,
}

impl From<BookListDisplay> for BookListItemResponse {
    fn from(display: BookListDisplay) -> Self {
        Self {
            book_id: display.book_id.value(),
            title: display.title,
            published_on: display.published_on.to_rfc3339(),
            price: display.price.to_string(),
            actual_price: display.actual_price.to_string(),
            promotional_text: display.promotional_text,
            authors_ordered: display.authors_ordered,
            reviews_count: display.reviews_count,
            reviews_average_votes: display
                .reviews_average_votes
                .map(|avg| avg.to_decimal_string(2)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookListResponse {
    pub page: u32,
    pub page_size: u32,
    pub books: Vec<BookListItemResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_request_defaults() {
        let req: ListBooksRequest = serde_json::from_str("{}").unwrap();
        assert!(req.order_by.is_none());
        assert!(req.filter.is_none());
        assert!(req.page.is_none());
    }

    #[test]
    fn test_list_request_options() {
        let req: ListBooksRequest = serde_json::from_str(
            r#"{"order_by": "by_price_lowest_first", "filter": {"by_votes": 4}, "page": 2}"#,
        )
        .unwrap();
        assert_eq!(
            req.order_by.map(BookOrder::from),
            Some(BookOrder::ByPriceLowestFirst)
        );
        assert_eq!(
            req.filter.map(BookFilter::from),
            Some(BookFilter::AverageVotesAbove(4))
        );
        assert_eq!(req.page, Some(2));
    }

    #[test]
    fn test_unknown_order_rejected() {
        let result = serde_json::from_str::<ListBooksRequest>(r#"{"order_by": "by_title"}"#);
        assert!(result.is_err());
    }
}
