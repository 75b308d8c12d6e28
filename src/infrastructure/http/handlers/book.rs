//! Book HTTP Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{BookOrder, GetBookListItem, ListBooks, ListBooksByRawSql, Page};
use crate::domain::book::BookId;
use crate::infrastructure::http::dto::{
    ApiResponse, BookListItemResponse, BookListResponse, GetBookRequest, ListBooksRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 获取单本书的列表条目
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetBookRequest>,
) -> Result<Json<ApiResponse<BookListItemResponse>>, ApiError> {
    let query = GetBookListItem {
        book_id: BookId::new(req.id),
    };

    let display = state.get_book_handler.handle(query).await?;

    Ok(Json(ApiResponse::success(display.into())))
}

/// 书籍列表
///
/// 未指定页码时返回第一页；页大小超过上限时截断到上限
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ListBooksRequest>,
) -> Result<Json<ApiResponse<BookListResponse>>, ApiError> {
    let limits = state.listing;
    if req.page_size == Some(0) {
        return Err(ApiError::BadRequest("page_size must be at least 1".to_string()));
    }
    let page_size = req
        .page_size
        .unwrap_or(limits.default_page_size)
        .min(limits.max_page_size);
    let page = Page::new(req.page.unwrap_or(1), page_size);

    let query = ListBooks {
        order: req.order_by.map(BookOrder::from),
        filter: req.filter.map(Into::into),
        page: Some(page),
    };

    let displays = state.list_books_handler.handle(query).await?;

    Ok(Json(ApiResponse::success(BookListResponse {
        page: page.number(),
        page_size: page.size(),
        books: displays.into_iter().map(Into::into).collect(),
    })))
}

/// 按平均评分从高到低列出书籍（原始 SQL 路径）
pub async fn top_rated_books(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<BookListItemResponse>>>, ApiError> {
    let displays = state
        .list_books_by_raw_sql_handler
        .handle(ListBooksByRawSql::top_rated())
        .await?;

    Ok(Json(ApiResponse::success(
        displays.into_iter().map(Into::into).collect(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::BookRepositoryPort;
    use crate::domain::seed::four_books;
    use crate::infrastructure::http::routes::create_routes;
    use crate::infrastructure::http::state::ListingLimits;
    use crate::infrastructure::memory::InMemoryBookRepository;
    use crate::infrastructure::persistence::sqlite::{
        create_pool, run_migrations, DatabaseConfig, SqliteBookRepository,
    };
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Method, Request},
        Router,
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn app_with(repo: Arc<dyn BookRepositoryPort>) -> Router {
        let limits = ListingLimits {
            default_page_size: 2,
            max_page_size: 3,
        };
        create_routes().with_state(Arc::new(AppState::new(repo, limits)))
    }

    fn memory_app() -> Router {
        app_with(Arc::new(InMemoryBookRepository::with_books(
            four_books().unwrap(),
        )))
    }

    async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> Value {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let json = call(memory_app(), Method::GET, "/api/ping", None).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "booklist");
    }

    #[tokio::test]
    async fn test_get_book_with_promotion() {
        let json = call(
            memory_app(),
            Method::POST,
            "/api/book/get",
            Some(json!({ "id": 4 })),
        )
        .await;

        assert_eq!(json["errno"], 0);
        let data = &json["data"];
        assert_eq!(data["title"], "Quantum Networking");
        assert_eq!(data["price"], "220.00");
        assert_eq!(data["actual_price"], "219.00");
        assert_eq!(
            data["promotional_text"],
            "Save $1 if you order 40 years ahead!"
        );
        assert_eq!(data["reviews_count"], 2);
        assert_eq!(data["reviews_average_votes"], "5.00");
    }

    #[tokio::test]
    async fn test_get_missing_book() {
        let json = call(
            memory_app(),
            Method::POST,
            "/api/book/get",
            Some(json!({ "id": 99 })),
        )
        .await;

        assert_eq!(json["errno"], 404);
        assert!(json["data"].is_null());
    }

    #[tokio::test]
    async fn test_list_uses_default_page_size() {
        let json = call(memory_app(), Method::POST, "/api/book/list", Some(json!({}))).await;

        assert_eq!(json["errno"], 0);
        assert_eq!(json["data"]["page"], 1);
        assert_eq!(json["data"]["page_size"], 2);
        let books = json["data"]["books"].as_array().unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0]["book_id"], 1);
        assert!(books[0]["reviews_average_votes"].is_null());
    }

    #[tokio::test]
    async fn test_list_with_order_filter_and_page() {
        let json = call(
            memory_app(),
            Method::POST,
            "/api/book/list",
            Some(json!({
                "order_by": "simple_order",
                "filter": { "by_publication_year": 2002 },
                "page": 1,
                "page_size": 50
            })),
        )
        .await;

        assert_eq!(json["data"]["page_size"], 3);
        let books = json["data"]["books"].as_array().unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(
            books[0]["title"],
            "Patterns of Enterprise Application Architecture"
        );
    }

    #[tokio::test]
    async fn test_list_rejects_zero_page_size() {
        let json = call(
            memory_app(),
            Method::POST,
            "/api/book/list",
            Some(json!({ "page_size": 0 })),
        )
        .await;
        assert_eq!(json["errno"], 400);
    }

    #[tokio::test]
    async fn test_top_rated_unavailable_in_memory() {
        let json = call(memory_app(), Method::GET, "/api/book/top-rated", None).await;
        assert_eq!(json["errno"], 500);
    }

    #[tokio::test]
    async fn test_top_rated_with_sqlite() {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = SqliteBookRepository::new(pool);
        for book in four_books().unwrap() {
            repo.save(&book).await.unwrap();
        }

        let json = call(
            app_with(Arc::new(repo)),
            Method::GET,
            "/api/book/top-rated",
            None,
        )
        .await;

        assert_eq!(json["errno"], 0);
        let books = json["data"].as_array().unwrap();
        assert_eq!(books.len(), 4);
        assert_eq!(books[0]["title"], "Quantum Networking");
    }
}
