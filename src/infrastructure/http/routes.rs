//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping              GET   健康检查
//! - /api/book/get          POST  获取单本书的列表条目
//! - /api/book/list         POST  书籍列表（排序、过滤、分页）
//! - /api/book/top-rated    GET   按平均评分排序的书籍（原始 SQL）

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/book", book_routes())
}

/// Book 路由
fn book_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/get", post(handlers::get_book))
        .route("/list", post(handlers::list_books))
        .route("/top-rated", get(handlers::top_rated_books))
}
