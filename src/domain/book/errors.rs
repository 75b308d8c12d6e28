//! Book Context - Errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookError {
    #[error("无效的书名: {0}")]
    InvalidTitle(String),

    #[error("无效的评分: {0}（必须在 1 到 5 之间）")]
    InvalidStarRating(i64),

    #[error("无效的作者顺序: {0}")]
    InvalidAuthorOrder(i64),

    #[error("无效的日期: {0}")]
    InvalidDate(String),
}
