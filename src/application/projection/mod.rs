//! Projection Engine - 读模型投影
//!
//! 把规范化的 Book 聚合映射为扁平的 BookListDisplay：
//! - engine: project_one / project_many / project_stream
//! - plan: 以规则列表表达的映射，可下推到存储层
//! - display: 读模型与精确平均评分

mod display;
mod engine;
mod error;
mod plan;

pub use display::{AverageRating, BookListDisplay};
pub use engine::{
    actual_price, authors_ordered, project_many, project_one, project_stream, promotional_text,
    reviews_average_votes, reviews_count, AUTHOR_SEPARATOR,
};
pub use error::ProjectionError;
pub use plan::{
    BookFilter, BookOrder, DisplayField, FieldExtractor, FieldValue, MappingRule, Page,
    ProjectionPlan,
};
