//! Book Context - 书籍限界上下文
//!
//! 职责:
//! - Book 聚合（促销、作者链接、书评）
//! - 关联加载状态

mod aggregate;
mod entities;
mod errors;
mod relation;
mod value_objects;

pub use aggregate::Book;
pub use entities::{Author, AuthorLink, Promotion, Review};
pub use errors::BookError;
pub use relation::{BookIncludes, Relation, RelationKind};
pub use value_objects::{AuthorId, BookId, Money, StarRating, Title};
