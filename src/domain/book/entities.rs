//! Book Context - Entities

use super::{AuthorId, Money, Relation, StarRating};

/// 作者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    id: AuthorId,
    name: String,
}

impl Author {
    pub fn new(id: AuthorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> AuthorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// 书籍与作者的链接
///
/// 不变量:
/// - `order` 决定作者名显示顺序，相同 order 时保持插入顺序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorLink {
    author_id: AuthorId,
    order: u8,
    author: Relation<Author>,
}

impl AuthorLink {
    /// 作者已解析的链接
    pub fn new(order: u8, author: Author) -> Self {
        Self {
            author_id: author.id(),
            order,
            author: Relation::Loaded(author),
        }
    }

    /// 只有作者 ID，作者本身未加载
    pub fn unresolved(order: u8, author_id: AuthorId) -> Self {
        Self {
            author_id,
            order,
            author: Relation::NotLoaded,
        }
    }

    pub fn author_id(&self) -> AuthorId {
        self.author_id
    }

    pub fn order(&self) -> u8 {
        self.order
    }

    pub fn author(&self) -> &Relation<Author> {
        &self.author
    }
}

/// 促销
///
/// `new_price` 为 `None` 是数据错误，而不是“没有促销”
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    new_price: Option<Money>,
    promotional_text: String,
}

impl Promotion {
    pub fn new(new_price: Money, promotional_text: impl Into<String>) -> Self {
        Self {
            new_price: Some(new_price),
            promotional_text: promotional_text.into(),
        }
    }

    /// 从存储读出的原始促销记录，价格可能缺失
    pub fn from_parts(new_price: Option<Money>, promotional_text: impl Into<String>) -> Self {
        Self {
            new_price,
            promotional_text: promotional_text.into(),
        }
    }

    pub fn new_price(&self) -> Option<Money> {
        self.new_price
    }

    pub fn promotional_text(&self) -> &str {
        &self.promotional_text
    }
}

/// 书评
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    voter_name: String,
    num_stars: StarRating,
    comment: Option<String>,
}

impl Review {
    pub fn new(voter_name: impl Into<String>, num_stars: StarRating, comment: Option<String>) -> Self {
        Self {
            voter_name: voter_name.into(),
            num_stars,
            comment,
        }
    }

    pub fn voter_name(&self) -> &str {
        &self.voter_name
    }

    pub fn num_stars(&self) -> StarRating {
        self.num_stars
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}
