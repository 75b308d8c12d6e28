//! Book Context - 关联加载状态
//!
//! 区分“未加载”与“已加载但为空/不存在”

use std::fmt;

/// 聚合内的关联
///
/// `NotLoaded` 表示检索时没有包含该关联，不能当作空集合或“无促销”处理
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation<T> {
    NotLoaded,
    Loaded(T),
}

impl<T> Relation<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Relation::Loaded(_))
    }

    /// 已加载时返回内部值
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Relation::Loaded(value) => Some(value),
            Relation::NotLoaded => None,
        }
    }
}

/// 关联种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Promotion,
    AuthorLinks,
    Author,
    Reviews,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Promotion => "promotion",
            RelationKind::AuthorLinks => "author_links",
            RelationKind::Author => "author",
            RelationKind::Reviews => "reviews",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 检索聚合时要包含的关联
///
/// 作者链接总是连同作者一起加载
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookIncludes {
    pub promotion: bool,
    pub author_links: bool,
    pub reviews: bool,
}

impl BookIncludes {
    /// 包含全部关联
    pub fn all() -> Self {
        Self {
            promotion: true,
            author_links: true,
            reviews: true,
        }
    }

    /// 只加载书籍本身
    pub fn none() -> Self {
        Self {
            promotion: false,
            author_links: false,
            reviews: false,
        }
    }
}

impl Default for BookIncludes {
    fn default() -> Self {
        Self::all()
    }
}
