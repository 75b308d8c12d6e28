//! Book Context - Value Objects

use serde::{Deserialize, Serialize};

use super::BookError;

/// 书籍唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BookId(i64);

impl BookId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 作者唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorId(i64);

impl AuthorId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for AuthorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 书名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title(String);

impl Title {
    pub fn new(title: impl Into<String>) -> Result<Self, BookError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(BookError::InvalidTitle("书名不能为空".to_string()));
        }
        if title.chars().count() > 256 {
            return Err(BookError::InvalidTitle("书名长度不能超过256字符".to_string()));
        }
        Ok(Self(title))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Title {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 金额
///
/// 以分为单位的整数存储，避免浮点误差
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// 整数货币单位（如 220 元）
    pub fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// 评分（1-5 星）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StarRating(u8);

impl StarRating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(stars: u8) -> Result<Self, BookError> {
        if !(Self::MIN..=Self::MAX).contains(&stars) {
            return Err(BookError::InvalidStarRating(stars as i64));
        }
        Ok(Self(stars))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for StarRating {
    type Error = BookError;

    fn try_from(stars: i64) -> Result<Self, Self::Error> {
        u8::try_from(stars)
            .map_err(|_| BookError::InvalidStarRating(stars))
            .and_then(Self::new)
    }
}
