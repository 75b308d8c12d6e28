//! 书籍列表展示读模型

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fmt;

use super::{DisplayField, FieldValue, ProjectionError};
use crate::domain::book::{BookId, Money, StarRating};

/// 平均评分
///
/// 以约分后的分数精确保存 `总星数 / 评论数`，只在展示时取整
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AverageRating {
    numerator: u64,
    denominator: u64,
}

impl AverageRating {
    /// 小数展示的最大位数
    pub const MAX_SCALE: u32 = 18;

    /// 评论数为 0 时返回 `None`
    pub fn from_total(total_stars: u64, count: u64) -> Option<Self> {
        if count == 0 {
            return None;
        }
        let divisor = gcd(total_stars, count);
        Some(Self {
            numerator: total_stars / divisor,
            denominator: count / divisor,
        })
    }

    pub fn from_ratings(ratings: impl IntoIterator<Item = StarRating>) -> Option<Self> {
        let (total, count) = ratings
            .into_iter()
            .fold((0_u64, 0_u64), |(total, count), r| {
                (total + u64::from(r.value()), count + 1)
            });
        Self::from_total(total, count)
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    /// 四舍五入到 `scale` 位小数
    pub fn to_decimal_string(&self, scale: u32) -> String {
        let scale = scale.min(Self::MAX_SCALE);
        let factor = 10_u128.pow(scale);
        let scaled = u128::from(self.numerator) * factor;
        let denominator = u128::from(self.denominator);

        let mut quotient = scaled / denominator;
        if (scaled % denominator) * 2 >= denominator {
            quotient += 1;
        }

        if scale == 0 {
            return quotient.to_string();
        }
        format!(
            "{}.{:0width$}",
            quotient / factor,
            quotient % factor,
            width = scale as usize
        )
    }
}

impl Ord for AverageRating {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = u128::from(self.numerator) * u128::from(other.denominator);
        let rhs = u128::from(other.numerator) * u128::from(self.denominator);
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for AverageRating {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AverageRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string(2))
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a.max(1)
}

/// 书籍列表展示记录（不持久化，按请求构造）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookListDisplay {
    pub book_id: BookId,
    pub title: String,
    pub published_on: DateTime<Utc>,
    pub price: Money,
    /// 有促销时为促销价，否则为原价
    pub actual_price: Money,
    pub promotional_text: Option<String>,
    /// 按作者顺序以 ", " 连接
    pub authors_ordered: String,
    pub reviews_count: u32,
    /// 没有评论时为 `None`
    pub reviews_average_votes: Option<AverageRating>,
}

impl BookListDisplay {
    /// 由映射规则产出的字段值组装展示记录
    ///
    /// 任何字段缺失或类型不符都返回 `IncompletePlan`，同一字段出现两次返回 `DuplicateField`
    pub fn from_fields(
        fields: impl IntoIterator<Item = (DisplayField, FieldValue)>,
    ) -> Result<Self, ProjectionError> {
        let mut book_id = None;
        let mut title = None;
        let mut published_on = None;
        let mut price = None;
        let mut actual_price = None;
        let mut promotional_text = None;
        let mut authors_ordered = None;
        let mut reviews_count = None;
        let mut reviews_average_votes = None;

        let mut seen: Vec<DisplayField> = Vec::with_capacity(9);
        for (field, value) in fields {
            if seen.contains(&field) {
                return Err(ProjectionError::DuplicateField { field });
            }
            seen.push(field);

            match (field, value) {
                (DisplayField::BookId, FieldValue::Id(v)) => book_id = Some(v),
                (DisplayField::Title, FieldValue::Text(v)) => title = Some(v),
                (DisplayField::PublishedOn, FieldValue::Timestamp(v)) => published_on = Some(v),
                (DisplayField::Price, FieldValue::Money(v)) => price = Some(v),
                (DisplayField::ActualPrice, FieldValue::Money(v)) => actual_price = Some(v),
                (DisplayField::PromotionalText, FieldValue::OptionalText(v)) => {
                    promotional_text = Some(v)
                }
                (DisplayField::AuthorsOrdered, FieldValue::Text(v)) => authors_ordered = Some(v),
                (DisplayField::ReviewsCount, FieldValue::Count(v)) => reviews_count = Some(v),
                (DisplayField::ReviewsAverageVotes, FieldValue::Average(v)) => {
                    reviews_average_votes = Some(v)
                }
                (field, _) => return Err(ProjectionError::IncompletePlan { field }),
            }
        }

        let missing = |field| ProjectionError::IncompletePlan { field };
        Ok(Self {
            book_id: book_id.ok_or_else(|| missing(DisplayField::BookId))?,
            title: title.ok_or_else(|| missing(DisplayField::Title))?,
            published_on: published_on.ok_or_else(|| missing(DisplayField::PublishedOn))?,
            price: price.ok_or_else(|| missing(DisplayField::Price))?,
            actual_price: actual_price.ok_or_else(|| missing(DisplayField::ActualPrice))?,
            promotional_text: promotional_text
                .ok_or_else(|| missing(DisplayField::PromotionalText))?,
            authors_ordered: authors_ordered.ok_or_else(|| missing(DisplayField::AuthorsOrdered))?,
            reviews_count: reviews_count.ok_or_else(|| missing(DisplayField::ReviewsCount))?,
            reviews_average_votes: reviews_average_votes
                .ok_or_else(|| missing(DisplayField::ReviewsAverageVotes))?,
        })
    }
}
