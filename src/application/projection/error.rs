//! 投影错误
//!
//! 都是调用方或数据缺陷，不可重试

use thiserror::Error;

use super::DisplayField;
use crate::domain::book::{BookId, RelationKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    /// 所需关联在投影前未加载
    #[error("Incomplete aggregate: relation '{relation}' of book {book_id} was not loaded")]
    IncompleteAggregate {
        book_id: BookId,
        relation: RelationKind,
    },

    /// 促销存在但没有覆盖价格
    #[error("Invalid promotion on book {book_id}: override price is missing")]
    InvalidPromotion { book_id: BookId },

    /// 映射计划没有为字段产出对应类型的值
    #[error("Mapping plan produced no usable value for field '{field}'")]
    IncompletePlan { field: DisplayField },

    /// 映射计划对同一字段给出了多条规则
    #[error("Mapping plan maps field '{field}' more than once")]
    DuplicateField { field: DisplayField },
}

impl ProjectionError {
    pub fn incomplete(book_id: BookId, relation: RelationKind) -> Self {
        Self::IncompleteAggregate { book_id, relation }
    }
}
