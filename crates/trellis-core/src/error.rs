use crate::model::CellId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown cell: {0}")]
    UnknownCell(CellId),

    #[error("cannot add {child} below {parent}: {child} is an ancestor of {parent}")]
    CycleDetected { child: CellId, parent: CellId },

    #[error("invalid graph config: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    #[error("invalid value for style key `{key}`: {value}")]
    InvalidStyleValue { key: String, value: String },

    #[error("unsupported style expression: {expression}")]
    UnsupportedExpression { expression: String },
}
