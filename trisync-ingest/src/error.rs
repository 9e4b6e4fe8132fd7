use thiserror::Error;

use crate::types::DetailField;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("detail view is missing the '{}' field", .0.label())]
    MissingLabel(DetailField),

    #[error("detail view has neither 'Bedrag bij' nor 'Bedrag af'")]
    MissingAmount,

    #[error("detail view has {labels} labels but {values} values")]
    LabelValueMismatch { labels: usize, values: usize },

    #[error("export row {row} has {found} columns, expected 8")]
    ColumnCount { row: usize, found: usize },

    #[error("invalid date '{0}' (expected DD-MM-YYYY)")]
    InvalidDate(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;
