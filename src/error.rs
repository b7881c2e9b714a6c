use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    /// Weight/bucket counts disagree, or a candidate's bucket shape differs
    /// from the query's.
    #[error("dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("no candidates to score against")]
    EmptyCandidateSet,

    #[error("item {item} appears more than once in the candidate set")]
    DuplicateItem { item: String },

    /// The distance primitive returned a negative or non-finite value.
    #[error("invalid distance {value} for candidate {item}, bucket {bucket}")]
    InvalidDistance {
        item: String,
        bucket: usize,
        value: f32,
    },

    #[error("reduction produced no value for identity {identity}")]
    InvalidReduction { identity: String },

    #[error("scoring cancelled")]
    Cancelled,
}

impl ScoreError {
    pub(crate) fn mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }
}
