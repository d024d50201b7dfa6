use thiserror::Error;

/// Errors raised by the ranklist core.
///
/// `InvalidUnit` means the input is corrupt and must abort the run.
/// `MalformedRow` only invalidates the ranklist it was found in.
#[derive(Error, Debug)]
pub enum RanklistError {
    #[error("invalid time unit `{0}` (expected one of ms, s, min, h, d)")]
    InvalidUnit(String),

    #[error("malformed row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    #[error("failed to parse ranklist: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RanklistError {
    pub fn malformed(row: usize, reason: impl Into<String>) -> Self {
        RanklistError::MalformedRow {
            row,
            reason: reason.into(),
        }
    }

    /// A duration or row total too large for exact millisecond arithmetic.
    pub fn overflow(row: usize) -> Self {
        RanklistError::malformed(row, "duration overflows")
    }

    /// Whether this error only affects the ranklist it came from.
    pub fn is_file_local(&self) -> bool {
        matches!(self, RanklistError::MalformedRow { .. })
    }
}
