use quest_types::lifecycle::Rejection;
use quest_types::models::QuestStatus;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QuestError>;

#[derive(Debug, Error)]
pub enum QuestError {
    /// Malformed input the caller can correct.
    #[error("{0}")]
    Validation(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The quest is not in the state the action requires. Callers should
    /// refresh and try again with current data.
    #[error("quest is {actual}, expected {expected}")]
    InvalidState {
        expected: QuestStatus,
        actual: QuestStatus,
    },

    #[error("you have already reviewed this quest")]
    DuplicateReview,

    #[error("review target (to_email) is missing")]
    MissingTarget,

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl QuestError {
    pub(crate) fn quest_not_found(id: i64) -> Self {
        Self::NotFound(format!("quest {id}"))
    }

    pub(crate) fn from_rejection(rejection: Rejection, what: impl Into<String>) -> Self {
        match rejection {
            Rejection::Forbidden => Self::PermissionDenied(what.into()),
            Rejection::WrongState { expected, actual } => Self::InvalidState { expected, actual },
        }
    }

    /// Short machine-readable name, stable across message wording changes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::PermissionDenied(_) => "permission_denied",
            Self::InvalidState { .. } => "invalid_state",
            Self::DuplicateReview => "duplicate_review",
            Self::MissingTarget => "missing_target",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
        }
    }
}
