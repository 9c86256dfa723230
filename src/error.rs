use thiserror::Error;

pub const INFEASIBLE_MESSAGE: &str = "No solution found. The constraints might be too tight. \
     Try reducing the number of classes or adding more resources.";

#[derive(Debug, Error)]
pub enum TimetableError {
    /// Malformed or missing input fields. No model is built.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Sessions for which no faculty, room and free slot combination exists.
    #[error(
        "No capable and available faculty, room and time slot exists for sessions: {}",
        .0.join(", ")
    )]
    UnplaceableSessions(Vec<String>),

    #[error("{}", INFEASIBLE_MESSAGE)]
    Infeasible,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TimetableError {
    pub fn kind(&self) -> &'static str {
        match self {
            TimetableError::Validation(_) => "validation",
            TimetableError::UnplaceableSessions(_) => "unplaceable_sessions",
            TimetableError::Infeasible => "infeasible",
            TimetableError::Internal(_) => "internal",
        }
    }

    /// Whether the caller can fix the failure by changing the request.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, TimetableError::Internal(_))
    }
}

pub type Result<T> = std::result::Result<T, TimetableError>;
