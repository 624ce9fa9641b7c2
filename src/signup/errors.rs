use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

/// Rejections raised before anything touches storage. The messages are
/// shown to the user as-is.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill out all fields and agree to the terms.")]
    MissingFields,
    #[error("Invalid email format. Please enter a valid email.")]
    InvalidEmail,
    #[error("Invalid ID number format. Use ####-#### (e.g., 0222-0282).")]
    InvalidIdNumber,
    #[error("Invalid role. Please select Student or Faculty.")]
    InvalidRole,
}

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("This ID number is already registered. Please use another one.")]
    DuplicateIdNumber,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RepoError {
    pub(crate) fn classify(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::DuplicateIdNumber,
            _ => RepoError::Database(e),
        }
    }
}

#[derive(Debug, Error)]
pub enum SignupError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl SignupError {
    pub fn status(&self) -> StatusCode {
        match self {
            SignupError::Validation(_) => StatusCode::BAD_REQUEST,
            SignupError::Repo(RepoError::DuplicateIdNumber) => StatusCode::CONFLICT,
            SignupError::Repo(RepoError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SignupError {
    fn into_response(self) -> Response {
        (self.status(), Html(format!("<h2>⚠️ {self}</h2>"))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            SignupError::from(ValidationError::InvalidRole).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SignupError::from(RepoError::DuplicateIdNumber).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            SignupError::from(RepoError::Database(sqlx::Error::PoolTimedOut)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn database_error_carries_underlying_description() {
        let err = SignupError::from(RepoError::Database(sqlx::Error::PoolTimedOut));
        let msg = err.to_string();
        assert!(msg.starts_with("Database error: "));
        assert!(msg.len() > "Database error: ".len());
    }
}
