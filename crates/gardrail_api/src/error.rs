//! API error mapping.
//!
//! # Responsibility
//! - Convert core repository errors into HTTP statuses and a JSON error body.
//!
//! # Invariants
//! - Uniqueness violations are 409, validation and integrity failures 422,
//!   missing entities 404, malformed input 400, storage failures 500.
//! - Storage failure details are logged, never leaked to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gardrail_core::RepoError;
use log::error;
use serde::Serialize;

pub type ApiResult<T> = Result<T, ApiError>;

/// JSON error body returned on every failure.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Request-level error, convertible from core repository errors.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request input (bad uuid, unparsable body field).
    BadRequest(String),
    /// Well-formed input that violates a content rule (unknown vocab code,
    /// missing variant payload).
    Invalid(String),
    /// Core repository failure, mapped by taxonomy.
    Repo(RepoError),
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Invalid(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
            Self::Repo(err) => match &err {
                RepoError::CuiConflict(_)
                | RepoError::DuplicateSynonym(_)
                | RepoError::DuplicatePair { .. }
                | RepoError::DuplicateFrequency => (StatusCode::CONFLICT, err.to_string()),
                RepoError::TermNotFound(_)
                | RepoError::SynonymNotFound(_)
                | RepoError::AssociationNotFound(_)
                | RepoError::FrequencyNotFound(_)
                | RepoError::PrevalenceNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                RepoError::Validation(_)
                | RepoError::KindMismatch { .. }
                | RepoError::ImmutableIdentity { .. }
                | RepoError::InvalidFrequencyEncoding => {
                    (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
                }
                RepoError::Db(_)
                | RepoError::UninitializedConnection { .. }
                | RepoError::MissingRequiredTable(_)
                | RepoError::MissingRequiredColumn { .. }
                | RepoError::InvalidData(_) => {
                    error!("event=request_failed module=api status=error error={err}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal storage error".to_string(),
                    )
                }
            },
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}
