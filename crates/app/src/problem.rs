use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error};

use tenant_polls_core::ValidationErrors;
use tenant_polls_storage::{DomainError, PollError};

use crate::resolver::ResolveError;

#[derive(Debug, Serialize)]
struct ProblemDetails {
    #[serde(rename = "type")]
    problem_type: &'static str,
    title: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<ValidationErrors>,
}

#[derive(Debug)]
pub struct ProblemResponse {
    status: StatusCode,
    body: ProblemDetails,
}

impl ProblemResponse {
    pub fn new<S: Into<String>>(status: StatusCode, problem_type: &'static str, detail: S) -> Self {
        Self {
            status,
            body: ProblemDetails {
                problem_type,
                title: status.canonical_reason().unwrap_or("error"),
                detail: detail.into(),
                errors: None,
            },
        }
    }

    /// 422 response listing every field that failed cleaning.
    pub fn validation(errors: ValidationErrors) -> Self {
        let fields: Vec<&str> = errors.iter().map(|error| error.field).collect();
        debug!(stage = "http", ?fields, "validation failed");
        let mut problem = Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_failed",
            errors.to_string(),
        );
        problem.body.errors = Some(errors);
        problem
    }

    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        error!(stage = "http", error = %err, "request failed");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "an unexpected error occurred",
        )
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let mut response = Json(self.body).into_response();
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

impl From<ResolveError> for ProblemResponse {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "domain_not_found", err.to_string())
            }
            ResolveError::Ambiguous { .. } => {
                Self::new(StatusCode::CONFLICT, "domain_ambiguous", err.to_string())
            }
            ResolveError::NoLookupKey => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_host", err.to_string())
            }
            ResolveError::Storage(inner) => Self::internal(inner),
        }
    }
}

impl From<DomainError> for ProblemResponse {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound => {
                Self::new(StatusCode::NOT_FOUND, "domain_not_found", "domain not found")
            }
            DomainError::Duplicate => Self::new(
                StatusCode::CONFLICT,
                "domain_exists",
                "a domain with that name already exists",
            ),
            DomainError::MultipleMatches => {
                Self::new(StatusCode::CONFLICT, "domain_ambiguous", err.to_string())
            }
            DomainError::Validation(errors) => Self::validation(errors),
            DomainError::Database(inner) => Self::internal(inner),
        }
    }
}

impl From<PollError> for ProblemResponse {
    fn from(err: PollError) -> Self {
        match err {
            PollError::NotFound => {
                Self::new(StatusCode::NOT_FOUND, "poll_not_found", "poll not found")
            }
            PollError::OptionNotFound(_) => Self::new(
                StatusCode::NOT_FOUND,
                "poll_option_not_found",
                err.to_string(),
            ),
            PollError::MissingDomain => Self::new(
                StatusCode::NOT_FOUND,
                "domain_not_found",
                "the current domain no longer exists",
            ),
            PollError::Validation(errors) => Self::validation(errors),
            PollError::Database(inner) => Self::internal(inner),
        }
    }
}
