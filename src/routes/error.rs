// HTTP error type: every failure becomes `{error, details?}` with a matching status

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::docker_repo::DockerError;
use crate::host::HostError;
use crate::integrations::IntegrationError;
use crate::port_scanner::ScanError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("{error}")]
    Upstream {
        error: String,
        details: Option<String>,
    },
    #[error("{error}")]
    Internal {
        error: String,
        details: Option<String>,
    },
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

impl ApiError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        warn!(error = %err, "{}", context);
        Self::Internal {
            error: context.to_string(),
            details: Some(err.to_string()),
        }
    }

    /// Caller mistakes and disabled features keep their status; anything else is a 500
    /// labelled with `context`.
    pub fn host(context: &str, err: HostError) -> Self {
        match err {
            HostError::Invalid(m) => Self::BadRequest(m),
            HostError::Disabled(m) => Self::Forbidden(m),
            other => Self::internal(context, other),
        }
    }

    pub fn upstream(context: &str, err: IntegrationError) -> Self {
        warn!(error = %err, "{}", context);
        Self::Upstream {
            error: context.to_string(),
            details: Some(err.to_string()),
        }
    }

    pub fn docker(context: &str, err: DockerError) -> Self {
        match err {
            e @ DockerError::Unavailable(_) => Self::Unavailable(e.to_string()),
            DockerError::NotFound(id) => Self::NotFound(format!("Container not found: {}", id)),
            e @ DockerError::Api(_) => Self::internal(context, e),
        }
    }
}

impl From<ScanError> for ApiError {
    fn from(e: ScanError) -> Self {
        match e {
            ScanError::InvalidPorts(_) => Self::BadRequest(e.to_string()),
            ScanError::NoLocalAddress => Self::internal("Failed to get local IP", e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error, details) = match &self {
            Self::BadRequest(m) | Self::Forbidden(m) | Self::NotFound(m) | Self::Unavailable(m) => {
                (m.as_str(), None)
            }
            Self::Upstream { error, details } | Self::Internal { error, details } => {
                (error.as_str(), details.as_deref())
            }
        };
        (status, Json(ErrorBody { error, details })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::host("x", HostError::Disabled("off".into())).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::docker("x", DockerError::NotFound("abc".into())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::docker(
                "x",
                DockerError::Unavailable(bollard::errors::Error::RequestTimeoutError)
            )
            .status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(ScanError::InvalidPorts("abc".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn unavailable_docker_keeps_the_daemon_message() {
        let err = ApiError::docker(
            "Failed to list containers",
            DockerError::Unavailable(bollard::errors::Error::RequestTimeoutError),
        );
        assert!(err.to_string().starts_with("Failed to connect to Docker daemon"));
    }
}
