use axum::http::StatusCode;
use reqwest::StatusCode as UpstreamStatus;
use thiserror::Error;

/// Failure of a call against the care API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Http { status: UpstreamStatus, message: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("not signed in")]
    Unauthenticated,
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Http { status, .. } => {
                *status == UpstreamStatus::UNAUTHORIZED || *status == UpstreamStatus::FORBIDDEN
            }
            Self::Unauthenticated => true,
            _ => false,
        }
    }

    pub fn status(&self) -> Option<UpstreamStatus> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<&ApiError> for AppError {
    fn from(err: &ApiError) -> Self {
        let status = match err.status() {
            Some(status) if status.is_client_error() => {
                StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            _ if matches!(err, ApiError::Unauthenticated) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        Self::from(&err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_client_errors_keep_their_status() {
        let err = ApiError::Http {
            status: UpstreamStatus::NOT_FOUND,
            message: "client not found".into(),
        };
        let app: AppError = err.into();
        assert_eq!(app.status, StatusCode::NOT_FOUND);
        assert_eq!(app.message, "client not found");
    }

    #[test]
    fn upstream_server_errors_become_bad_gateway() {
        let err = ApiError::Http {
            status: UpstreamStatus::INTERNAL_SERVER_ERROR,
            message: "boom".into(),
        };
        assert!(!err.is_unauthorized());
        let app: AppError = err.into();
        assert_eq!(app.status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn missing_session_counts_as_unauthorized() {
        assert!(ApiError::Unauthenticated.is_unauthorized());
        let app: AppError = ApiError::Unauthenticated.into();
        assert_eq!(app.status, StatusCode::UNAUTHORIZED);
    }
}
