//! Mapping of engine failures onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use torrhub_core::{EngineError, SessionError, SpecError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An error returned from an API handler.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let status = match &err {
            EngineError::NotFound(_) | EngineError::Session(SessionError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            EngineError::Session(SessionError::InvalidSpec(_)) => StatusCode::BAD_REQUEST,
            EngineError::ShuttingDown | EngineError::Session(SessionError::Disconnected) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            EngineError::Session(SessionError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<SpecError> for ApiError {
    fn from(err: SpecError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_status() {
        let cases = [
            (EngineError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (EngineError::ShuttingDown, StatusCode::SERVICE_UNAVAILABLE),
            (
                EngineError::Session(SessionError::Disconnected),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                EngineError::Session(SessionError::Timeout("x".into())),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                EngineError::Session(SessionError::AddFailed("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                EngineError::Session(SessionError::InvalidSpec(SpecError::InvalidHash(
                    "x".into(),
                ))),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }
}
