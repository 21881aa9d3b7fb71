use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use go_core::CoreError;
use serde_json::json;

use crate::engine::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    GameRecord(#[from] CoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::GameRecord(_) => StatusCode::BAD_REQUEST,
            AppError::Engine(EngineError::Timeout(_) | EngineError::Rejected { .. }) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "Engine error: {message}");
        } else {
            tracing::debug!("Bad request: {message}");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::engine::SessionState;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::from(CoreError::Parse("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(CoreError::UnsupportedSize(21)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(CoreError::Range { row: 0, col: 30 }).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(EngineError::Timeout(Duration::from_secs(1))).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::from(EngineError::Crashed("eof".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(EngineError::State {
                state: SessionState::Terminated,
                operation: "analyze",
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            AppError::from(CoreError::UnsupportedSize(21)).to_string(),
            "Unsupported board size: 21"
        );
    }
}
