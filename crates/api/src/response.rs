//! Response envelope

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// JSON envelope shared by every JSON endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiResponse<T> {
    /// HTTP status code, mirrored in the response status
    pub code: u16,
    /// `true` for 2xx codes
    pub success: bool,
    /// Empty on success, an error code otherwise
    pub message: String,
    /// Payload
    pub object: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 200 with a payload
    pub fn ok(object: T) -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            success: true,
            message: String::new(),
            object: Some(object),
        }
    }

    /// Error envelope without payload
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            success: status.is_success(),
            message: message.into(),
            object: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
