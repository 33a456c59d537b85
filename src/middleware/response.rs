use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Successful response: `data` serialized as the JSON body.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data,
            status_code: None,
        }
    }

    /// Create an API response with custom status code
    pub fn with_status(data: T, status_code: StatusCode) -> Self {
        Self {
            data,
            status_code: Some(status_code),
        }
    }
}

impl ApiResponse<Value> {
    /// Confirmation of a write: `{"message": ..., <key_field>: key, ...extra}`.
    pub fn message(message: impl Into<String>, key_field: &str, key: &str) -> Self {
        Self::message_with(message, key_field, key, Map::new())
    }

    pub fn message_with(message: impl Into<String>, key_field: &str, key: &str, extra: Map<String, Value>) -> Self {
        let mut body = Map::new();
        body.insert("message".into(), Value::String(message.into()));
        body.insert(key_field.into(), json!(key));
        body.extend(extra);
        Self::success(Value::Object(body))
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        match serde_json::to_value(&self.data) {
            Ok(value) => (status, Json(value)).into_response(),
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "An error occurred while processing your request",
                        "err": "INTERNAL_SERVER_ERROR"
                    })),
                )
                    .into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
