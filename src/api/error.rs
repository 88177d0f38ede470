use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

/// A failed request, rendered as the `{"status": false, "message": ...}`
/// envelope. List routes additionally carry their payload key as an empty
/// array so consumers always see the same shape.
#[derive(Debug)]
pub struct ApiError {
    status_code: StatusCode,
    message: String,
    extras: Vec<(&'static str, Value)>,
}

impl ApiError {
    #[must_use]
    pub fn internal(err: &anyhow::Error) -> Self {
        tracing::error!("Request failed: {err:#}");
        Self {
            status_code: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
            extras: Vec::new(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status_code: StatusCode::NOT_FOUND,
            message: message.into(),
            extras: Vec::new(),
        }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status_code: StatusCode::BAD_REQUEST,
            message: message.into(),
            extras: Vec::new(),
        }
    }

    /// Adds `key: []` to the error body.
    #[must_use]
    pub fn with_list(mut self, key: &'static str) -> Self {
        self.extras.push((key, json!([])));
        self
    }

    /// Adds `key: null` to the error body.
    #[must_use]
    pub fn with_null(mut self, key: &'static str) -> Self {
        self.extras.push((key, Value::Null));
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "status": false,
            "message": self.message,
        });
        if let Some(map) = body.as_object_mut() {
            for (key, value) in self.extras {
                map.insert(key.to_string(), value);
            }
        }
        (self.status_code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_carries_empty_payload_keys() {
        let err = ApiError::not_found("Genre not found").with_list("genreAnime");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
