//! Error handling for the Gridflow Server API
//!
//! Errors are returned as a JSON body plus the `X-REST-Status` and
//! `X-Error-*` headers that REST clients of the workflow service inspect.

use axum::{
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::ServerError;

/// API error wrapper turning a [`ServerError`] into an HTTP response
#[derive(Debug)]
pub struct ApiError(pub ServerError);

impl From<ServerError> for ApiError {
    fn from(err: ServerError) -> Self {
        ApiError(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// HTTP status and stable error code for a server error
pub fn status_and_code(err: &ServerError) -> (StatusCode, &'static str) {
    match err {
        ServerError::MissingParameter(_) => (StatusCode::BAD_REQUEST, "ERR_MISSING_PARAMETER"),
        ServerError::InvalidParameter(_) => (StatusCode::BAD_REQUEST, "ERR_INVALID_PARAMETER"),
        ServerError::MissingObject(_) => (StatusCode::BAD_REQUEST, "ERR_MISSING_OBJECT"),
        ServerError::ObjectAlreadyExists(_) => (StatusCode::BAD_REQUEST, "ERR_OBJECT_ALREADY_EXISTS"),
        ServerError::InvalidState(_) => (StatusCode::BAD_REQUEST, "ERR_INVALID_STATE"),
        ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, "ERR_FORBIDDEN"),
        ServerError::MissingPrincipal(_) => (StatusCode::FORBIDDEN, "ERR_MISSING_PRINCIPAL"),
        ServerError::UnsupportedMethod(_) => (StatusCode::METHOD_NOT_ALLOWED, "ERR_UNSUPPORTED_METHOD"),
        ServerError::ExecutionError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ERR_EXECUTION_ERROR"),
        ServerError::ConfigurationError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ERR_CONFIGURATION_ERROR"),
        ServerError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ERR_INTERNAL_SERVER_ERROR"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, error_code) = status_and_code(&err);
        let app_code = err.app_code();
        let message = err.to_string();
        let error_id = Uuid::new_v4().simple().to_string();

        if err.is_client_error() {
            warn!(%error_id, %error_code, %message, "Request refused");
        } else {
            error!(%error_id, %error_code, %message, "Request failed");
        }

        let mut headers = HeaderMap::new();
        insert_header(&mut headers, "x-rest-status", &app_code.to_string());
        insert_header(&mut headers, "x-error-http", status.as_str());
        insert_header(&mut headers, "x-error-id", &error_id);
        insert_header(&mut headers, "x-error-detail", error_code);
        insert_header(&mut headers, "x-error-info", &message);

        let body = Json(json!({
            "error": message,
            "errorDetails": {
                "errorCode": error_code,
                "errorMessage": message,
                "appCode": app_code,
                "errorId": error_id,
            }
        }));

        (status, headers, body).into_response()
    }
}

// Header values must be visible ASCII; anything else is dropped from the header but kept in the body.
fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(HeaderName::from_static(name), value);
    }
}
