use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use jobgate_core::ServiceError;

const INTERNAL_MESSAGE: &str = "internal server error";

pub fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Unauthenticated
        | ServiceError::InvalidToken
        | ServiceError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        ServiceError::Forbidden => StatusCode::FORBIDDEN,
        ServiceError::Conflict(_) | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::NotFoundOrUnauthorized => StatusCode::NOT_FOUND,
        ServiceError::DataIntegrity(_) | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map a service failure to `{ "error": <message> }`.
///
/// Integrity and internal failures are logged here and leave the process with
/// a generic message only.
pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    let status = status_for(&err);
    if err.is_internal() {
        tracing::error!(error = %err, "request failed");
        return json_error(status, INTERNAL_MESSAGE);
    }
    json_error(status, err.to_string())
}

pub fn json_rejection(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, format!("invalid request body: {}", rejection.body_text()))
}

pub fn query_rejection(rejection: QueryRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, format!("invalid query: {}", rejection.body_text()))
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, axum::Json(json!({ "error": message.into() }))).into_response()
}
