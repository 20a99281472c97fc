// ❌ API Errors - KError as a JSON:API error document
//
// The response keeps the `KError` in its extensions so the dispatch
// middleware can report it without parsing the body.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use super::JSONAPI_MEDIA_TYPE;
use crate::error::{ErrorCode, KError};
use crate::query::QueryError;

#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct ApiError {
    pub status: StatusCode,
    pub error: KError,
}

impl ApiError {
    pub fn not_found(resource: &str, id: &str) -> Self {
        KError::not_found(resource, id).into()
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        KError::new(ErrorCode::UnexpectedRequest, message).into()
    }
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::UnexpectedRequest | ErrorCode::InvalidQuery => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<KError> for ApiError {
    fn from(error: KError) -> Self {
        ApiError {
            status: status_for(error.code),
            error,
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(error: QueryError) -> Self {
        KError::from(error).into()
    }
}

// ============================================================================
// Error document
// ============================================================================

#[derive(Debug, Serialize)]
struct ErrorObject<'a> {
    status: String,
    code: &'a str,
    title: &'a str,
    detail: &'a str,
}

#[derive(Debug, Serialize)]
struct ErrorDocument<'a> {
    errors: Vec<ErrorObject<'a>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorDocument {
            errors: vec![ErrorObject {
                status: self.status.as_u16().to_string(),
                code: self.error.code.as_str(),
                title: self.status.canonical_reason().unwrap_or("Error"),
                detail: &self.error.message,
            }],
        };
        let body = serde_json::to_vec(&body).unwrap_or_default();

        let mut response = (
            self.status,
            [(header::CONTENT_TYPE, JSONAPI_MEDIA_TYPE)],
            body,
        )
            .into_response();
        response.extensions_mut().insert(self.error);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::not_found("account", "x").status, StatusCode::NOT_FOUND);
        assert_eq!(ApiError::unexpected("no filter").status, StatusCode::BAD_REQUEST);
        let query: ApiError = QueryError::UnknownSort("color".to_string()).into();
        assert_eq!(query.status, StatusCode::BAD_REQUEST);
        assert_eq!(query.error.code, ErrorCode::InvalidQuery);
        let internal: ApiError = KError::new(ErrorCode::Internal, "boom").into();
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_response_carries_kerror() {
        let response = ApiError::not_found("transfer", "t-1").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let error = response.extensions().get::<KError>().unwrap();
        assert_eq!(error.code, ErrorCode::NotFound);
    }
}
