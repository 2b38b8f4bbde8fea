//! HTTP error mapping for the generation endpoint.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use scribe_core::Error;

/// Wrapper turning a gateway [`Error`] into an HTTP response.
///
/// Quota exhaustion carries a structured body (limit, remaining, reset time)
/// so clients can render a meaningful message without parsing prose.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            Error::QuotaExceeded {
                limit,
                remaining,
                reset_at,
            } => {
                let body = json!({
                    "error": format!("Daily generation limit of {limit} reached"),
                    "code": "quota_exceeded",
                    "limit": limit,
                    "remaining": remaining,
                    "resetAt": reset_at.to_rfc3339(),
                });
                (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
            }
            e => {
                let status = match &e {
                    Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                    Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
                    Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
                    Error::StorageNotFound(_) => StatusCode::NOT_FOUND,
                    Error::StoragePermissionDenied(_) => StatusCode::FORBIDDEN,
                    Error::StorageTimeout(_) | Error::UpstreamTimeout(_) => {
                        StatusCode::GATEWAY_TIMEOUT
                    }
                    Error::Upstream(_)
                    | Error::UpstreamRateLimited(_)
                    | Error::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let body = json!({ "error": e.to_string() });
                (status, Json(body)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;

    fn status_of(e: Error) -> StatusCode {
        ApiError(e).into_response().status()
    }

    #[test]
    fn test_quota_exceeded_maps_to_429() {
        let e = Error::QuotaExceeded {
            limit: 50,
            remaining: 0,
            reset_at: Utc.with_ymd_and_hms(2026, 8, 3, 0, 0, 0).unwrap(),
        };
        assert_eq!(status_of(e), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_auth_and_input_mappings() {
        assert_eq!(
            status_of(Error::Unauthorized("bad token".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(Error::InvalidInput("messages empty".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(Error::PayloadTooLarge("too big".into())),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_storage_mappings() {
        assert_eq!(
            status_of(Error::StorageNotFound("a/b".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(Error::StoragePermissionDenied("a/b".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(Error::StorageTimeout("a/b".into())),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_upstream_mappings() {
        assert_eq!(
            status_of(Error::UpstreamTimeout("3 attempts".into())),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_of(Error::Upstream("bad request".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(Error::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
