//! Admin key guard for catalog mutations.
//!
//! Implements constant-time comparison to mitigate timing attacks.

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use subtle::ConstantTimeEq;

use crate::errors::{AppError, AppErrorWithRevision};

/// Header name for the admin key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Admin guard layer function that takes the expected key as a parameter.
pub async fn admin_key_layer(
    expected_key: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    // If no key is configured, allow all requests (dev mode)
    let Some(expected) = expected_key else {
        return next.run(request).await;
    };

    match provided_key(&request) {
        Some(provided) if constant_time_compare(&provided, &expected) => next.run(request).await,
        Some(_) => {
            tracing::warn!(path = %request.uri().path(), "Rejected invalid admin key");
            unauthorized_response("Invalid API key")
        }
        None => unauthorized_response("Missing or invalid API key"),
    }
}

/// Key from `x-api-key`, falling back to an `Authorization: Bearer` token.
fn provided_key(request: &Request) -> Option<String> {
    let headers = request.headers();
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
        .map(|s| s.to_string())
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn unauthorized_response(message: &str) -> Response {
    AppErrorWithRevision {
        error: AppError::Unauthorized(message.to_string()),
        revision_id: 0,
    }
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::post, Router};
    use tower::ServiceExt;

    fn guarded(key: Option<&str>) -> Router {
        let key = key.map(str::to_string);
        Router::new()
            .route("/guarded", post(|| async { "ok" }))
            .layer(middleware::from_fn(move |req, next| {
                admin_key_layer(key.clone(), req, next)
            }))
    }

    async fn status_for(router: Router, header: Option<(&str, &str)>) -> StatusCode {
        let mut builder = axum::http::Request::builder()
            .method("POST")
            .uri("/guarded");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        router
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("test-key-123", "test-key-123"));
        assert!(!constant_time_compare("test-key-123", "test-key-124"));
        assert!(!constant_time_compare("short", "much-longer-key"));
        assert!(constant_time_compare("", ""));
    }

    #[tokio::test]
    async fn test_open_when_unconfigured() {
        assert_eq!(status_for(guarded(None), None).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_header_variants() {
        let key = Some("admin-key");
        assert_eq!(
            status_for(guarded(key), None).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(guarded(key), Some((API_KEY_HEADER, "nope"))).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(guarded(key), Some((API_KEY_HEADER, "admin-key"))).await,
            StatusCode::OK
        );
        assert_eq!(
            status_for(guarded(key), Some(("authorization", "Bearer admin-key"))).await,
            StatusCode::OK
        );
    }
}
