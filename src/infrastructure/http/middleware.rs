//! HTTP Middleware
//!
//! 4xx/5xx 状态码日志，附带耗时。业务错误（errno != 0）在 ApiError 中记录

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match status {
        500..=599 => tracing::error!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed_ms,
            "HTTP server error"
        ),
        400..=499 => tracing::warn!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed_ms,
            "HTTP client error"
        ),
        _ => {}
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, Request as HttpRequest, StatusCode},
        routing::post,
        Router,
    };
    use tower::util::ServiceExt;

    async fn echo(body: String) -> String {
        body
    }

    fn router() -> Router {
        Router::new()
            .route("/echo", post(echo))
            .layer(axum::middleware::from_fn(error_logging_middleware))
    }

    async fn status_of(method: Method, uri: &str) -> StatusCode {
        let request = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .body(Body::from("hello"))
            .unwrap();
        router().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_passes_through_success() {
        assert_eq!(status_of(Method::POST, "/echo").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_passes_through_unknown_route() {
        assert_eq!(status_of(Method::POST, "/missing").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_passes_through_wrong_method() {
        assert_eq!(
            status_of(Method::GET, "/echo").await,
            StatusCode::METHOD_NOT_ALLOWED
        );
    }
}
