//! axum integration
//!
//! Handlers return [`Failure`] as their error type. The [`resolve_errors`]
//! middleware turns failures, and the router's own bare 404 and 405
//! responses, into error contract responses:
//!
//! ```ignore
//! let resolver = Arc::new(ErrorResolver::standard(catalog, options, classifier_options));
//! let app = Router::new()
//!     .route("/orders/{id}", get(get_order))
//!     .layer(axum::middleware::from_fn_with_state(resolver, resolve_errors));
//! ```

mod rejection;

use std::error::Error;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use backstop_classify::FrameworkError;
use backstop_core::RequestInfo;
use http::{StatusCode, header};

use crate::{ErrorResolver, ErrorResponse};

pub use rejection::{IntoFrameworkError, IntoFrameworkErrorWith};

/// Error type for handlers behind [`resolve_errors`]
///
/// Anything convertible to [`anyhow::Error`] converts into a `Failure`, so
/// `?` works on any error. The response it produces is a placeholder that
/// the middleware replaces.
#[derive(Debug)]
pub struct Failure(anyhow::Error);

impl Failure {
    /// The error the handler returned
    pub const fn error(&self) -> &anyhow::Error {
        &self.0
    }
}

impl<E> From<E> for Failure
where
    E: Into<anyhow::Error>,
{
    fn from(error: E) -> Self {
        Self(error.into())
    }
}

#[derive(Clone)]
struct StashedFailure(Arc<anyhow::Error>);

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(StashedFailure(Arc::new(self.0)));
        response
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, self.headers, Json(self.contract)).into_response()
    }
}

/// Middleware resolving handler failures and bare router errors
pub async fn resolve_errors(State(resolver): State<Arc<ErrorResolver>>, request: Request, next: Next) -> Response {
    let info = RequestInfo::from(&request);
    let mut response = next.run(request).await;

    if let Some(StashedFailure(failure)) = response.extensions_mut().remove::<StashedFailure>() {
        let failure: &anyhow::Error = &failure;
        let error: &(dyn Error + 'static) = failure.as_ref();
        return resolver.resolve(error, &info).into_response();
    }

    if let Some(error) = bare_router_failure(&response, &info) {
        return resolver.resolve(&error, &info).into_response();
    }

    response
}

/// Router fallbacks answer 404 and 405 with an empty, untyped body
fn bare_router_failure(response: &Response, info: &RequestInfo) -> Option<FrameworkError> {
    if response.headers().contains_key(header::CONTENT_TYPE) {
        return None;
    }

    match response.status() {
        StatusCode::NOT_FOUND => Some(FrameworkError::NotFound),
        StatusCode::METHOD_NOT_ALLOWED => {
            let allowed = response
                .headers()
                .get(header::ALLOW)
                .and_then(|value| value.to_str().ok())
                .map(|value| {
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|method| !method.is_empty())
                        .map(ToOwned::to_owned)
                        .collect()
                })
                .unwrap_or_default();
            Some(FrameworkError::MethodNotAllowed {
                method: info.method.to_string(),
                allowed,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::extract::Path;
    use axum::extract::rejection::{JsonRejection, PathRejection};
    use axum::routing::{get, post};
    use backstop_classify::{ApiException, ClassifierOptions};
    use backstop_core::{ApiError, ErrorCodeRange, ProjectErrorCatalog};
    use serde::Deserialize;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::ResolverOptions;

    #[derive(Deserialize)]
    struct NewOrder {
        #[allow(dead_code)]
        count: u32,
    }

    fn app() -> Router {
        let catalog = ProjectErrorCatalog::builder(ErrorCodeRange::AllowAll)
            .error(ApiError::new("ORDER_LOCKED", "99100", "Order is locked", 409))
            .status_code_priority_order([403, 401, 503, 500, 429, 409, 400, 405, 404, 415, 406])
            .build()
            .unwrap();
        let resolver = Arc::new(ErrorResolver::standard(
            Arc::new(catalog),
            ResolverOptions::default(),
            ClassifierOptions::default(),
        ));

        let locked = resolver.catalog().convert_to_api_error("ORDER_LOCKED").unwrap().clone();

        Router::new()
            .route(
                "/orders/{id}",
                get(|id: Result<Path<u32>, PathRejection>| async move {
                    let Path(id) = id.map_err(IntoFrameworkError::into_framework_error)?;
                    Ok::<_, Failure>(format!("order {id}"))
                }),
            )
            .route(
                "/orders",
                post(|body: Result<Json<NewOrder>, JsonRejection>| async move {
                    let Json(_order) = body.map_err(IntoFrameworkError::into_framework_error)?;
                    Ok::<_, Failure>(StatusCode::CREATED)
                }),
            )
            .route(
                "/locked",
                get(move || async move { Err::<(), _>(Failure::from(ApiException::from_error(locked))) }),
            )
            .route(
                "/boom",
                get(|| async { Err::<(), _>(Failure::from(anyhow::anyhow!("database connection reset"))) }),
            )
            .layer(axum::middleware::from_fn_with_state(resolver, resolve_errors))
    }

    async fn send(request: http::Request<Body>) -> (StatusCode, http::HeaderMap, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    fn get_request(uri: &str) -> http::Request<Body> {
        http::Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(body: &'static str) -> http::Request<Body> {
        http::Request::post("/orders")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn successful_responses_pass_through() {
        let (status, _, _) = send(post_json(r#"{"count": 2}"#)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn api_exception_becomes_its_contract() {
        let (status, headers, body) = send(get_request("/locked")).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["errors"], json!([{ "code": "99100", "message": "Order is locked" }]));
        assert_eq!(headers["error_uid"], body["error_id"].as_str().unwrap());
    }

    #[tokio::test]
    async fn unknown_failure_is_a_generic_service_error() {
        let (status, _, body) = send(get_request("/boom")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["errors"][0]["code"], json!("10"));
        assert!(!body.to_string().contains("database"));
    }

    #[tokio::test]
    async fn unmatched_route_is_not_found() {
        let (status, _, body) = send(get_request("/nowhere")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errors"][0]["code"], json!("90"));
    }

    #[tokio::test]
    async fn wrong_method_is_method_not_allowed() {
        let request = http::Request::delete("/orders").body(Body::empty()).unwrap();
        let (status, headers, body) = send(request).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["errors"][0]["code"], json!("100"));
        assert!(headers[header::ALLOW].to_str().unwrap().contains("POST"));
    }

    #[tokio::test]
    async fn path_parse_error_is_a_type_conversion_error() {
        let (status, _, body) = send(get_request("/orders/abc")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], json!("50"));
        assert_eq!(body["errors"][0]["metadata"]["required_type"], json!("int"));
        assert_eq!(body["errors"][0]["metadata"]["bad_property_value"], json!("abc"));
    }

    #[tokio::test]
    async fn empty_json_body_is_missing_content() {
        let (status, _, body) = send(post_json("")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], json!("40"));
    }

    #[tokio::test]
    async fn broken_json_body_is_malformed() {
        let (status, _, body) = send(post_json(r#"{"count": "#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], json!("60"));
    }

    #[tokio::test]
    async fn missing_content_type_is_unsupported_media_type() {
        let request = http::Request::post("/orders").body(Body::from(r#"{"count": 2}"#)).unwrap();
        let (status, _, body) = send(request).await;

        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["errors"][0]["code"], json!("120"));
    }
}
