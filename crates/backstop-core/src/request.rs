use http::{HeaderMap, Method, Uri};

/// The parts of a failing request worth logging next to the error
///
/// Resolution never inspects the request beyond this; it is diagnostic
/// context only.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    /// HTTP method
    pub method: Method,
    /// Request URI (path and query)
    pub uri: Uri,
    /// Request headers, redacted before they are logged
    pub headers: HeaderMap,
}

impl RequestInfo {
    /// Capture logging context from request parts
    pub fn from_parts(parts: &http::request::Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
        }
    }

    /// Placeholder for errors raised outside any HTTP request
    pub fn empty() -> Self {
        Self {
            method: Method::GET,
            uri: Uri::from_static("/"),
            headers: HeaderMap::new(),
        }
    }

    /// Request path
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Raw query string, if any
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }
}

impl<B> From<&http::Request<B>> for RequestInfo {
    fn from(request: &http::Request<B>) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
        }
    }
}
