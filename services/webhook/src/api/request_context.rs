//! Request-scoped context extracted from HTTP requests.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use bmset_id::RequestId;
use tower_http::request_id::{self, MakeRequestId};

use crate::api::error::ApiError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request id as seen on the wire.
    pub request_id: String,
}

impl RequestContext {
    /// Typed request id for events.
    ///
    /// Foreign ids that are not ours stay in the response header only; events
    /// get a fresh id.
    pub fn typed_request_id(&self) -> RequestId {
        RequestId::parse_or_new(&self.request_id)
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = header_string(&parts.headers, REQUEST_ID_HEADER)
            .unwrap_or_else(|| RequestId::new().to_string());
        Ok(Self { request_id })
    }
}

/// Generates `req_<ulid>` ids for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUlid;

impl MakeRequestId for MakeRequestUlid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<request_id::RequestId> {
        HeaderValue::from_str(&RequestId::new().to_string())
            .ok()
            .map(request_id::RequestId::new)
    }
}

pub fn request_id_header() -> HeaderName {
    HeaderName::from_static(REQUEST_ID_HEADER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_parse_back() {
        let request = Request::builder().body(()).unwrap();
        let id = MakeRequestUlid.make_request_id(&request).unwrap();
        let value = id.header_value().to_str().unwrap();
        assert!(RequestId::parse(value).is_ok());
    }

    #[test]
    fn test_foreign_id_gets_fresh_typed_id() {
        let ctx = RequestContext {
            request_id: "trace-abc".to_string(),
        };
        assert!(ctx.typed_request_id().to_string().starts_with("req_"));
    }
}
