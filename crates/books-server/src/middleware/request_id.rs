//! Request IDs: generated when absent, echoed on the response, and attached
//! to every log line emitted while the request is handled.

use axum::{extract::Request, middleware::Next, response::Response};
use http::{HeaderName, HeaderValue};
use tower_http::request_id::{MakeRequestId, RequestId, SetRequestIdLayer};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Generates a v4 UUID for requests that arrive without an id.
#[derive(Clone, Copy, Debug, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

pub type RequestIdLayer = SetRequestIdLayer<MakeRequestUuid>;

/// Layer that fills in `x-request-id`. Requests that already carry one
/// keep it.
pub fn request_id_layer() -> RequestIdLayer {
    SetRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER), MakeRequestUuid)
}

/// Runs the handler inside a `request` span tagged with the id, then copies
/// the id onto the response.
///
/// Must sit inside [`request_id_layer`] so the id is already set.
pub async fn propagate_request_id(request: Request, next: Next) -> Response {
    let request_id = request.headers().get(REQUEST_ID_HEADER).cloned();

    let span = tracing::info_span!(
        "request",
        request_id = request_id
            .as_ref()
            .and_then(|id| id.to_str().ok())
            .unwrap_or("-"),
        method = %request.method(),
        path = %request.uri().path(),
    );

    let mut response = next.run(request).instrument(span).await;

    if let Some(id) = request_id {
        response.headers_mut().insert(REQUEST_ID_HEADER, id);
    }

    response
}
