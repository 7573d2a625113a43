use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied id that is passed through unchanged
const MAX_ID_LEN: usize = 128;

/// Correlates the scan log lines of one HTTP call; handlers read it with
/// `Extension<RequestId>`.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// The id a caller (or a proxy in front of us) asked for, if it is usable.
fn caller_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_ID_LEN)
        .map(str::to_string)
}

/// Tags every request with a `RequestId` and echoes it back in the
/// `x-request-id` response header. A fresh UUID v4 is used when the caller
/// sent none or an unusable one.
pub async fn request_id_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Response {
    let id = caller_id(&headers).unwrap_or_else(|| Uuid::new_v4().to_string());
    request.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
