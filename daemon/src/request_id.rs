//! Request-id propagation middleware (§6: "every endpoint accepts/returns
//! X-Request-ID"). A client-supplied id is honored as-is so a caller's own
//! trace id survives the hop; otherwise one is generated. Attached to the
//! request extensions so handlers can pull it out with `request_id(&req)`,
//! and echoed back on the response so a client that didn't send one still
//! gets something to correlate against in a bug report.

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::middleware::Next;
use actix_web::{Error, HttpMessage, HttpRequest};
use settle_common::ids::RequestId;
use std::str::FromStr;

pub const HEADER_NAME: &str = "X-Request-ID";

pub async fn propagate(
    mut req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let request_id = req
        .headers()
        .get(HEADER_NAME)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| RequestId::from_str(s).ok())
        .unwrap_or_else(RequestId::new);

    req.extensions_mut().insert(request_id);

    let mut res = next.call(req).await?;
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        res.headers_mut().insert(HeaderName::from_static("x-request-id"), value);
    }
    Ok(res)
}

/// Reads the id the middleware stashed on the request; every route is
/// mounted behind `propagate`, so this is always present.
pub fn request_id(req: &HttpRequest) -> RequestId {
    req.extensions()
        .get::<RequestId>()
        .copied()
        .unwrap_or_else(RequestId::new)
}
