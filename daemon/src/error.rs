//! HTTP-boundary error adapter (§7), grounded on the teacher's
//! `common/src/rpc/error.rs` `RpcResponseError`: a thin wrapper pairing the
//! component error with the request id, rendered to the standard envelope
//! rather than to a JSON-RPC error object.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use settle_common::envelope::ErrorEnvelope;
use settle_common::error::CoreError;
use settle_common::ids::RequestId;
use std::fmt;

#[derive(Debug)]
pub struct ApiError {
    request_id: RequestId,
    inner: CoreError,
}

impl ApiError {
    pub fn new(inner: CoreError, request_id: RequestId) -> Self {
        ApiError { request_id, inner }
    }

    pub fn inner(&self) -> &CoreError {
        &self.inner
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.request_id, self.inner)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.inner.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        if matches!(self.inner, CoreError::Internal | CoreError::DbError) {
            log::error!("{self:?}");
        } else {
            log::warn!("{self}");
        }
        let envelope = ErrorEnvelope::from_core_error(&self.inner, self.request_id);
        HttpResponse::build(self.status_code()).json(envelope)
    }
}

/// Extension trait used throughout the handler modules to attach the
/// per-request id to a `CoreResult` at the point it crosses into HTTP.
pub trait WithRequestId<T> {
    fn with_request_id(self, request_id: RequestId) -> Result<T, ApiError>;
}

impl<T> WithRequestId<T> for settle_common::error::CoreResult<T> {
    fn with_request_id(self, request_id: RequestId) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::new(e, request_id))
    }
}
