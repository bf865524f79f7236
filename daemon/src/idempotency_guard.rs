//! Wires the Idempotency Cache into a handler (§4.8, §6): looks up
//! `X-Idempotency-Key` before running the handler body and stores the
//! rendered envelope after, so a retried request with the same key and
//! body replays the exact prior response instead of re-executing.

use crate::error::ApiError;
use actix_web::HttpRequest;
use serde::Serialize;
use settle_common::envelope::DataEnvelope;
use settle_common::error::CoreResult;
use settle_common::ids::RequestId;
use settle_core::idempotency::{hash_request_body, IdempotencyCache, Lookup};
use sqlx::PgPool;
use std::future::Future;

pub const IDEMPOTENCY_HEADER: &str = "X-Idempotency-Key";

/// Runs `handler` under idempotency-key protection when the header is
/// present; otherwise runs it unconditionally. `is_payment_class` selects
/// the 7-day TTL (§4.8).
pub async fn guard<F, Fut, T>(
    pool: &PgPool,
    req: &HttpRequest,
    body: &[u8],
    request_id: RequestId,
    is_payment_class: bool,
    handler: F,
) -> Result<actix_web::HttpResponse, ApiError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = CoreResult<T>>,
    T: Serialize,
{
    let Some(key) = req
        .headers()
        .get(IDEMPOTENCY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
    else {
        let data = handler().await.map_err(|e| ApiError::new(e, request_id))?;
        return Ok(actix_web::HttpResponse::Ok().json(DataEnvelope::new(data)));
    };

    let path = req.path().to_string();
    let hash = hash_request_body(body);
    let cache = IdempotencyCache::new(pool);

    match cache
        .lookup(&key, &path, &hash)
        .await
        .map_err(|e| ApiError::new(e, request_id))?
    {
        Lookup::Replay { status, body } => {
            let code = actix_web::http::StatusCode::from_u16(status)
                .unwrap_or(actix_web::http::StatusCode::OK);
            Ok(actix_web::HttpResponse::build(code).json(body))
        }
        Lookup::Miss => {
            let data = handler().await.map_err(|e| ApiError::new(e, request_id))?;
            let envelope = DataEnvelope::new(data);
            let rendered = serde_json::to_value(&envelope).unwrap_or(serde_json::Value::Null);
            cache
                .store(&key, &path, &hash, 200, &rendered, is_payment_class)
                .await
                .map_err(|e| ApiError::new(e, request_id))?;
            Ok(actix_web::HttpResponse::Ok().json(envelope))
        }
    }
}
