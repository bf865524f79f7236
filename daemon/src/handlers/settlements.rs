//! Settlements (§6): POST /settlements/execute; GET /settlements/{id}.
//! Execution is guarded by the Distributed Lock on the underlying payment
//! so two concurrent execute calls for the same payment can't both race
//! through the Settlement state machine (§4.5, S6's inventory-lock pattern
//! generalized from order fulfillment to settlement execution).

use crate::error::{ApiError, WithRequestId};
use crate::idempotency_guard::guard;
use crate::request_id::request_id;
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use settle_common::error::CoreError;
use settle_common::ids::{PaymentId, SettlementId};
use settle_common::time::get_current_time_in_seconds;
use settle_core::state_machine::settlement::{self, SettlementEvent};
use settle_core::storage::settlements::{create_settlement_tx, set_settlement_status_tx};
use settle_core::storage::{PaymentProvider, SettlementProvider};
use std::time::Duration;

const SETTLEMENT_LOCK_TTL: Duration = Duration::from_secs(30);

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/settlements/execute").route(web::post().to(execute)))
        .service(web::resource("/settlements/{id}").route(web::get().to(get_settlement)));
}

#[derive(Debug, Deserialize)]
struct ExecuteRequest {
    payment_id: PaymentId,
}

async fn execute(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let payload: ExecuteRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::new(CoreError::InvalidInput(e.to_string()), rid))?;

    guard(&state.pool, &req, &body, rid, true, || async {
        let state: &AppState = &state;
        let payment = state.storage.get_payment(payload.payment_id).await?;

        let lock_resource = format!("settlement:{}", payment.id);
        let handle = state.lock.acquire(&lock_resource, SETTLEMENT_LOCK_TTL).await?;

        let result = state
            .uow
            .run(|_pool, mut tx| async move {
                let settlement = create_settlement_tx(&mut tx, payment.id, payment.amount).await?;
                let now = get_current_time_in_seconds();

                let processing = settlement::transition(settlement.status, SettlementEvent::Start)?;
                set_settlement_status_tx(&mut tx, settlement.id, processing, now).await?;

                let completed = settlement::transition(processing, SettlementEvent::Complete)?;
                let updated = set_settlement_status_tx(&mut tx, settlement.id, completed, now).await?;

                let reference_id = state.internal_id_tx(&mut tx, "settlements", settlement.id.0).await?;
                let payload = serde_json::json!({
                    "settlement_id": updated.id,
                    "payment_id": updated.payment_id,
                    "status": updated.status.to_string(),
                });
                settle_core::outbox::enqueue(&mut tx, "settlement.completed", "settlement", reference_id, payload)
                    .await?;

                Ok((tx, updated))
            })
            .await;

        if let Err(e) = state.lock.release(&handle).await {
            log::warn!("failed to release settlement lock for {lock_resource}: {e}");
        }

        result
    })
    .await
}

async fn get_settlement(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<SettlementId>,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let settlement = state
        .storage
        .get_settlement(path.into_inner())
        .await
        .with_request_id(rid)?;
    Ok(HttpResponse::Ok().json(settle_common::envelope::DataEnvelope::new(settlement)))
}
