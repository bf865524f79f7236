//! Withdrawals (§4.6): request debits available/credits held in the same
//! call that creates the row (Pending has no predecessor transition, so the
//! hold is posted at creation time, mirroring payments.rs's `authorize`);
//! approve/submit/confirm are pure state transitions; complete captures the
//! hold for good, reject/fail release it back to available.

use crate::error::ApiError;
use crate::idempotency_guard::guard;
use crate::request_id::request_id;
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use settle_common::error::CoreError;
use settle_common::ids::{AccountId, TransactionGroupId, WithdrawalId};
use settle_common::money::Money;
use settle_common::time::get_current_time_in_seconds;
use settle_core::ledger_poster::{BalanceEffect, BalancedBatch, LedgerEntryInput, LedgerPoster};
use settle_core::state_machine::withdrawal::{self, WithdrawalEvent};
use settle_core::storage::withdrawals::{
    chain_settlement_account, get_withdrawal_tx, request_withdrawal_tx, set_withdrawal_status_tx,
};
use settle_core::storage::WithdrawalProvider;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/withdrawals/request").route(web::post().to(request)))
        .service(web::resource("/withdrawals/approve").route(web::post().to(approve)))
        .service(web::resource("/withdrawals/submit").route(web::post().to(submit)))
        .service(web::resource("/withdrawals/confirm").route(web::post().to(confirm)))
        .service(web::resource("/withdrawals/complete").route(web::post().to(complete)))
        .service(web::resource("/withdrawals/reject").route(web::post().to(reject)))
        .service(web::resource("/withdrawals/fail").route(web::post().to(fail)))
        .service(web::resource("/withdrawals/{id}").route(web::get().to(get_withdrawal)));
}

#[derive(Debug, Deserialize)]
struct RequestWithdrawalRequest {
    account_id: AccountId,
    amount: Money,
    destination_address: String,
}

/// On Pending the available balance is debited and the held balance
/// credited (§4.6) — posted as a single `Hold` entry, the same intra-account
/// shape payments.rs's `authorize` uses.
async fn request(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let payload: RequestWithdrawalRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::new(CoreError::InvalidInput(e.to_string()), rid))?;

    guard(&state.pool, &req, &body, rid, true, || async {
        let state: &AppState = &state;
        state
            .uow
            .run(|_pool, mut tx| async move {
                let withdrawal = request_withdrawal_tx(
                    &mut tx,
                    payload.account_id,
                    payload.amount,
                    &payload.destination_address,
                )
                .await?;

                let reference_id = state.internal_id_tx(&mut tx, "withdrawals", withdrawal.id.0).await?;
                let batch = BalancedBatch::new(vec![LedgerEntryInput {
                    account: withdrawal.account_id,
                    effect: BalanceEffect::Hold,
                    amount: withdrawal.amount,
                    reference_type: "withdrawal-request".to_string(),
                    reference_id,
                    description: format!("request withdrawal {}", withdrawal.id),
                }])?;
                LedgerPoster::new(&mut tx).post(TransactionGroupId::new(), batch).await?;

                enqueue_event(&mut tx, "withdrawal.requested", reference_id, &withdrawal).await?;
                Ok((tx, withdrawal))
            })
            .await
    })
    .await
}

#[derive(Debug, Deserialize)]
struct WithdrawalIdRequest {
    withdrawal_id: WithdrawalId,
}

/// Pure transition, no ledger effect: the hold was already posted at
/// request time.
async fn approve(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    transition_only(state, req, body, WithdrawalEvent::Approve, "withdrawal.approved").await
}

/// Pure transition, no ledger effect.
async fn submit(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    transition_only(state, req, body, WithdrawalEvent::Submit, "withdrawal.submitted").await
}

#[derive(Debug, Deserialize)]
struct ConfirmRequest {
    withdrawal_id: WithdrawalId,
    chain_tx_hash: Option<String>,
}

/// Pure transition, no ledger effect; records the on-chain tx hash once the
/// transfer has been submitted.
async fn confirm(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let payload: ConfirmRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::new(CoreError::InvalidInput(e.to_string()), rid))?;

    guard(&state.pool, &req, &body, rid, true, || async {
        let state: &AppState = &state;
        state
            .uow
            .run(|_pool, mut tx| async move {
                let existing = get_withdrawal_tx(&mut tx, payload.withdrawal_id).await?;
                let next = withdrawal::transition(existing.status, WithdrawalEvent::Confirm)?;
                let now = get_current_time_in_seconds();
                let updated = set_withdrawal_status_tx(
                    &mut tx,
                    existing.id,
                    next,
                    payload.chain_tx_hash.as_deref(),
                    now,
                )
                .await?;

                let reference_id = state.internal_id_tx(&mut tx, "withdrawals", existing.id.0).await?;
                enqueue_event(&mut tx, "withdrawal.confirmed", reference_id, &updated).await?;
                Ok((tx, updated))
            })
            .await
    })
    .await
}

/// Completed decrements the held balance for good (§4.6): a `Capture` on
/// the withdrawing account balanced by a `Credit` to the chain settlement
/// clearing account, the same shape a payment's fee account gives its own
/// `Capture` entry.
async fn complete(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let payload: WithdrawalIdRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::new(CoreError::InvalidInput(e.to_string()), rid))?;

    guard(&state.pool, &req, &body, rid, true, || async {
        let state: &AppState = &state;
        state
            .uow
            .run(|_pool, mut tx| async move {
                let existing = get_withdrawal_tx(&mut tx, payload.withdrawal_id).await?;
                let next = withdrawal::transition(existing.status, WithdrawalEvent::Complete)?;

                let reference_id = state.internal_id_tx(&mut tx, "withdrawals", existing.id.0).await?;
                let batch = BalancedBatch::new(vec![
                    LedgerEntryInput {
                        account: existing.account_id,
                        effect: BalanceEffect::Capture,
                        amount: existing.amount,
                        reference_type: "withdrawal-complete".to_string(),
                        reference_id,
                        description: format!("complete withdrawal {}", existing.id),
                    },
                    LedgerEntryInput {
                        account: chain_settlement_account(),
                        effect: BalanceEffect::Credit,
                        amount: existing.amount,
                        reference_type: "withdrawal-complete".to_string(),
                        reference_id,
                        description: format!("chain settlement for withdrawal {}", existing.id),
                    },
                ])?;
                LedgerPoster::new(&mut tx).post(TransactionGroupId::new(), batch).await?;

                let now = get_current_time_in_seconds();
                let updated = set_withdrawal_status_tx(&mut tx, existing.id, next, None, now).await?;
                enqueue_event(&mut tx, "withdrawal.completed", reference_id, &updated).await?;
                Ok((tx, updated))
            })
            .await
    })
    .await
}

/// Rejected/Failed reverse the hold (§4.6), posted as a single `Release`
/// entry on the account.
async fn reject(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    release_hold(state, req, body, WithdrawalEvent::Reject, "withdrawal-reject", "withdrawal.rejected").await
}

/// Rejected/Failed reverse the hold (§4.6), posted as a single `Release`
/// entry on the account.
async fn fail(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    release_hold(state, req, body, WithdrawalEvent::Fail, "withdrawal-fail", "withdrawal.failed").await
}

async fn release_hold(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
    event: WithdrawalEvent,
    reference_type: &'static str,
    event_type: &'static str,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let payload: WithdrawalIdRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::new(CoreError::InvalidInput(e.to_string()), rid))?;

    guard(&state.pool, &req, &body, rid, true, || async {
        let state: &AppState = &state;
        state
            .uow
            .run(|_pool, mut tx| async move {
                let existing = get_withdrawal_tx(&mut tx, payload.withdrawal_id).await?;
                let next = withdrawal::transition(existing.status, event)?;

                let reference_id = state.internal_id_tx(&mut tx, "withdrawals", existing.id.0).await?;
                let batch = BalancedBatch::new(vec![LedgerEntryInput {
                    account: existing.account_id,
                    effect: BalanceEffect::Release,
                    amount: existing.amount,
                    reference_type: reference_type.to_string(),
                    reference_id,
                    description: format!("release withdrawal {}", existing.id),
                }])?;
                LedgerPoster::new(&mut tx).post(TransactionGroupId::new(), batch).await?;

                let now = get_current_time_in_seconds();
                let updated = set_withdrawal_status_tx(&mut tx, existing.id, next, None, now).await?;
                enqueue_event(&mut tx, event_type, reference_id, &updated).await?;
                Ok((tx, updated))
            })
            .await
    })
    .await
}

async fn transition_only(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
    event: WithdrawalEvent,
    event_type: &'static str,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let payload: WithdrawalIdRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::new(CoreError::InvalidInput(e.to_string()), rid))?;

    guard(&state.pool, &req, &body, rid, true, || async {
        let state: &AppState = &state;
        state
            .uow
            .run(|_pool, mut tx| async move {
                let existing = get_withdrawal_tx(&mut tx, payload.withdrawal_id).await?;
                let next = withdrawal::transition(existing.status, event)?;
                let now = get_current_time_in_seconds();
                let updated = set_withdrawal_status_tx(&mut tx, existing.id, next, None, now).await?;

                let reference_id = state.internal_id_tx(&mut tx, "withdrawals", existing.id.0).await?;
                enqueue_event(&mut tx, event_type, reference_id, &updated).await?;
                Ok((tx, updated))
            })
            .await
    })
    .await
}

async fn get_withdrawal(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<WithdrawalId>,
) -> Result<HttpResponse, ApiError> {
    use crate::error::WithRequestId;
    let rid = request_id(&req);
    let withdrawal = state.storage.get_withdrawal(path.into_inner()).await.with_request_id(rid)?;
    Ok(HttpResponse::Ok().json(settle_common::envelope::DataEnvelope::new(withdrawal)))
}

async fn enqueue_event(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    event_type: &str,
    aggregate_id: settle_common::ids::InternalId,
    withdrawal: &settle_common::domain::withdrawal::Withdrawal,
) -> settle_common::error::CoreResult<()> {
    let payload = serde_json::json!({
        "withdrawal_id": withdrawal.id,
        "status": withdrawal.status.to_string(),
    });
    settle_core::outbox::enqueue(tx, event_type, "withdrawal", aggregate_id, payload).await?;
    Ok(())
}
