//! Payments (§6): /payments/authorize|capture|void|refund. Authorize both
//! creates the payment row and holds the payer's funds in one call since
//! the surface has no separate "create payment" endpoint; the other three
//! act on an existing payment id. All four are payment-class for
//! idempotency purposes (§4.8's 7-day TTL).

use crate::error::ApiError;
use crate::idempotency_guard::guard;
use crate::request_id::request_id;
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use settle_common::error::CoreError;
use settle_common::ids::{AccountId, OrderId, PaymentId, TransactionGroupId};
use settle_common::money::Money;
use settle_common::time::get_current_time_in_seconds;
use settle_core::ledger_poster::{BalanceEffect, BalancedBatch, LedgerEntryInput, LedgerPoster};
use settle_core::state_machine::payment::{self, PaymentEvent};
use settle_core::storage::payments::{create_payment_tx, get_payment_tx, set_payment_status_tx};
use settle_core::storage::NewPayment;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/payments/authorize").route(web::post().to(authorize)))
        .service(web::resource("/payments/capture").route(web::post().to(capture)))
        .service(web::resource("/payments/void").route(web::post().to(void)))
        .service(web::resource("/payments/refund").route(web::post().to(refund)));
}

#[derive(Debug, Deserialize)]
struct AuthorizeRequest {
    order_id: OrderId,
    payer_account_id: AccountId,
    payee_account_id: AccountId,
    fee_account_id: AccountId,
    amount: Money,
    fee_amount: Money,
    expires_in_secs: u64,
}

/// S3: "Authorize 100 -> payer(available=0, held=100)", posted as a single
/// `Hold` entry on the payer account (an intra-account move, so it needs no
/// offsetting entry to balance).
async fn authorize(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let payload: AuthorizeRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::new(CoreError::InvalidInput(e.to_string()), rid))?;

    guard(&state.pool, &req, &body, rid, true, || async {
        let state: &AppState = &state;
        state
            .uow
            .run(|_pool, mut tx| async move {
                let now = get_current_time_in_seconds();
                let payment = create_payment_tx(
                    &mut tx,
                    NewPayment {
                        order_id: payload.order_id,
                        payer_account_id: payload.payer_account_id,
                        payee_account_id: payload.payee_account_id,
                        fee_account_id: payload.fee_account_id,
                        amount: payload.amount,
                        fee_amount: payload.fee_amount,
                        expires_at: now + payload.expires_in_secs,
                    },
                )
                .await?;

                let next = payment::transition(payment.status, PaymentEvent::Authorize)?;

                let reference_id = state.internal_id_tx(&mut tx, "payments", payment.id.0).await?;
                let batch = BalancedBatch::new(vec![LedgerEntryInput {
                    account: payment.payer_account_id,
                    effect: BalanceEffect::Hold,
                    amount: payment.amount,
                    reference_type: "payment-authorize".to_string(),
                    reference_id,
                    description: format!("authorize payment {}", payment.id),
                }])?;
                LedgerPoster::new(&mut tx).post(TransactionGroupId::new(), batch).await?;

                let updated = set_payment_status_tx(&mut tx, payment.id, next, now).await?;
                enqueue_event(&mut tx, "payment.authorized", reference_id, &updated).await?;
                Ok((tx, updated))
            })
            .await
    })
    .await
}

#[derive(Debug, Deserialize)]
struct PaymentIdRequest {
    payment_id: PaymentId,
}

/// S3: capture with a fee split posts `{payer Capture 100} = {payee Credit
/// 97, fee Credit 3}`; `payment::capture` enforces the §4.6 expiry guard
/// before the transition is allowed at all.
async fn capture(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let payload: PaymentIdRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::new(CoreError::InvalidInput(e.to_string()), rid))?;

    guard(&state.pool, &req, &body, rid, true, || async {
        let state: &AppState = &state;
        state
            .uow
            .run(|_pool, mut tx| async move {
                let existing = get_payment_tx(&mut tx, payload.payment_id).await?;
                let now = get_current_time_in_seconds();
                let next = payment::capture(existing.status, existing.expires_at, now)?;

                let reference_id = state.internal_id_tx(&mut tx, "payments", existing.id.0).await?;
                let payee_amount = existing
                    .amount
                    .checked_sub(existing.fee_amount)
                    .ok_or_else(|| CoreError::InvalidInput("fee_amount exceeds amount".to_string()))?;

                let mut entries = vec![
                    LedgerEntryInput {
                        account: existing.payer_account_id,
                        effect: BalanceEffect::Capture,
                        amount: existing.amount,
                        reference_type: "payment-capture".to_string(),
                        reference_id,
                        description: format!("capture payment {}", existing.id),
                    },
                    LedgerEntryInput {
                        account: existing.payee_account_id,
                        effect: BalanceEffect::Credit,
                        amount: payee_amount,
                        reference_type: "payment-capture".to_string(),
                        reference_id,
                        description: format!("capture payment {} (payee share)", existing.id),
                    },
                ];
                if existing.fee_amount.is_positive() {
                    entries.push(LedgerEntryInput {
                        account: existing.fee_account_id,
                        effect: BalanceEffect::Credit,
                        amount: existing.fee_amount,
                        reference_type: "payment-capture".to_string(),
                        reference_id,
                        description: format!("capture payment {} (fee share)", existing.id),
                    });
                }

                LedgerPoster::new(&mut tx)
                    .post(TransactionGroupId::new(), BalancedBatch::new(entries)?)
                    .await?;

                let updated = set_payment_status_tx(&mut tx, existing.id, next, now).await?;
                enqueue_event(&mut tx, "payment.captured", reference_id, &updated).await?;
                Ok((tx, updated))
            })
            .await
    })
    .await
}

/// S4: void reverses the hold with a single `Release` entry on the payer.
async fn void(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let payload: PaymentIdRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::new(CoreError::InvalidInput(e.to_string()), rid))?;

    guard(&state.pool, &req, &body, rid, true, || async {
        let state: &AppState = &state;
        state
            .uow
            .run(|_pool, mut tx| async move {
                let existing = get_payment_tx(&mut tx, payload.payment_id).await?;
                let next = payment::transition(existing.status, PaymentEvent::Void)?;

                let reference_id = state.internal_id_tx(&mut tx, "payments", existing.id.0).await?;
                let batch = BalancedBatch::new(vec![LedgerEntryInput {
                    account: existing.payer_account_id,
                    effect: BalanceEffect::Release,
                    amount: existing.amount,
                    reference_type: "payment-void".to_string(),
                    reference_id,
                    description: format!("void payment {}", existing.id),
                }])?;
                LedgerPoster::new(&mut tx).post(TransactionGroupId::new(), batch).await?;

                let now = get_current_time_in_seconds();
                let updated = set_payment_status_tx(&mut tx, existing.id, next, now).await?;
                enqueue_event(&mut tx, "payment.voided", reference_id, &updated).await?;
                Ok((tx, updated))
            })
            .await
    })
    .await
}

/// Refund reverses a capture: payee/fee give back what they received, payer
/// gets the full amount back, expressed as literal `Debit`/`Credit` entries
/// since the money is re-entering circulation from accounts that already
/// hold it in `available_balance`.
async fn refund(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let payload: PaymentIdRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::new(CoreError::InvalidInput(e.to_string()), rid))?;

    guard(&state.pool, &req, &body, rid, true, || async {
        let state: &AppState = &state;
        state
            .uow
            .run(|_pool, mut tx| async move {
                let existing = get_payment_tx(&mut tx, payload.payment_id).await?;
                let next = payment::transition(existing.status, PaymentEvent::Refund)?;

                let reference_id = state.internal_id_tx(&mut tx, "payments", existing.id.0).await?;
                let payee_amount = existing
                    .amount
                    .checked_sub(existing.fee_amount)
                    .ok_or_else(|| CoreError::InvalidInput("fee_amount exceeds amount".to_string()))?;

                let mut entries = vec![
                    LedgerEntryInput {
                        account: existing.payee_account_id,
                        effect: BalanceEffect::Debit,
                        amount: payee_amount,
                        reference_type: "payment-refund".to_string(),
                        reference_id,
                        description: format!("refund payment {} (payee share)", existing.id),
                    },
                    LedgerEntryInput {
                        account: existing.payer_account_id,
                        effect: BalanceEffect::Credit,
                        amount: existing.amount,
                        reference_type: "payment-refund".to_string(),
                        reference_id,
                        description: format!("refund payment {}", existing.id),
                    },
                ];
                if existing.fee_amount.is_positive() {
                    entries.push(LedgerEntryInput {
                        account: existing.fee_account_id,
                        effect: BalanceEffect::Debit,
                        amount: existing.fee_amount,
                        reference_type: "payment-refund".to_string(),
                        reference_id,
                        description: format!("refund payment {} (fee share)", existing.id),
                    });
                }

                LedgerPoster::new(&mut tx)
                    .post(TransactionGroupId::new(), BalancedBatch::new(entries)?)
                    .await?;

                let now = get_current_time_in_seconds();
                let updated = set_payment_status_tx(&mut tx, existing.id, next, now).await?;
                enqueue_event(&mut tx, "payment.refunded", reference_id, &updated).await?;
                Ok((tx, updated))
            })
            .await
    })
    .await
}

async fn enqueue_event(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    event_type: &str,
    aggregate_id: settle_common::ids::InternalId,
    payment: &settle_common::domain::payment::Payment,
) -> settle_common::error::CoreResult<()> {
    let payload = serde_json::json!({
        "payment_id": payment.id,
        "status": payment.status.to_string(),
    });
    settle_core::outbox::enqueue(tx, event_type, "payment", aggregate_id, payload).await?;
    Ok(())
}
