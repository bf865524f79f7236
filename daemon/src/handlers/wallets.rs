//! Wallets nested under a user (§6): POST/GET /users/{extId}/wallets;
//! GET/DELETE /.../wallets/{walletExtId}; PUT .../label; POST .../verify;
//! POST .../set-primary.

use crate::error::{ApiError, WithRequestId};
use crate::idempotency_guard::guard;
use crate::request_id::request_id;
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use settle_common::crypto::Address;
use settle_common::error::CoreError;
use settle_common::ids::{UserId, WalletId};
use settle_common::time::get_current_time_in_seconds;
use settle_core::signature_verifier::WalletVerificationRequest;
use settle_core::state_machine::wallet_verification::{self, WalletVerificationEvent, WalletVerificationState};
use settle_core::storage::wallets::{get_wallet_tx, list_wallets_by_user_tx, mark_verified_tx, set_primary_tx};
use settle_core::storage::WalletProvider;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/users/{ext_id}/wallets")
            .route(web::post().to(add_wallet))
            .route(web::get().to(list_wallets)),
    )
    .service(
        web::resource("/users/{ext_id}/wallets/{wallet_ext_id}")
            .route(web::get().to(get_wallet))
            .route(web::delete().to(delete_wallet)),
    )
    .service(web::resource("/users/{ext_id}/wallets/{wallet_ext_id}/label").route(web::put().to(set_label)))
    .service(web::resource("/users/{ext_id}/wallets/{wallet_ext_id}/verify").route(web::post().to(verify)))
    .service(web::resource("/users/{ext_id}/wallets/{wallet_ext_id}/set-primary").route(web::post().to(set_primary)));
}

#[derive(Debug, Deserialize)]
struct AddWalletRequest {
    address: String,
    label: Option<String>,
}

async fn add_wallet(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<UserId>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let payload: AddWalletRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::new(CoreError::InvalidInput(e.to_string()), rid))?;
    let owner = path.into_inner();
    let address = Address::parse(&payload.address)
        .map_err(|e| ApiError::new(CoreError::Signature(e), rid))?;

    guard(&state.pool, &req, &body, rid, false, || async {
        state.storage.add_wallet(owner, address, payload.label.clone()).await
    })
    .await
}

async fn list_wallets(state: web::Data<AppState>, req: HttpRequest, path: web::Path<UserId>) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let wallets = state.storage.list_wallets_by_user(path.into_inner()).await.with_request_id(rid)?;
    Ok(HttpResponse::Ok().json(settle_common::envelope::DataEnvelope::new(wallets)))
}

async fn get_wallet(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(UserId, WalletId)>,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let (_, wallet_id) = path.into_inner();
    let wallet = state.storage.get_wallet(wallet_id).await.with_request_id(rid)?;
    Ok(HttpResponse::Ok().json(settle_common::envelope::DataEnvelope::new(wallet)))
}

async fn delete_wallet(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(UserId, WalletId)>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let (_, wallet_id) = path.into_inner();
    guard(&state.pool, &req, &body, rid, false, || async {
        state.storage.soft_delete_wallet(wallet_id, get_current_time_in_seconds()).await
    })
    .await
}

#[derive(Debug, Deserialize)]
struct SetLabelRequest {
    label: Option<String>,
}

async fn set_label(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(UserId, WalletId)>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let payload: SetLabelRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::new(CoreError::InvalidInput(e.to_string()), rid))?;
    let (_, wallet_id) = path.into_inner();
    guard(&state.pool, &req, &body, rid, false, || async {
        state.storage.set_label(wallet_id, payload.label.clone()).await
    })
    .await
}

async fn set_primary(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(UserId, WalletId)>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let (_, wallet_id) = path.into_inner();
    guard(&state.pool, &req, &body, rid, false, || async {
        state.storage.set_primary(wallet_id).await
    })
    .await
}

#[derive(Debug, Deserialize)]
struct VerifyMessage {
    nonce: String,
    timestamp: u64,
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    signature: String,
    message: VerifyMessage,
}

/// S1/S2 (§8): runs the Signature Verifier, advances the wallet-verification
/// state machine (idempotent on an already-`Verified` wallet), and — on the
/// first verified wallet for a user — promotes it to primary, which in turn
/// updates the owning account's `primary_wallet_id` pointer in one step
/// (`WalletProvider::set_primary`).
async fn verify(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(UserId, WalletId)>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let payload: VerifyRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::new(CoreError::InvalidInput(e.to_string()), rid))?;
    let (owner, wallet_id) = path.into_inner();

    guard(&state.pool, &req, &body, rid, false, || async {
        let state: &AppState = &state;
        let wallet = state.storage.get_wallet(wallet_id).await?;
        let current = if wallet.is_verified {
            WalletVerificationState::Verified
        } else {
            WalletVerificationState::Unverified
        };

        let already_verified = current == WalletVerificationState::Verified;
        let next = wallet_verification::transition(current, WalletVerificationEvent::Verify)?;
        debug_assert_eq!(next, WalletVerificationState::Verified);

        if already_verified {
            return state.storage.get_wallet(wallet_id).await;
        }

        let now = get_current_time_in_seconds();
        state
            .signature_verifier
            .verify(
                WalletVerificationRequest {
                    wallet: wallet.address,
                    nonce: &payload.message.nonce,
                    timestamp: payload.message.timestamp,
                    signature: &payload.signature,
                },
                now,
            )
            .await?;

        // §4.6: mark_verified, the already-primary check, and the primary
        // promotion all run under the same unit of work.
        state
            .uow
            .run(|_pool, mut tx| async move {
                mark_verified_tx(&mut tx, wallet_id).await?;

                let siblings = list_wallets_by_user_tx(&mut tx, owner).await?;
                let already_has_primary = siblings.iter().any(|w| w.is_primary && w.id != wallet_id);

                let updated = if already_has_primary {
                    get_wallet_tx(&mut tx, wallet_id).await?
                } else {
                    set_primary_tx(&mut tx, wallet_id).await?
                };
                Ok((tx, updated))
            })
            .await
    })
    .await
}
