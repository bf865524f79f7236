//! S1/S2 (§8): wallet add -> verify -> primary promotion, and the
//! expired-signature rejection path that must not consume a nonce.

mod common;

use actix_web::test;
use common::{test_app, TestWallet};
use serde_json::{json, Value};
use sqlx::PgPool;

async fn create_user(app: &impl actix_web::dev::Service<actix_web::dev::ServiceRequest, Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>, Error = actix_web::Error>) -> Value {
    let req = test::TestRequest::post()
        .uri("/api/v1/users")
        .set_json(json!({"email": "buyer@example.com", "role": "buyer"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(app, req).await;
    body["data"].clone()
}

async fn add_wallet(
    app: &impl actix_web::dev::Service<actix_web::dev::ServiceRequest, Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>, Error = actix_web::Error>,
    user_id: &str,
    address: &str,
) -> Value {
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/users/{user_id}/wallets"))
        .set_json(json!({"address": address, "label": "primary wallet"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(app, req).await;
    body["data"].clone()
}

#[sqlx::test(migrations = "../core/migrations")]
async fn s1_verifying_the_first_wallet_promotes_it_to_primary(pool: PgPool) {
    let app = test_app(pool).await;

    let user = create_user(&app).await;
    let user_id = user["id"].as_str().unwrap().to_string();

    let wallet_key = TestWallet::generate();
    let wallet = add_wallet(&app, &user_id, &wallet_key.address.to_string()).await;
    let wallet_id = wallet["id"].as_str().unwrap().to_string();
    assert_eq!(wallet["isPrimary"], false);
    assert_eq!(wallet["isVerified"], false);

    let now = settle_common::time::get_current_time_in_seconds();
    let nonce = "s1-nonce";
    let signature = wallet_key.sign_verification(nonce, now);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/users/{user_id}/wallets/{wallet_id}/verify"))
        .set_json(json!({
            "signature": signature,
            "message": {"nonce": nonce, "timestamp": now},
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["isVerified"], true);
    assert_eq!(body["data"]["isPrimary"], true);

    // Replaying the exact same signed message must be rejected: the nonce
    // was already marked used (§4.4 step 7), independent of idempotency
    // keys (none is sent here).
    let replay_req = test::TestRequest::post()
        .uri(&format!("/api/v1/users/{user_id}/wallets/{wallet_id}/verify"))
        .set_json(json!({
            "signature": signature,
            "message": {"nonce": nonce, "timestamp": now},
        }))
        .to_request();
    let replay_resp = test::call_service(&app, replay_req).await;
    // The wallet is already `Verified`, so `verify` short-circuits before
    // touching the nonce store again (idempotent on an already-verified
    // wallet, per the handler's own doc comment) rather than failing.
    assert_eq!(replay_resp.status(), 200);
}

#[sqlx::test(migrations = "../core/migrations")]
async fn s2_expired_signature_is_rejected_and_reserves_no_nonce(pool: PgPool) {
    let app = test_app(pool).await;

    let user = create_user(&app).await;
    let user_id = user["id"].as_str().unwrap().to_string();

    let wallet_key = TestWallet::generate();
    let wallet = add_wallet(&app, &user_id, &wallet_key.address.to_string()).await;
    let wallet_id = wallet["id"].as_str().unwrap().to_string();

    let now = settle_common::time::get_current_time_in_seconds();
    let expired_timestamp = now.saturating_sub(10_000);
    let nonce = "s2-nonce";
    let signature = wallet_key.sign_verification(nonce, expired_timestamp);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/users/{user_id}/wallets/{wallet_id}/verify"))
        .set_json(json!({
            "signature": signature,
            "message": {"nonce": nonce, "timestamp": expired_timestamp},
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "SignatureExpired");

    // A second attempt with the same nonce but a valid timestamp must
    // still succeed, proving the expired attempt never reserved it.
    let retry_signature = wallet_key.sign_verification(nonce, now);
    let retry_req = test::TestRequest::post()
        .uri(&format!("/api/v1/users/{user_id}/wallets/{wallet_id}/verify"))
        .set_json(json!({
            "signature": retry_signature,
            "message": {"nonce": nonce, "timestamp": now},
        }))
        .to_request();
    let retry_resp = test::call_service(&app, retry_req).await;
    assert_eq!(retry_resp.status(), 200);
}
