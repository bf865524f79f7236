//! Withdrawal lifecycle (§4.6): request holds funds, the happy path
//! carries the hold through to a `Capture` on complete, and reject
//! releases it back to available.

mod common;

use actix_web::test;
use common::{account_snapshot, seed_account, test_app};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use sqlx::PgPool;

#[sqlx::test(migrations = "../core/migrations")]
async fn request_approve_submit_confirm_complete_captures_the_hold(pool: PgPool) {
    let account = seed_account(&pool, "user", dec!(100), dec!(0)).await;
    let app = test_app(pool.clone()).await;

    let request_req = test::TestRequest::post()
        .uri("/api/v1/withdrawals/request")
        .set_json(json!({
            "account_id": account.to_string(),
            "amount": dec!(40),
            "destination_address": "0x000000000000000000000000000000000000be",
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, request_req).await;
    let withdrawal = body["data"].clone();
    assert_eq!(withdrawal["status"], "pending");
    let withdrawal_id = withdrawal["id"].as_str().unwrap().to_string();

    let (available, held, _) = account_snapshot(&pool, account).await;
    assert_eq!(available, dec!(60));
    assert_eq!(held, dec!(40));

    for (path, expected_status) in [
        ("/api/v1/withdrawals/approve", "approved"),
        ("/api/v1/withdrawals/submit", "submitted"),
    ] {
        let req = test::TestRequest::post()
            .uri(path)
            .set_json(json!({"withdrawal_id": withdrawal_id}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["status"], expected_status);
    }

    let confirm_req = test::TestRequest::post()
        .uri("/api/v1/withdrawals/confirm")
        .set_json(json!({"withdrawal_id": withdrawal_id, "chain_tx_hash": "0xabc123"}))
        .to_request();
    let confirm_resp = test::call_service(&app, confirm_req).await;
    assert_eq!(confirm_resp.status(), 200);
    let confirmed: Value = test::read_body_json(confirm_resp).await;
    assert_eq!(confirmed["data"]["status"], "confirmed");
    assert_eq!(confirmed["data"]["chainTxHash"], "0xabc123");

    // The hold is still open at this point: `Capture` on complete is what
    // finally removes it from `held_balance` (§4.6).
    let (available, held, _) = account_snapshot(&pool, account).await;
    assert_eq!(available, dec!(60));
    assert_eq!(held, dec!(40));

    let complete_req = test::TestRequest::post()
        .uri("/api/v1/withdrawals/complete")
        .set_json(json!({"withdrawal_id": withdrawal_id}))
        .to_request();
    let complete_resp = test::call_service(&app, complete_req).await;
    assert_eq!(complete_resp.status(), 200);
    let completed: Value = test::read_body_json(complete_resp).await;
    assert_eq!(completed["data"]["status"], "completed");

    let (available, held, _) = account_snapshot(&pool, account).await;
    assert_eq!(available, dec!(60));
    assert_eq!(held, dec!(0));
}

#[sqlx::test(migrations = "../core/migrations")]
async fn rejecting_a_pending_withdrawal_releases_the_hold(pool: PgPool) {
    let account = seed_account(&pool, "user", dec!(100), dec!(0)).await;
    let app = test_app(pool.clone()).await;

    let request_req = test::TestRequest::post()
        .uri("/api/v1/withdrawals/request")
        .set_json(json!({
            "account_id": account.to_string(),
            "amount": dec!(25),
            "destination_address": "0x000000000000000000000000000000000000be",
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, request_req).await;
    let withdrawal_id = body["data"]["id"].as_str().unwrap().to_string();

    let (available, held, _) = account_snapshot(&pool, account).await;
    assert_eq!(available, dec!(75));
    assert_eq!(held, dec!(25));

    let reject_req = test::TestRequest::post()
        .uri("/api/v1/withdrawals/reject")
        .set_json(json!({"withdrawal_id": withdrawal_id}))
        .to_request();
    let reject_resp = test::call_service(&app, reject_req).await;
    assert_eq!(reject_resp.status(), 200);
    let rejected: Value = test::read_body_json(reject_resp).await;
    assert_eq!(rejected["data"]["status"], "rejected");

    let (available, held, _) = account_snapshot(&pool, account).await;
    assert_eq!(available, dec!(100));
    assert_eq!(held, dec!(0));

    // Rejected is terminal: a later completion attempt must fail.
    let complete_req = test::TestRequest::post()
        .uri("/api/v1/withdrawals/complete")
        .set_json(json!({"withdrawal_id": withdrawal_id}))
        .to_request();
    let complete_resp = test::call_service(&app, complete_req).await;
    assert_eq!(complete_resp.status(), 422);
}
