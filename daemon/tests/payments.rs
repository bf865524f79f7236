//! S3/S4 (§8): payment authorize -> capture with a fee split, exact
//! balance/ledger assertions; authorize -> void, then capture fails with
//! `InvalidStateTransition`.

mod common;

use actix_web::test;
use common::{account_snapshot, seed_account, seed_order, seed_user, test_app};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use sqlx::PgPool;

async fn authorize(
    app: &impl actix_web::dev::Service<actix_web::dev::ServiceRequest, Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>, Error = actix_web::Error>,
    order_id: &str,
    payer: &str,
    payee: &str,
    fee: &str,
    amount: Decimal,
    fee_amount: Decimal,
) -> Value {
    let req = test::TestRequest::post()
        .uri("/api/v1/payments/authorize")
        .set_json(json!({
            "order_id": order_id,
            "payer_account_id": payer,
            "payee_account_id": payee,
            "fee_account_id": fee,
            "amount": amount,
            "fee_amount": fee_amount,
            "expires_in_secs": 3600,
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(app, req).await;
    body["data"].clone()
}

#[sqlx::test(migrations = "../core/migrations")]
async fn s3_authorize_then_capture_splits_the_fee(pool: PgPool) {
    let payer = seed_account(&pool, "user", dec!(100), dec!(0)).await;
    let payee = seed_account(&pool, "user", dec!(0), dec!(0)).await;
    let fee = seed_account(&pool, "platform", dec!(0), dec!(0)).await;

    let buyer = seed_user(&pool).await;
    let order_id = seed_order(&pool, buyer, dec!(100)).await;

    let app = test_app(pool.clone()).await;

    let payment = authorize(
        &app,
        &order_id.to_string(),
        &payer.to_string(),
        &payee.to_string(),
        &fee.to_string(),
        dec!(100),
        dec!(3),
    )
    .await;
    assert_eq!(payment["status"], "authorized");

    let (payer_available, payer_held, _) = account_snapshot(&pool, payer).await;
    assert_eq!(payer_available, dec!(0));
    assert_eq!(payer_held, dec!(100));

    let payment_id = payment["id"].as_str().unwrap().to_string();
    let capture_req = test::TestRequest::post()
        .uri("/api/v1/payments/capture")
        .set_json(json!({"payment_id": payment_id}))
        .to_request();
    let capture_resp = test::call_service(&app, capture_req).await;
    assert_eq!(capture_resp.status(), 200);
    let captured: Value = test::read_body_json(capture_resp).await;
    assert_eq!(captured["data"]["status"], "captured");

    let (payer_available, payer_held, _) = account_snapshot(&pool, payer).await;
    assert_eq!(payer_available, dec!(0));
    assert_eq!(payer_held, dec!(0));

    let (payee_available, _, _) = account_snapshot(&pool, payee).await;
    assert_eq!(payee_available, dec!(97));

    let (fee_available, _, _) = account_snapshot(&pool, fee).await;
    assert_eq!(fee_available, dec!(3));
}

#[sqlx::test(migrations = "../core/migrations")]
async fn s4_voided_payment_cannot_later_be_captured(pool: PgPool) {
    let payer = seed_account(&pool, "user", dec!(50), dec!(0)).await;
    let payee = seed_account(&pool, "user", dec!(0), dec!(0)).await;
    let fee = seed_account(&pool, "platform", dec!(0), dec!(0)).await;

    let buyer = seed_user(&pool).await;
    let order_id = seed_order(&pool, buyer, dec!(50)).await;

    let app = test_app(pool.clone()).await;

    let payment = authorize(
        &app,
        &order_id.to_string(),
        &payer.to_string(),
        &payee.to_string(),
        &fee.to_string(),
        dec!(50),
        dec!(0),
    )
    .await;
    let payment_id = payment["id"].as_str().unwrap().to_string();

    let void_req = test::TestRequest::post()
        .uri("/api/v1/payments/void")
        .set_json(json!({"payment_id": payment_id}))
        .to_request();
    let void_resp = test::call_service(&app, void_req).await;
    assert_eq!(void_resp.status(), 200);

    let (payer_available, payer_held, _) = account_snapshot(&pool, payer).await;
    assert_eq!(payer_available, dec!(50));
    assert_eq!(payer_held, dec!(0));

    let capture_req = test::TestRequest::post()
        .uri("/api/v1/payments/capture")
        .set_json(json!({"payment_id": payment_id}))
        .to_request();
    let capture_resp = test::call_service(&app, capture_req).await;
    assert_eq!(capture_resp.status(), 422);
    let body: Value = test::read_body_json(capture_resp).await;
    assert_eq!(body["error"]["code"], "InvalidStateTransition");
}
