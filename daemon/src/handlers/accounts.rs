//! Accounts (§6): GET /accounts/{id}/balance; GET /accounts/{id}/ledger.
//! Both are pure reads with no counterpart among the storage provider
//! traits (none of the aggregates own an account row directly), so they
//! query the `accounts`/`ledger_entries` tables directly, the same escape
//! hatch `AppState::internal_id` uses for the same reason.

use crate::error::ApiError;
use crate::request_id::request_id;
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use settle_common::error::CoreError;
use settle_common::ids::AccountId;
use sqlx::FromRow;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/accounts/{id}/balance").route(web::get().to(balance)))
        .service(web::resource("/accounts/{id}/ledger").route(web::get().to(ledger)));
}

#[derive(Serialize, FromRow)]
struct AccountBalance {
    #[sqlx(rename = "external_id")]
    account_id: uuid::Uuid,
    available_balance: Decimal,
    held_balance: Decimal,
    version: i64,
    status: String,
}

async fn balance(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<AccountId>,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let account_id = path.into_inner();

    let row = sqlx::query_as::<_, AccountBalance>(
        "SELECT external_id, available_balance, held_balance, version, status \
         FROM accounts WHERE external_id = $1",
    )
    .bind(account_id.0)
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| {
        log::error!("balance lookup for {account_id} failed: {e}");
        ApiError::new(CoreError::DbError, rid)
    })?
    .ok_or_else(|| ApiError::new(CoreError::NotFound(format!("account {account_id}")), rid))?;

    Ok(HttpResponse::Ok().json(settle_common::envelope::DataEnvelope::new(row)))
}

#[derive(Serialize, FromRow)]
struct LedgerEntryView {
    transaction_group_id: uuid::Uuid,
    side: String,
    amount: Decimal,
    balance_after: Decimal,
    reference_type: String,
    reference_id: i64,
    description: String,
    created_at: i64,
}

#[derive(Debug, Deserialize)]
struct LedgerQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

async fn ledger(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<AccountId>,
    query: web::Query<LedgerQuery>,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let account_id = path.into_inner();
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    let offset = query.offset.unwrap_or(0).max(0);

    let rows = sqlx::query_as::<_, LedgerEntryView>(
        "SELECT transaction_group_id, side, amount, balance_after, reference_type, \
                reference_id, description, created_at \
         FROM ledger_entries \
         WHERE account_id = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2 OFFSET $3",
    )
    .bind(account_id.0)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await
    .map_err(|e| {
        log::error!("ledger lookup for {account_id} failed: {e}");
        ApiError::new(CoreError::DbError, rid)
    })?;

    Ok(HttpResponse::Ok().json(settle_common::envelope::DataEnvelope::new(rows)))
}
