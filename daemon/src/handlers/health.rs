//! Health/readiness (§6): `/health` always 200 while the process is up;
//! `/ready` pings Postgres and Redis with a 3s budget each and only
//! returns 200 if both answer in time.

use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Serialize;
use std::time::Duration;

const READY_TIMEOUT: Duration = Duration::from_secs(3);

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "up" }))
}

#[derive(Serialize)]
struct DependencyStatus {
    database: &'static str,
    key_value_store: &'static str,
}

pub async fn ready(state: web::Data<AppState>) -> HttpResponse {
    let db_ok = tokio::time::timeout(READY_TIMEOUT, sqlx::query("SELECT 1").execute(&state.pool))
        .await
        .map(|r| r.is_ok())
        .unwrap_or(false);

    let kv_ok = tokio::time::timeout(READY_TIMEOUT, state.kv.get("readiness-probe"))
        .await
        .map(|r| r.is_ok())
        .unwrap_or(false);

    let status = DependencyStatus {
        database: if db_ok { "ok" } else { "unreachable" },
        key_value_store: if kv_ok { "ok" } else { "unreachable" },
    };

    if db_ok && kv_ok {
        HttpResponse::Ok().json(status)
    } else {
        HttpResponse::ServiceUnavailable().json(status)
    }
}
