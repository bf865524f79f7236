//! Users (§6): POST /users; GET /users/{extId}; GET /users (filtered,
//! paginated); PUT /users/{extId}; PUT /users/{extId}/role; POST
//! /users/{extId}/suspend|activate; DELETE /users/{extId}; POST
//! /users/{extId}/kyc/request|approve|reject.

use crate::error::{ApiError, WithRequestId};
use crate::idempotency_guard::guard;
use crate::request_id::request_id;
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use settle_common::domain::user::{KycStatus, UserRole, UserStatus};
use settle_common::ids::UserId;
use settle_common::time::get_current_time_in_seconds;
use settle_core::storage::{UserFilter, UserProvider};
use validator::Validate;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/users")
            .route(web::post().to(create_user))
            .route(web::get().to(list_users)),
    )
    .service(web::resource("/users/{ext_id}").route(web::get().to(get_user)).route(web::put().to(update_email)).route(web::delete().to(delete_user)))
    .service(web::resource("/users/{ext_id}/role").route(web::put().to(set_role)))
    .service(web::resource("/users/{ext_id}/suspend").route(web::post().to(suspend)))
    .service(web::resource("/users/{ext_id}/activate").route(web::post().to(activate)))
    .service(web::resource("/users/{ext_id}/kyc/request").route(web::post().to(kyc_request)))
    .service(web::resource("/users/{ext_id}/kyc/approve").route(web::post().to(kyc_approve)))
    .service(web::resource("/users/{ext_id}/kyc/reject").route(web::post().to(kyc_reject)));
}

#[derive(Debug, Deserialize, Validate)]
struct CreateUserRequest {
    #[validate(email)]
    email: String,
    role: UserRole,
}

async fn create_user(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let payload: CreateUserRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::new(settle_common::error::CoreError::InvalidInput(e.to_string()), rid))?;
    payload
        .validate()
        .map_err(|e| ApiError::new(settle_common::error::CoreError::InvalidInput(e.to_string()), rid))?;

    guard(&state.pool, &req, &body, rid, false, || async {
        state.storage.create_user(&payload.email, payload.role).await
    })
    .await
}

async fn get_user(state: web::Data<AppState>, req: HttpRequest, path: web::Path<UserId>) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let user = state.storage.get_user(path.into_inner()).await.with_request_id(rid)?;
    Ok(HttpResponse::Ok().json(settle_common::envelope::DataEnvelope::new(user)))
}

#[derive(Debug, Deserialize)]
struct ListUsersQuery {
    role: Option<UserRole>,
    kyc_status: Option<KycStatus>,
    limit: Option<i64>,
    offset: Option<i64>,
}

async fn list_users(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListUsersQuery>,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let filter = UserFilter {
        role: query.role,
        kyc_status: query.kyc_status,
        limit: query.limit.unwrap_or(50).clamp(1, 200),
        offset: query.offset.unwrap_or(0).max(0),
    };
    let users = state.storage.list_users(filter).await.with_request_id(rid)?;
    Ok(HttpResponse::Ok().json(settle_common::envelope::DataEnvelope::new(users)))
}

#[derive(Debug, Deserialize, Validate)]
struct UpdateEmailRequest {
    #[validate(email)]
    email: String,
}

async fn update_email(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<UserId>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let payload: UpdateEmailRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::new(settle_common::error::CoreError::InvalidInput(e.to_string()), rid))?;
    payload
        .validate()
        .map_err(|e| ApiError::new(settle_common::error::CoreError::InvalidInput(e.to_string()), rid))?;
    let id = path.into_inner();

    guard(&state.pool, &req, &body, rid, false, || async {
        state.storage.update_email(id, &payload.email).await
    })
    .await
}

#[derive(Debug, Deserialize)]
struct SetRoleRequest {
    role: UserRole,
}

async fn set_role(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<UserId>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let payload: SetRoleRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::new(settle_common::error::CoreError::InvalidInput(e.to_string()), rid))?;
    let id = path.into_inner();

    guard(&state.pool, &req, &body, rid, false, || async {
        state.storage.set_user_role(id, payload.role).await
    })
    .await
}

async fn suspend(state: web::Data<AppState>, req: HttpRequest, path: web::Path<UserId>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let id = path.into_inner();
    guard(&state.pool, &req, &body, rid, false, || async {
        state.storage.set_user_status(id, UserStatus::Suspended).await
    })
    .await
}

async fn activate(state: web::Data<AppState>, req: HttpRequest, path: web::Path<UserId>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let id = path.into_inner();
    guard(&state.pool, &req, &body, rid, false, || async {
        state.storage.set_user_status(id, UserStatus::Active).await
    })
    .await
}

async fn delete_user(state: web::Data<AppState>, req: HttpRequest, path: web::Path<UserId>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let id = path.into_inner();
    guard(&state.pool, &req, &body, rid, false, || async {
        state.storage.set_user_status(id, UserStatus::Deleted).await
    })
    .await
}

async fn kyc_request(state: web::Data<AppState>, req: HttpRequest, path: web::Path<UserId>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    set_kyc(state, req, path, body, KycStatus::Pending).await
}

async fn kyc_approve(state: web::Data<AppState>, req: HttpRequest, path: web::Path<UserId>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    set_kyc(state, req, path, body, KycStatus::Verified).await
}

async fn kyc_reject(state: web::Data<AppState>, req: HttpRequest, path: web::Path<UserId>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    set_kyc(state, req, path, body, KycStatus::Rejected).await
}

async fn set_kyc(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<UserId>,
    body: web::Bytes,
    status: KycStatus,
) -> Result<HttpResponse, ApiError> {
    let rid = request_id(&req);
    let id = path.into_inner();
    guard(&state.pool, &req, &body, rid, false, || async {
        state.storage.set_kyc_status(id, status, get_current_time_in_seconds()).await
    })
    .await
}
