pub mod accounts;
pub mod health;
pub mod payments;
pub mod settlements;
pub mod users;
pub mod wallets;
pub mod withdrawals;

use actix_web::web;

/// Mounts every route under `/api/v1` (§6) plus the unversioned health
/// endpoints, mirroring the teacher's `App::new().service(...)` wiring in
/// `rpc/mod.rs` but organized as one `configure` closure per resource.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health::health)))
        .service(web::resource("/ready").route(web::get().to(health::ready)))
        .service(
            web::scope("/api/v1")
                .configure(users::configure)
                .configure(wallets::configure)
                .configure(payments::configure)
                .configure(settlements::configure)
                .configure(accounts::configure)
                .configure(withdrawals::configure),
        );
}
