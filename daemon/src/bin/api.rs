// settle-api: HTTP surface over settle-core (§5, §6).

use actix_web::{middleware::from_fn, web, App, HttpServer};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use settle_daemon::config::Config;
use settle_daemon::request_id::propagate;
use settle_daemon::{handlers, state::AppState};
use log::warn;
use sqlx::postgres::PgPoolOptions;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::parse();

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_open_conns)
        .min_connections(config.database.max_idle_conns)
        .acquire_timeout(std::time::Duration::from_secs(config.server.read_timeout_secs.max(1)))
        .connect(&config.database.connection_url())
        .await?;

    sqlx::migrate!("../core/migrations").run(&pool).await?;

    let bind_address = config.server.bind_address();
    if config.server.host == "0.0.0.0" {
        warn!("SECURITY WARNING: settle-api is bound to 0.0.0.0 (all interfaces)");
        warn!("This exposes ledger-mutating endpoints to the network without any transport auth!");
        warn!("Attackers reaching this port can:");
        warn!("  - authorize, capture, void, or refund payments");
        warn!("  - execute settlements");
        warn!("RECOMMENDED: bind to 127.0.0.1 and put an authenticating proxy in front");
        warn!("If remote access is required, restrict it with a firewall");
    }

    let (recorder, _) = PrometheusBuilder::new()
        .build()
        .map_err(|e| anyhow::anyhow!("failed to create prometheus recorder: {e}"))?;
    let prometheus_handle = recorder.handle();
    metrics::set_global_recorder(Box::new(recorder))
        .map_err(|e| anyhow::anyhow!("failed to install metrics recorder: {e}"))?;

    let state = web::Data::new(AppState::new(pool, config.clone()).await?);

    log::info!("settle-api listening on {bind_address}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::Data::new(prometheus_handle.clone()))
            .wrap(from_fn(propagate))
            .route(
                "/metrics",
                web::get().to(|handle: web::Data<metrics_exporter_prometheus::PrometheusHandle>| async move {
                    handle.render()
                }),
            )
            .configure(handlers::configure)
    })
    .bind(&bind_address)?
    .shutdown_timeout(30)
    .run()
    .await?;

    Ok(())
}
