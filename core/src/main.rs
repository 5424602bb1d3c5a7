mod cors;

use std::sync::Arc;

use actix_web::{
    App, HttpServer,
    web::{self},
};
use api_billing::{BillingProvider, ProviderClients};
use common::env_config::Config;
use db::{BillingStore, PgStore, UsageStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // get env vars
    let config = Config::from_env();
    let config_data = config.clone();

    let origin = config.cors_allowed_origin.clone();

    // init logger
    if config.console_logging_enabled {
        logger::setup().expect("Failed to set up logger");
    }

    for warning in config.validate() {
        log::warn!("Configuration: {}", warning);
    }

    // init db connection
    let pool = db::setup(&config.database_url, config.is_production())
        .await
        .expect("Failed to set up database");

    let store = PgStore::new(pool);
    let billing_store: Arc<dyn BillingStore> = Arc::new(store.clone());
    let usage_store: Arc<dyn UsageStore> = Arc::new(store);
    let provider: Arc<dyn BillingProvider> = Arc::new(ProviderClients::from_config(&config));

    log::info!(
        "Starting launchkit on {}:{} ({})",
        config.server_host,
        config.server_port,
        config.environment
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config_data.clone()))
            .app_data(web::Data::new(billing_store.clone()))
            .app_data(web::Data::new(usage_store.clone()))
            .app_data(web::Data::new(provider.clone()))
            .wrap(logger::middleware()) // 2nd
            .wrap(cors::middleware(&origin)) // 1st
            .service(
                web::scope("/api")
                    .service(api_billing::mount_webhooks())
                    .service(
                        web::scope("/dashboard")
                            .wrap(api_auth::auth_middleware(config_data.clone()))
                            .service(api_billing::mount_billing())
                            .service(api_tools::mount_tools())
                            .service(api_tools::mount_usage()),
                    ),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .workers(config.num_workers)
    .run()
    .await
}
