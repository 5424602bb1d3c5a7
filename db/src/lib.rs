use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgSslMode},
};
use std::{str::FromStr, sync::Arc};

pub mod store;
pub mod subscription;
pub mod usage;
pub mod webhook_event;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

pub mod models {
    pub mod subscription;
}

pub mod dtos {
    pub mod subscription;
}

pub use store::{BillingStore, PgStore, UsageStore};

fn connect_options(url: &str, require_ssl: bool) -> Result<PgConnectOptions, sqlx::Error> {
    let options = PgConnectOptions::from_str(url)?;
    Ok(if require_ssl {
        options.ssl_mode(PgSslMode::Require)
    } else {
        options
    })
}

/// Splits `DATABASE_URL` into the billing database name and a URL for the
/// `postgres` maintenance database on the same server.
fn maintenance_target(database_url: &str) -> Result<(String, String), url::ParseError> {
    let url = url::Url::parse(database_url)?;
    let db_name = url.path().trim_start_matches('/').to_string();
    let maintenance_url = format!(
        "postgresql://{}:{}@{}:{}/postgres",
        url.username(),
        url.password().unwrap_or(""),
        url.host_str().unwrap_or("localhost"),
        url.port().unwrap_or(5432)
    );
    Ok((db_name, maintenance_url))
}

/// Opens the launchkit pool and brings the billing and usage tables up to
/// date. A missing database is created through the `postgres` maintenance
/// database first.
pub async fn setup(
    database_url: &str,
    require_ssl: bool,
) -> Result<Arc<PgPool>, Box<dyn std::error::Error>> {
    let (db_name, maintenance_url) = maintenance_target(database_url)?;

    let maintenance = PgPool::connect_with(connect_options(&maintenance_url, require_ssl)?).await?;
    let present: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(&db_name)
            .fetch_one(&maintenance)
            .await?;
    if !present {
        log::warn!("Database {} not found, creating it before migrating", db_name);
        sqlx::query(&format!("CREATE DATABASE \"{}\"", db_name))
            .execute(&maintenance)
            .await?;
    }
    maintenance.close().await;

    let pool = PgPool::connect_with(connect_options(database_url, require_ssl)?).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    log::info!("Billing schema is current on {}", db_name);

    Ok(Arc::new(pool))
}
