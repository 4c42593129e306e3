use std::{sync::Arc, time::Duration};

use accrual_client::AccrualApi;
use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, App, HttpServer};
use log::*;
use loyalty_engine::SqliteDatabase;

use crate::{config::ServerConfig, errors::ServerError, reconciliation::Reconciler, routes::health};

/// Opens the database, starts the reconciliation engine and serves the health endpoint until the process receives a
/// termination signal. The reconciler is shut down gracefully before returning.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_db_connections).await?;
    db.run_migrations().await?;
    let client = AccrualApi::new(config.accrual.clone())?;
    let srv = create_server_instance(&config)?;
    info!("🚀️ Listening on {}. Accrual service at {}", config.run_address, config.accrual.base_url);
    let reconciler = Reconciler::start(Arc::new(db.clone()), Arc::new(client), &config.reconciler);
    let result = srv.await;
    reconciler.shutdown().await;
    db.close().await;
    result.map_err(|e| ServerError::InitializeError(e.to_string()))
}

pub fn create_server_instance(config: &ServerConfig) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        App::new().wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("loyalty::access_log")).service(health)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind(config.run_address.as_str())?
    .run();
    Ok(srv)
}
