use actix_web::middleware::NormalizePath;
use actix_web::{App, HttpServer};
use std::io;
use std::sync::Arc;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod service;
mod state;
mod store;
mod utils;

use config::Config;
use db::init_db;
use routes::Limiters;
use state::AppState;
use store::{Store, mysql::MySqlStore};

use crate::docs::ApiDoc;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

fn startup_error(e: impl std::fmt::Display) -> io::Error {
    io::Error::other(e.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = Config::from_env().map_err(startup_error)?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url, config.database_max_connections)
        .await
        .map_err(startup_error)?;
    let store: Arc<dyn Store> = Arc::new(MySqlStore::new(pool));

    let limiters = Limiters::from_config(&config).map_err(startup_error)?;
    let server_addr = config.server_addr.clone();
    let api_prefix = config.api_prefix.clone();
    let state = AppState::new(config, store.clone());

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .configure(|cfg| state.register(cfg))
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, &api_prefix, &limiters))
    })
    .bind(&server_addr)?
    .run()
    .await?;

    info!("Server stopped, closing database pool");
    store.close().await;
    Ok(())
}
