use actix_web::middleware::NormalizePath;
use actix_web::{App, HttpServer, Responder, get};

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod rules;
mod state;
mod store;
mod utils;

#[cfg(test)]
mod test_support;

use config::Config;
use state::AppState;

use crate::docs::ApiDoc;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

/// Registered emails loaded into the registry per batch.
const WARMUP_BATCH: usize = 250;

#[get("/")]
async fn index() -> impl Responder {
    "FOKSI Absensi"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let state = AppState::from_config(config.clone()).await?;
    state.bootstrap_admin().await?;

    let warmup_state = state.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = warmup_state
            .emails
            .warmup(warmup_state.store.get_ref(), WARMUP_BATCH)
            .await
        {
            warn!(error = %e, "Failed to warm up email registry");
        }
    });

    let server_addr = config.server_addr.clone();
    info!(addr = %server_addr, "Listening");

    HttpServer::new(move || {
        let state = state.clone();
        let config = config.clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .service(index)
            .configure(move |cfg| {
                state.register(cfg);
                // auth + protected routes with rate limiting
                routes::configure(cfg, config);
            })
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
