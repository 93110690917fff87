use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use maze_core::SimpleLCG;

mod api;
mod config;

use api::AppState;
use config::ServerConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Maze API Server");

    let config = ServerConfig::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let bind_address = config.bind.clone();
    let json_limit = config.json_limit;
    tracing::info!(
        "Binding to {} (json limit {} bytes, viewport {}x{})",
        bind_address,
        json_limit,
        config.viewport.width,
        config.viewport.height
    );

    let state = web::Data::new(AppState::new(config, SimpleLCG::new(host::random_seed())));

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(json_limit))
            .configure(api::configure)
    })
    .bind(bind_address)?
    .run()
    .await
}
