mod config;
mod error;
mod handlers;
mod models;
mod services;
mod session;
mod utils;

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use actix_web::{web, App, HttpServer};
use log::info;

use crate::config::AppConfig;
use crate::models::AppState;
use crate::services::gemini::GeminiDrawService;
use crate::session::Session;

// Function to initialize logging
fn init_logging(log_file: Option<&String>) -> io::Result<()> {
    if let Some(file) = log_file {
        let log_output = OpenOptions::new().create(true).append(true).open(file)?;

        env_logger::Builder::from_default_env()
            .target(env_logger::Target::Pipe(Box::new(log_output)))
            .init();
    } else {
        env_logger::init();
    }
    Ok(())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let matches = config::command().get_matches();
    let app_config = AppConfig::from_matches(&matches);

    init_logging(app_config.log_file.as_ref())?;

    info!(
        "Draw machine: {} at {} (timeout {:?})",
        app_config.gemini.model, app_config.gemini.endpoint, app_config.gemini.timeout
    );
    info!(
        "Reveal pacing: roll {:?}, pause {:?}, tick {:?}",
        app_config.timing.roll, app_config.timing.pause, app_config.timing.tick
    );

    let listen_host = app_config.listen_host.clone();
    let state = AppState {
        draw_service: Box::new(GeminiDrawService::new(app_config.gemini.clone())),
        session: Mutex::new(Session::default()),
        config: app_config,
    };
    let shared_state = web::Data::new(state);

    info!("Listening on {}", listen_host);
    HttpServer::new(move || {
        App::new()
            .app_data(shared_state.clone())
            .configure(handlers::stage::configure)
            .configure(handlers::api::configure)
            .service(handlers::config::get_config)
            .service(handlers::config::put_config)
    })
    .bind(&listen_host)?
    .run()
    .await
}
