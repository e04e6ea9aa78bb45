mod api;
mod config;
mod fairness;
mod history;
mod round;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::{info, warn};
use std::sync::Arc;

use api::AppState;
use config::Config;
use history::{HISTORY_CAPACITY, JsonLinesStore, Persister};
use round::RoundEngine;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = Config::from_env();

    let mut engine = RoundEngine::new(config.chain_length)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let persister = match &config.history_file {
        Some(path) => open_history(&JsonLinesStore::new(path), &mut engine),
        None => Persister::disabled(),
    };

    let host = config.host.clone();
    let port = config.port;
    println!("🚀 Starting crash round engine at http://{host}:{port}");
    info!("CHAIN - head {}", engine.chain_head());

    let state = web::Data::new(AppState::new(engine, persister));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

/// Load the newest rounds from `store` into `engine`, then mirror new
/// crashes into it. An unreadable file leaves the history empty.
fn open_history(store: &JsonLinesStore, engine: &mut RoundEngine) -> Persister {
    match store.load_recent(HISTORY_CAPACITY) {
        Ok(entries) => {
            info!(
                "HISTORY - restored {} rounds from {}",
                entries.len(),
                store.path().display()
            );
            engine.restore_history(entries);
        }
        Err(e) => warn!("HISTORY - could not read {}: {}", store.path().display(), e),
    }
    Persister::spawn(Arc::new(store.clone()))
}
