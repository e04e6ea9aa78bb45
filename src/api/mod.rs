mod health;
mod history;
pub mod models;
mod round;
mod seed;
mod stats;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/game")
            .service(health::health_check)
            .service(seed::get_seed)
            .service(round::new_round)
            .service(round::start_round)
            .service(round::tick)
            .service(round::cash_out)
            .service(round::verify)
            .service(history::get_history)
            .service(stats::get_stats),
    );
}
