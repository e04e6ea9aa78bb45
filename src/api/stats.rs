use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, StatsResponse};
use crate::fairness::{GROWTH_RATE, HOUSE_EDGE_FACTOR};
use crate::history::HISTORY_CAPACITY;

#[get("/stats")]
pub async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    let engine_status = {
        let engine = state.engine.lock().expect("mutex poisoned");
        engine.status()
    };

    HttpResponse::Ok().json(StatsResponse {
        engine: engine_status,
        growth_rate: GROWTH_RATE,
        house_edge_factor: HOUSE_EDGE_FACTOR,
        history_capacity: HISTORY_CAPACITY,
        persistence_enabled: state.persister.is_enabled(),
    })
}
