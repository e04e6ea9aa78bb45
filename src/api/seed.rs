use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, SeedResponse};
use crate::fairness::{SALT, VERIFICATION_FORMULA};

/// Current chain head. Published before any round on the chain is played.
#[get("/seed")]
pub async fn get_seed(state: web::Data<AppState>) -> impl Responder {
    let engine = state.engine.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(SeedResponse {
        chain_head: engine.chain_head().to_string(),
        salt: SALT,
        verification_formula: VERIFICATION_FORMULA,
        chain_length: engine.chain_len(),
        generation: engine.chain_generation(),
    })
}
