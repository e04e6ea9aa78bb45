use actix_web::{HttpResponse, Responder, get, web};

use super::models::AppState;

/// Most recent crashed rounds, newest first.
#[get("/history")]
pub async fn get_history(state: web::Data<AppState>) -> impl Responder {
    let entries = {
        let engine = state.engine.lock().expect("mutex poisoned");
        engine.history().list()
    };
    HttpResponse::Ok().json(entries)
}
