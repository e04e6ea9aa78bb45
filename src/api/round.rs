use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info, warn};

use super::models::{
    AppState, CashOutRequest, CashOutResponse, ErrorResponse, NewRoundResponse, StartRequest,
    StartResponse, TickResponse, VerifyQuery, VerifyResponse,
};
use crate::fairness::{SALT, VERIFICATION_FORMULA, is_well_formed, verify_link, verify_reveal};
use crate::round::{RoundError, Tick};

/// Open a betting round. Only the commitment is published.
#[get("/round/new")]
pub async fn new_round(state: web::Data<AppState>) -> impl Responder {
    let opened = {
        let mut engine = state.engine.lock().expect("mutex poisoned");
        engine.new_round()
    };

    match opened {
        Ok(round) => HttpResponse::Ok().json(NewRoundResponse {
            round_id: round.round_id,
            commitment: round.commitment,
            status: "betting",
        }),
        Err(e) => {
            warn!("GET /round/new - {e}");
            HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: e.to_string(),
            })
        }
    }
}

/// Start the pending round. The returned `startTime` is the only clock
/// clients should animate against.
#[post("/round/start")]
pub async fn start_round(
    state: web::Data<AppState>,
    body: Option<web::Json<StartRequest>>,
) -> impl Responder {
    let req = body.map(web::Json::into_inner).unwrap_or_default();

    let started = {
        let mut engine = state.engine.lock().expect("mutex poisoned");
        engine.start(req.round_id.as_deref())
    };

    match started {
        Ok(started) => HttpResponse::Ok().json(StartResponse {
            round_id: started.round_id,
            status: "flying",
            start_time: started.start_time,
        }),
        Err(e) => {
            debug!("POST /round/start - rejected: {e}");
            HttpResponse::BadRequest().json(ErrorResponse {
                error: e.to_string(),
            })
        }
    }
}

/// Poll for the crash. Safe to call redundantly.
#[post("/round/tick")]
pub async fn tick(state: web::Data<AppState>) -> impl Responder {
    let outcome = {
        let mut engine = state.engine.lock().expect("mutex poisoned");
        engine.tick()
    };

    let resp = match outcome {
        Tick::Idle => TickResponse {
            status: "idle",
            crashed: false,
            multiplier: None,
            crash_point: None,
            hash: None,
            commitment: None,
            round_id: None,
        },
        Tick::Flying { multiplier } => TickResponse {
            status: "flying",
            crashed: false,
            multiplier: Some(multiplier),
            crash_point: None,
            hash: None,
            commitment: None,
            round_id: None,
        },
        Tick::Crashed { entry, multiplier } => {
            // Lock released above; the store runs off the request path.
            state.persister.dispatch(entry.clone());
            TickResponse {
                status: "crashed",
                crashed: true,
                multiplier: Some(multiplier),
                crash_point: Some(entry.crash_point),
                hash: Some(entry.hash),
                commitment: Some(entry.commitment),
                round_id: Some(entry.id),
            }
        }
    };
    HttpResponse::Ok().json(resp)
}

/// Largest accepted bet. Keeps winnings finite at any crash point.
pub const MAX_BET_AMOUNT: f64 = 1e12;

/// Cash out the caller's bet at the current multiplier.
///
/// The bet amount is trusted as sent; there is no ledger behind it.
#[post("/round/cashout")]
pub async fn cash_out(
    state: web::Data<AppState>,
    body: Option<web::Json<CashOutRequest>>,
) -> impl Responder {
    let bet_amount = match parse_bet(body.map(web::Json::into_inner)) {
        Ok(bet) => bet,
        Err(msg) => {
            debug!("POST /round/cashout - bad body: {msg}");
            return HttpResponse::BadRequest().json(CashOutResponse::failed(msg));
        }
    };

    let result = {
        let mut engine = state.engine.lock().expect("mutex poisoned");
        engine.cash_out(bet_amount)
    };

    match result {
        Ok(cashed) => HttpResponse::Ok().json(CashOutResponse {
            success: true,
            multiplier: Some(cashed.multiplier),
            winnings: Some(cashed.winnings),
            message: None,
        }),
        Err(e) => {
            debug!("POST /round/cashout - rejected: {e}");
            HttpResponse::Ok().json(CashOutResponse::failed(cashout_message(&e)))
        }
    }
}

/// A missing or unparsable body counts as a bad bet.
fn parse_bet(body: Option<CashOutRequest>) -> Result<f64, &'static str> {
    match body.map(|req| req.bet_amount) {
        Some(bet) if bet.is_finite() && bet >= 0.0 => {
            if bet > MAX_BET_AMOUNT {
                Err("betAmount exceeds the maximum bet")
            } else {
                Ok(bet)
            }
        }
        _ => Err("betAmount must be a non-negative number"),
    }
}

fn cashout_message(err: &RoundError) -> String {
    match err {
        RoundError::NotFlying | RoundError::NoActiveRound => "Cannot cash out now".to_string(),
        other => other.to_string(),
    }
}

/// Recompute crash point and commitment for a revealed hash. With
/// `?previous=<hash>`, also check that the two are consecutive on the chain.
#[get("/round/verify/{hash}")]
pub async fn verify(
    path: web::Path<(String,)>,
    query: web::Query<VerifyQuery>,
) -> impl Responder {
    let hash = path.into_inner().0;
    if !is_well_formed(&hash) {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "hash must be 64 hex characters".to_string(),
        });
    }

    let links_to_previous = query
        .previous
        .as_deref()
        .map(|previous| verify_link(&hash, previous));
    let reveal = verify_reveal(&hash);
    info!(
        "VERIFY - {} -> {:.2}x",
        &reveal.hash[..16],
        reveal.crash_point
    );
    HttpResponse::Ok().json(VerifyResponse {
        hash: reveal.hash,
        crash_point: reveal.crash_point,
        commitment: reveal.commitment,
        links_to_previous,
        salt: SALT,
        how_to_verify: VERIFICATION_FORMULA,
    })
}
