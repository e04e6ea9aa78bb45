use crate::history::Persister;
use crate::round::RoundEngine;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Shared application state: the one round engine and the history mirror.
pub struct AppState {
    pub engine: Mutex<RoundEngine>,
    pub persister: Persister,
}

impl AppState {
    pub fn new(engine: RoundEngine, persister: Persister) -> Self {
        Self {
            engine: Mutex::new(engine),
            persister,
        }
    }
}

/* ---------- Fairness API Models ---------- */

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedResponse {
    pub chain_head: String,
    pub salt: &'static str,
    pub verification_formula: &'static str,
    pub chain_length: usize,
    pub generation: u64,
}

#[derive(Deserialize)]
pub struct VerifyQuery {
    /// Hash revealed by the round before this one, to check the chain link.
    pub previous: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub hash: String,
    pub crash_point: f64,
    pub commitment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links_to_previous: Option<bool>,
    pub salt: &'static str,
    pub how_to_verify: &'static str,
}

/* ---------- Round API Models ---------- */

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoundResponse {
    pub round_id: String,
    pub commitment: String,
    pub status: &'static str,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    #[serde(default)]
    pub round_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub round_id: String,
    pub status: &'static str,
    pub start_time: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickResponse {
    pub status: &'static str,
    pub crashed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crash_point: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commitment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashOutRequest {
    pub bet_amount: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashOutResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winnings: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CashOutResponse {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            multiplier: None,
            winnings: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/* ---------- Stats API Models ---------- */

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(flatten)]
    pub engine: crate::round::EngineStatus,
    pub growth_rate: f64,
    pub house_edge_factor: f64,
    pub history_capacity: usize,
    pub persistence_enabled: bool,
}
