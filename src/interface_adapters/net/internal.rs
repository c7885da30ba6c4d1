use crate::interface_adapters::state::AppState;

use axum::{
    extract::{Json, State},
    response::IntoResponse,
};
use std::sync::Arc;

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    status: &'static str,
    // Number of currently registered subscribers.
    subscribers: usize,
    // Last completed simulation tick.
    tick: u64,
    session_id: String,
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (tick, session_id) = {
        let world = state.world.lock().await;
        (world.tick(), world.session_id().to_string())
    };
    let subscribers = state.registry.len().await;

    Json(HealthResponse {
        status: "ok",
        subscribers,
        tick,
        session_id,
    })
}
