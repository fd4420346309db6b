use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::sync::StatusSnapshot;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub sync: StatusSnapshot,
    pub lag: u64,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let snapshot = state.status.snapshot();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        lag: snapshot.lag(),
        sync: StatusSnapshot::clone(&snapshot),
    })
}
