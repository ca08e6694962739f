use axum::{extract::State, routing::get, Json, Router};
use axum_extra::extract::PrivateCookieJar;
use serde::Serialize;

use crate::{
    models::{
        draft::DraftForm,
        trip::{Coordinate, Trip},
    },
    planner::PinMode,
    session::current_session,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/state", get(planner_state))
}

#[derive(Debug, Serialize)]
pub struct PlannerSnapshot {
    pub pin_mode: PinMode,
    pub draft: DraftForm,
    pub pending_pins: Vec<Coordinate>,
    pub trips: Vec<Trip>,
}

async fn planner_state(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Json<PlannerSnapshot>) {
    let (jar, session) = current_session(&state, jar).await;
    let snapshot = state
        .sessions
        .read(&session, |planner| PlannerSnapshot {
            pin_mode: planner.mode(),
            draft: planner.draft().clone(),
            pending_pins: planner.pending_pins().to_vec(),
            trips: planner.trips().to_vec(),
        })
        .await;
    (jar, Json(snapshot))
}
