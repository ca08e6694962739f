pub mod api;
pub mod planner;

use axum::Router;
use tower_http::services::ServeDir;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();
    Router::new()
        .merge(planner::router())
        .nest("/api", api::router())
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}
