use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/today", get(handlers::get_today).put(handlers::update_today))
        .route("/api/today/finalize", post(handlers::finalize_today))
        .route("/api/days/:date", get(handlers::get_day))
        .route("/api/days/:date/preview", get(handlers::preview_day))
        .route("/api/days/:date/finalize", post(handlers::finalize_day))
        .route("/api/streaks", get(handlers::get_streaks))
        .route("/api/score", get(handlers::get_score))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/rollover", post(handlers::rollover))
        .with_state(state)
}
