use crate::day_state;
use crate::errors::AppError;
use crate::lifecycle::{FinalizeOutcome, SweepReport, Tracker};
use crate::models::{
    DayPatch, DayRecord, DayResponse, DayState, Preview, StatsResponse, StreakStates,
};
use crate::score::ScoreSnapshot;
use crate::state::AppState;
use crate::storage::FileStore;
use crate::ui::render_index;
use axum::{
    extract::{Path, State},
    response::Html,
    Json,
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::warn;

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let now = local_now();
    let mut tracker = state.tracker.lock().await;
    let record = tracker.today(now).await?;
    let preview = tracker.preview_final_state(record.date).await?;
    let score = tracker.score(now).await?;
    let streaks = tracker.streaks().await?;
    Ok(Html(render_index(&record, &preview, &score, &streaks)))
}

pub async fn get_today(State(state): State<AppState>) -> Result<Json<DayResponse>, AppError> {
    let now = local_now();
    let mut tracker = state.tracker.lock().await;
    let record = tracker.today(now).await?;
    let preview = tracker.preview_final_state(record.date).await?;
    Ok(Json(to_response(record, Some(preview))))
}

pub async fn update_today(
    State(state): State<AppState>,
    Json(patch): Json<DayPatch>,
) -> Result<Json<DayResponse>, AppError> {
    let now = local_now();
    let mut tracker = state.tracker.lock().await;
    let today = tracker.today(now).await?.date;
    let record = tracker.update_day(today, patch, now).await?;
    let preview = tracker.preview_final_state(today).await?;
    Ok(Json(to_response(record, Some(preview))))
}

pub async fn finalize_today(
    State(state): State<AppState>,
) -> Result<Json<FinalizeOutcome>, AppError> {
    let now = local_now();
    let mut tracker = state.tracker.lock().await;
    let today = tracker.today(now).await?.date;
    finalize(&mut tracker, today, now).await
}

pub async fn finalize_day(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<FinalizeOutcome>, AppError> {
    let date = parse_date(&raw)?;
    let now = local_now();
    let mut tracker = state.tracker.lock().await;
    finalize(&mut tracker, date, now).await
}

pub async fn get_day(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<DayResponse>, AppError> {
    let date = parse_date(&raw)?;
    let now = local_now();
    let tracker = state.tracker.lock().await;
    let record = tracker.day(date).await?;
    let current = tracker.current_state(date, now).await?;
    Ok(Json(DayResponse {
        record,
        state: current,
        preview: None,
    }))
}

pub async fn preview_day(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Preview>, AppError> {
    let date = parse_date(&raw)?;
    let tracker = state.tracker.lock().await;
    Ok(Json(tracker.preview_final_state(date).await?))
}

pub async fn get_streaks(State(state): State<AppState>) -> Result<Json<StreakStates>, AppError> {
    let tracker = state.tracker.lock().await;
    Ok(Json(tracker.streaks().await?))
}

pub async fn get_score(State(state): State<AppState>) -> Result<Json<ScoreSnapshot>, AppError> {
    let tracker = state.tracker.lock().await;
    Ok(Json(tracker.score(local_now()).await?))
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    let tracker = state.tracker.lock().await;
    Ok(Json(tracker.history(local_now()).await?))
}

pub async fn rollover(State(state): State<AppState>) -> Result<Json<SweepReport>, AppError> {
    let mut tracker = state.tracker.lock().await;
    Ok(Json(tracker.run_rollover_sweep(local_now()).await?))
}

async fn finalize(
    tracker: &mut Tracker<FileStore>,
    date: NaiveDate,
    now: NaiveDateTime,
) -> Result<Json<FinalizeOutcome>, AppError> {
    match tracker.finalize(date, now).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(err) => {
            warn!(%date, "finalize rejected: {err}");
            Err(err.into())
        }
    }
}

fn to_response(record: DayRecord, preview: Option<Preview>) -> DayResponse {
    let state: DayState = day_state::current_state(&record, record.date);
    DayResponse {
        preview: if record.finalized { None } else { preview },
        record,
        state,
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(format!("date must be YYYY-MM-DD, got {raw:?}")))
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
