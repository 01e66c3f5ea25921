use axum::extract::{Path, Query, State};
use axum::Json;

use super::{join_error, parse_date, require_actor, ActorParams};
use crate::error::AppError;
use crate::state::AppState;

#[derive(serde::Deserialize)]
pub struct RangeParams {
    pub actor: Option<String>,
    pub start: String,
    pub end: String,
}

/// GET /api/measurement/daily/:date — the four metrics for one day.
pub async fn daily(
    State(app): State<AppState>,
    Path(date): Path<String>,
    Query(params): Query<ActorParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = require_actor(params.actor)?;
    let date = parse_date(&date)?;
    let result = tokio::task::spawn_blocking(move || {
        let metrics = igams_core::metrics::calculate(
            app.store.as_ref(),
            &app.config.thresholds,
            &actor,
            date,
        )?;
        Ok::<_, igams_core::ControlError>(serde_json::json!({
            "actor_id": actor,
            "date": date,
            "metrics": metrics,
        }))
    })
    .await
    .map_err(join_error)??;

    Ok(Json(result))
}

/// GET /api/measurement/range?start=&end= — one entry per day, inclusive.
pub async fn range(
    State(app): State<AppState>,
    Query(params): Query<RangeParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = require_actor(params.actor)?;
    let start = parse_date(&params.start)?;
    let end = parse_date(&params.end)?;
    let result = tokio::task::spawn_blocking(move || {
        let series = igams_core::analysis::metrics_range(
            app.store.as_ref(),
            &app.config,
            &actor,
            start,
            end,
        )?;
        Ok::<_, igams_core::ControlError>(serde_json::to_value(series)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(result))
}

/// GET /api/measurement/issues/:date
pub async fn issues(
    State(app): State<AppState>,
    Path(date): Path<String>,
    Query(params): Query<ActorParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = require_actor(params.actor)?;
    let date = parse_date(&date)?;
    let result = tokio::task::spawn_blocking(move || {
        let issues = igams_core::issues::detect_for_day(
            app.store.as_ref(),
            &app.config.thresholds,
            &actor,
            date,
        )?;
        Ok::<_, igams_core::ControlError>(serde_json::json!({
            "date": date,
            "count": issues.len(),
            "issues": issues,
        }))
    })
    .await
    .map_err(join_error)??;

    Ok(Json(result))
}

/// GET /api/measurement/inspect/:date — computed on demand, never stored.
pub async fn inspect(
    State(app): State<AppState>,
    Path(date): Path<String>,
    Query(params): Query<ActorParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = require_actor(params.actor)?;
    let date = parse_date(&date)?;
    let result = tokio::task::spawn_blocking(move || {
        let inspection =
            igams_core::analysis::inspect_day(app.store.as_ref(), &app.config, &actor, date)?;
        Ok::<_, igams_core::ControlError>(serde_json::to_value(inspection)?)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(result))
}
