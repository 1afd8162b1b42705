//! `/timers` handlers.

use axum::{
    body::Bytes,
    extract::State,
    Json,
};
use serde_json::{json, Value};

use crate::api::{ApiError, Consolidation, Timer, TimerQuery};
use crate::http::request::{json_fields, ApiPath, ApiQuery};
use crate::http::server::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn list_all(State(state): State<AppState>, ApiQuery(query): ApiQuery<TimerQuery>) -> ApiResult<Vec<Timer>> {
    let timers = state.api.timers().filter(None, query.predicate()).await?;
    Ok(Json(timers))
}

pub async fn remove_all(State(state): State<AppState>) -> ApiResult<Value> {
    let removed = state.api.timers().remove_all().await?;
    Ok(Json(json!({ "removed": removed })))
}

pub async fn running_all(State(state): State<AppState>, ApiQuery(query): ApiQuery<TimerQuery>) -> ApiResult<Vec<Timer>> {
    let timers = state
        .api
        .timers()
        .filter(None, |t: &Timer| t.is_running() && query.matches(t))
        .await?;
    Ok(Json(timers))
}

pub async fn consolidate_all(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TimerQuery>,
) -> ApiResult<Consolidation> {
    let consolidation = state.api.timers().consolidate(None, query.predicate()).await?;
    Ok(Json(consolidation))
}

pub async fn list_group(
    State(state): State<AppState>,
    ApiPath(group): ApiPath<String>,
    ApiQuery(query): ApiQuery<TimerQuery>,
) -> ApiResult<Vec<Timer>> {
    let timers = state.api.timers().filter(Some(&group), query.predicate()).await?;
    Ok(Json(timers))
}

pub async fn remove_group(State(state): State<AppState>, ApiPath(group): ApiPath<String>) -> ApiResult<Value> {
    let removed = state.api.timers().remove_group(&group).await?;
    Ok(Json(json!({ "removed": removed })))
}

pub async fn running_group(
    State(state): State<AppState>,
    ApiPath(group): ApiPath<String>,
    ApiQuery(query): ApiQuery<TimerQuery>,
) -> ApiResult<Vec<Timer>> {
    let timers = state
        .api
        .timers()
        .filter(Some(&group), |t: &Timer| t.is_running() && query.matches(t))
        .await?;
    Ok(Json(timers))
}

pub async fn consolidate_group(
    State(state): State<AppState>,
    ApiPath(group): ApiPath<String>,
    ApiQuery(query): ApiQuery<TimerQuery>,
) -> ApiResult<Consolidation> {
    let consolidation = state.api.timers().consolidate(Some(&group), query.predicate()).await?;
    Ok(Json(consolidation))
}

pub async fn start(State(state): State<AppState>, ApiPath(group): ApiPath<String>, body: Bytes) -> ApiResult<Timer> {
    let fields = json_fields(&body)?;
    let timer = state.api.timers().start(&group, fields).await?;
    Ok(Json(timer))
}

pub async fn get(State(state): State<AppState>, ApiPath((group, id)): ApiPath<(String, String)>) -> ApiResult<Timer> {
    Ok(Json(state.api.timers().get(&group, &id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath((group, id)): ApiPath<(String, String)>,
    body: Bytes,
) -> ApiResult<Timer> {
    let fields = json_fields(&body)?;
    Ok(Json(state.api.timers().update(&group, &id, fields).await?))
}

pub async fn remove(State(state): State<AppState>, ApiPath((group, id)): ApiPath<(String, String)>) -> ApiResult<Value> {
    state.api.timers().remove(&group, &id).await?;
    Ok(Json(json!({ "removed": 1 })))
}

pub async fn stop(State(state): State<AppState>, ApiPath((group, id)): ApiPath<(String, String)>) -> ApiResult<Timer> {
    Ok(Json(state.api.timers().stop(&group, &id).await?))
}
